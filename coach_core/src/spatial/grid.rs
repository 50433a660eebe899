//! Heat grid: a spatial histogram of event counts over a uniform grid.

use match_data::{MapBounds, MapPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column/row address of a grid cell. Column 0, row 0 holds the map's
/// minimum corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId {
    pub col: u32,
    pub row: u32,
}

impl CellId {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cell({},{})", self.col, self.row)
    }
}

/// Sparse cell -> count mapping. Cells with zero count are never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatGrid {
    cell_size: u32,
    bounds: MapBounds,
    counts: BTreeMap<CellId, u64>,
}

impl HeatGrid {
    /// Create an empty grid. `cell_size` must be non-zero.
    pub fn new(cell_size: u32, bounds: MapBounds) -> Self {
        Self {
            cell_size: cell_size.max(1),
            bounds,
            counts: BTreeMap::new(),
        }
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn bounds(&self) -> &MapBounds {
        &self.bounds
    }

    /// Number of columns needed to cover the bounds (edges included).
    pub fn columns(&self) -> u32 {
        (self.bounds.width() / self.cell_size as i64 + 1) as u32
    }

    pub fn rows(&self) -> u32 {
        (self.bounds.height() / self.cell_size as i64 + 1) as u32
    }

    /// Cell containing a point, or `None` when the point is out of bounds.
    pub fn cell_of(&self, point: MapPoint) -> Option<CellId> {
        if !self.bounds.contains(point) {
            return None;
        }
        let col = (point.x as i64 - self.bounds.min_x as i64) / self.cell_size as i64;
        let row = (point.y as i64 - self.bounds.min_y as i64) / self.cell_size as i64;
        Some(CellId::new(col as u32, row as u32))
    }

    /// Centre of a cell in map coordinates, clamped to the bounds.
    pub fn cell_center(&self, cell: CellId) -> MapPoint {
        let half = self.cell_size as i64 / 2;
        let x = self.bounds.min_x as i64 + cell.col as i64 * self.cell_size as i64 + half;
        let y = self.bounds.min_y as i64 + cell.row as i64 * self.cell_size as i64 + half;
        MapPoint::new(
            x.min(self.bounds.max_x as i64) as i32,
            y.min(self.bounds.max_y as i64) as i32,
        )
    }

    /// Count one event at `point`. Returns `false` if the point was out of bounds.
    pub fn record(&mut self, point: MapPoint) -> bool {
        match self.cell_of(point) {
            Some(cell) => {
                *self.counts.entry(cell).or_insert(0) += 1;
                true
            }
            None => false,
        }
    }

    pub fn count(&self, cell: CellId) -> u64 {
        self.counts.get(&cell).copied().unwrap_or(0)
    }

    /// Sum of all cell counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of non-empty cells.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Non-empty cells in (col, row) order.
    pub fn iter(&self) -> impl Iterator<Item = (CellId, u64)> + '_ {
        self.counts.iter().map(|(cell, count)| (*cell, *count))
    }

    /// The `n` busiest cells, most events first, ties by cell id.
    pub fn hottest(&self, n: usize) -> Vec<(CellId, u64)> {
        let mut cells: Vec<_> = self.iter().collect();
        cells.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        cells.truncate(n);
        cells
    }

    /// Dense `rows x columns` matrix, row 0 first.
    pub fn dense(&self) -> Vec<Vec<u64>> {
        let mut matrix = vec![vec![0u64; self.columns() as usize]; self.rows() as usize];
        for (cell, count) in self.iter() {
            matrix[cell.row as usize][cell.col as usize] = count;
        }
        matrix
    }

    /// Add another grid's counts into this one. Order of merging never
    /// changes the result.
    pub fn merge(&mut self, other: &HeatGrid) {
        debug_assert_eq!(self.cell_size, other.cell_size, "merging grids of different cell sizes");
        for (cell, count) in other.iter() {
            *self.counts.entry(cell).or_insert(0) += count;
        }
    }
}
