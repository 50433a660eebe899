//! Artifact Renderer - turns aggregates and benchmark results into drawable
//! specifications.
//!
//! Map space has `y` growing upwards; pixel space has `y` growing downwards
//! from the top-left corner of a fixed-size background image. Everything
//! here is a pure function of its inputs; rasterisation belongs to the
//! presentation layer.

mod chart;

pub use chart::*;

use match_data::{EventKind, GamePhase, MapBounds, MapPoint, MatchId, MatchRecord};
use serde::{Deserialize, Serialize};

use crate::error::RenderSpecError;
use crate::spatial::{CellId, HeatGrid, PathTrace, TracePoint};

/// Canvas configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Background image width in pixels.
    pub width: u32,
    /// Background image height in pixels.
    pub height: u32,
    /// Delta series in charts are clamped to `[-delta_range, delta_range]`.
    pub delta_range: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            delta_range: 3.0,
        }
    }
}

/// A position on the canvas, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatCell {
    pub cell: CellId,
    pub rect: PixelRect,
    pub count: u64,
    /// `count / max_count`, in `(0, 1]`.
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatOverlay {
    pub width: u32,
    pub height: u32,
    pub max_count: u64,
    pub cells: Vec<HeatCell>,
}

/// A run of a path segment within one game phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPolyline {
    pub segment: usize,
    pub phase: GamePhase,
    pub points: Vec<PixelPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathOverlay {
    pub match_id: MatchId,
    pub polylines: Vec<PathPolyline>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    Plus,
    Cross,
    Diamond,
    Dot,
}

impl MarkerShape {
    /// Takedowns as plus signs, deaths as crosses.
    pub fn for_kind(kind: EventKind) -> Self {
        match kind {
            EventKind::Kill | EventKind::Assist => MarkerShape::Plus,
            EventKind::Death => MarkerShape::Cross,
            EventKind::WardPlaced => MarkerShape::Diamond,
            EventKind::Ping | EventKind::PositionSample => MarkerShape::Dot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMarker {
    pub match_id: MatchId,
    pub kind: EventKind,
    pub timestamp_ms: u64,
    pub at: PixelPoint,
    pub shape: MarkerShape,
}

/// Markers for a combat map. Events outside the map are left out and counted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkerLayer {
    pub markers: Vec<EventMarker>,
    pub out_of_bounds: u64,
}

/// Builds render specifications for a fixed canvas over the map bounds.
#[derive(Debug, Clone)]
pub struct ArtifactRenderer {
    config: RenderConfig,
    bounds: MapBounds,
}

impl ArtifactRenderer {
    /// Create a renderer, rejecting an empty canvas or degenerate bounds.
    pub fn new(config: RenderConfig, bounds: MapBounds) -> Result<Self, RenderSpecError> {
        if config.width == 0 || config.height == 0 || bounds.is_degenerate() {
            return Err(RenderSpecError::EmptyCanvas);
        }
        Ok(Self { config, bounds })
    }

    /// A 1024x1024 canvas over the full map.
    pub fn with_defaults() -> Self {
        Self {
            config: RenderConfig::default(),
            bounds: MapBounds::default(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn bounds(&self) -> &MapBounds {
        &self.bounds
    }

    /// Map a point onto the canvas, flipping the y axis.
    pub fn to_pixel(&self, point: MapPoint) -> Result<PixelPoint, RenderSpecError> {
        if !self.bounds.contains(point) {
            return Err(RenderSpecError::OutOfBounds {
                x: point.x,
                y: point.y,
            });
        }
        let u = (point.x as i64 - self.bounds.min_x as i64) as f64 / self.bounds.width() as f64;
        let v = (self.bounds.max_y as i64 - point.y as i64) as f64 / self.bounds.height() as f64;
        Ok(PixelPoint {
            x: u * self.config.width as f64,
            y: v * self.config.height as f64,
        })
    }

    /// One rectangle per non-empty cell, intensity relative to the hottest.
    pub fn heat_overlay(&self, grid: &HeatGrid) -> Result<HeatOverlay, RenderSpecError> {
        let max_count = grid.max_count();
        let cell_size = grid.cell_size() as i64;
        let grid_bounds = grid.bounds();

        let cells = grid
            .iter()
            .map(|(cell, count)| {
                let (x0, x1) = cell_span(grid_bounds.min_x, grid_bounds.max_x, cell.col, cell_size);
                let (y0, y1) = cell_span(grid_bounds.min_y, grid_bounds.max_y, cell.row, cell_size);

                let top_left = self.to_pixel(MapPoint::new(x0 as i32, y1 as i32))?;
                let bottom_right = self.to_pixel(MapPoint::new(x1 as i32, y0 as i32))?;
                Ok(HeatCell {
                    cell,
                    rect: PixelRect {
                        x: top_left.x,
                        y: top_left.y,
                        width: bottom_right.x - top_left.x,
                        height: bottom_right.y - top_left.y,
                    },
                    count,
                    intensity: count as f64 / max_count as f64,
                })
            })
            .collect::<Result<Vec<_>, RenderSpecError>>()?;

        Ok(HeatOverlay {
            width: self.config.width,
            height: self.config.height,
            max_count,
            cells,
        })
    }

    /// Polylines per trace segment, further split where the game phase
    /// changes. Consecutive runs share their boundary point.
    pub fn path_overlay(&self, trace: &PathTrace) -> Result<PathOverlay, RenderSpecError> {
        let mut polylines = Vec::new();

        for (index, segment) in trace.segments.iter().enumerate() {
            let mut current: Option<(GamePhase, Vec<PixelPoint>)> = None;
            let mut last: Option<PixelPoint> = None;

            for TracePoint { timestamp_ms, point } in &segment.points {
                let phase = GamePhase::from_timestamp_ms(*timestamp_ms);
                let pixel = self.to_pixel(*point)?;

                let same_phase = matches!(&current, Some((run_phase, _)) if *run_phase == phase);
                if same_phase {
                    if let Some((_, points)) = current.as_mut() {
                        points.push(pixel);
                    }
                } else {
                    if let Some((run_phase, points)) = current.take() {
                        polylines.push(PathPolyline {
                            segment: index,
                            phase: run_phase,
                            points,
                        });
                    }
                    let mut points: Vec<PixelPoint> = last.into_iter().collect();
                    points.push(pixel);
                    current = Some((phase, points));
                }
                last = Some(pixel);
            }

            if let Some((phase, points)) = current {
                polylines.push(PathPolyline {
                    segment: index,
                    phase,
                    points,
                });
            }
        }

        Ok(PathOverlay {
            match_id: trace.match_id.clone(),
            polylines,
        })
    }

    /// Markers for every event of the given kinds, in match then event order.
    pub fn event_markers(&self, matches: &[MatchRecord], kinds: &[EventKind]) -> MarkerLayer {
        let mut layer = MarkerLayer::default();
        for event in matches
            .iter()
            .flat_map(|m| m.events.iter())
            .filter(|e| kinds.contains(&e.kind))
        {
            match self.to_pixel(event.point) {
                Ok(at) => layer.markers.push(EventMarker {
                    match_id: event.match_id.clone(),
                    kind: event.kind,
                    timestamp_ms: event.timestamp_ms,
                    at,
                    shape: MarkerShape::for_kind(event.kind),
                }),
                Err(_) => layer.out_of_bounds += 1,
            }
        }
        layer
    }
}

/// Map-unit extent of a cell along one axis, clipped to the bounds. The
/// edge cell holding points on `max` is drawn over the last full span.
fn cell_span(min: i32, max: i32, index: u32, cell_size: i64) -> (i64, i64) {
    let (min, max) = (min as i64, max as i64);
    let start = min + index as i64 * cell_size;
    let end = (start + cell_size).min(max);
    if end > start {
        (start, end)
    } else {
        ((max - cell_size).max(min), max)
    }
}
