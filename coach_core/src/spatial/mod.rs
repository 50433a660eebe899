//! Spatial Aggregator - turns positional event streams into map-space
//! aggregates.
//!
//! For a set of matches and an event kind the aggregator produces:
//! 1. **Heat grid**: per-cell counts of the requested event kind
//! 2. **Path traces**: per-match position samples split at data gaps
//! 3. **Diagnostics**: how many events were dropped as out of bounds
//!
//! Per-match aggregation is associative, so large match sets are aggregated
//! in parallel and merged by summing counts.

mod cache;
mod grid;
mod trace;

pub use cache::*;
pub use grid::*;
pub use trace::*;

use match_data::{EventKind, MapBounds, MatchId, MatchRecord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Configuration for spatial aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Side length of a grid cell in map units.
    pub cell_size: u32,

    /// A gap between position samples longer than this splits the trace.
    pub path_gap_ms: u64,

    /// Valid map coordinates; anything outside is dropped and counted.
    pub bounds: MapBounds,

    /// Match count above which aggregation runs in parallel.
    pub parallel_threshold: usize,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            cell_size: 500,
            path_gap_ms: 90_000,
            bounds: MapBounds::default(),
            parallel_threshold: 64,
        }
    }
}

/// Data-quality counters surfaced alongside an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpatialDiagnostics {
    /// Qualifying in-bounds events counted into the grid.
    pub events_counted: u64,

    /// Qualifying events dropped for lying outside the map bounds.
    pub out_of_bounds_events: u64,

    /// Position samples dropped from traces for lying outside the map bounds.
    pub out_of_bounds_samples: u64,

    /// Matches that contributed no qualifying event.
    pub matches_without_events: u64,
}

impl SpatialDiagnostics {
    pub fn merge(&mut self, other: &SpatialDiagnostics) {
        self.events_counted += other.events_counted;
        self.out_of_bounds_events += other.out_of_bounds_events;
        self.out_of_bounds_samples += other.out_of_bounds_samples;
        self.matches_without_events += other.matches_without_events;
    }

    pub fn has_data_quality_issues(&self) -> bool {
        self.out_of_bounds_events > 0 || self.out_of_bounds_samples > 0
    }
}

/// Heat grid, path traces and diagnostics for one event kind over a match set.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialAggregate {
    pub kind: EventKind,
    pub grid: HeatGrid,
    /// Keyed by match so merging never interleaves traces.
    pub traces: BTreeMap<MatchId, PathTrace>,
    pub diagnostics: SpatialDiagnostics,
}

impl SpatialAggregate {
    pub fn empty(kind: EventKind, config: &SpatialConfig) -> Self {
        Self {
            kind,
            grid: HeatGrid::new(config.cell_size, config.bounds),
            traces: BTreeMap::new(),
            diagnostics: SpatialDiagnostics::default(),
        }
    }

    /// Fold another aggregate of the same kind into this one.
    pub fn merge(&mut self, other: SpatialAggregate) {
        debug_assert_eq!(self.kind, other.kind, "merging aggregates of different kinds");
        self.grid.merge(&other.grid);
        self.traces.extend(other.traces);
        self.diagnostics.merge(&other.diagnostics);
    }

    pub fn merged(mut self, other: SpatialAggregate) -> Self {
        self.merge(other);
        self
    }

    pub fn trace(&self, match_id: &MatchId) -> Option<&PathTrace> {
        self.traces.get(match_id)
    }
}

/// Builds spatial aggregates from match records.
#[derive(Debug, Clone, Default)]
pub struct SpatialAggregator {
    config: SpatialConfig,
}

impl SpatialAggregator {
    /// Create a new aggregator with the given configuration.
    pub fn new(config: SpatialConfig) -> Self {
        Self { config }
    }

    /// Create an aggregator with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SpatialConfig::default())
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    /// Aggregate a single match.
    pub fn aggregate_match(&self, record: &MatchRecord, kind: EventKind) -> SpatialAggregate {
        let mut aggregate = SpatialAggregate::empty(kind, &self.config);

        let mut qualifying = 0u64;
        for event in record.events_of(kind) {
            qualifying += 1;
            if aggregate.grid.record(event.point) {
                aggregate.diagnostics.events_counted += 1;
            } else {
                aggregate.diagnostics.out_of_bounds_events += 1;
            }
        }
        if qualifying == 0 {
            aggregate.diagnostics.matches_without_events = 1;
        }

        let (trace, dropped) = build_trace(record, self.config.path_gap_ms, &self.config.bounds);
        aggregate.diagnostics.out_of_bounds_samples = dropped;
        if !trace.is_empty() {
            aggregate.traces.insert(record.id.clone(), trace);
        }

        aggregate
    }

    /// Aggregate a match set. Identical inputs always give identical output,
    /// whether or not the parallel path is taken.
    pub fn aggregate(&self, matches: &[MatchRecord], kind: EventKind) -> SpatialAggregate {
        let aggregate = if matches.len() > self.config.parallel_threshold {
            matches
                .par_iter()
                .map(|record| self.aggregate_match(record, kind))
                .reduce(|| SpatialAggregate::empty(kind, &self.config), SpatialAggregate::merged)
        } else {
            matches
                .iter()
                .map(|record| self.aggregate_match(record, kind))
                .fold(SpatialAggregate::empty(kind, &self.config), SpatialAggregate::merged)
        };

        if aggregate.diagnostics.has_data_quality_issues() {
            warn!(
                kind = %kind,
                out_of_bounds_events = aggregate.diagnostics.out_of_bounds_events,
                out_of_bounds_samples = aggregate.diagnostics.out_of_bounds_samples,
                "dropped out-of-bounds telemetry"
            );
        }

        aggregate
    }

    /// Trace for one match without building a grid.
    pub fn path_trace(&self, record: &MatchRecord) -> PathTrace {
        build_trace(record, self.config.path_gap_ms, &self.config.bounds).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use match_data::{MapPoint, Outcome, PlayerId, Role};
    use proptest::prelude::*;

    fn empty_match(id: &str) -> MatchRecord {
        MatchRecord::new(
            MatchId::new(id),
            PlayerId::new("p1"),
            Role::Support,
            "Braum",
            Outcome::Win,
            0,
        )
    }

    fn aggregator(cell_size: u32) -> SpatialAggregator {
        SpatialAggregator::new(SpatialConfig {
            cell_size,
            ..SpatialConfig::default()
        })
    }

    #[test]
    fn test_kill_grid_scenario() {
        // Five matches; three kills logged across them.
        let matches = vec![
            empty_match("M1").with_event(1_000, MapPoint::new(10, 10), EventKind::Kill),
            empty_match("M2").with_event(2_000, MapPoint::new(10, 11), EventKind::Kill),
            empty_match("M3").with_event(3_000, MapPoint::new(50, 50), EventKind::Kill),
            empty_match("M4").with_event(4_000, MapPoint::new(70, 70), EventKind::Death),
            empty_match("M5"),
        ];

        let aggregate = aggregator(20).aggregate(&matches, EventKind::Kill);
        let cells: Vec<_> = aggregate.grid.iter().collect();

        assert_eq!(cells, vec![(CellId::new(0, 0), 2), (CellId::new(2, 2), 1)]);
        assert_eq!(aggregate.diagnostics.events_counted, 3);
        assert_eq!(aggregate.diagnostics.matches_without_events, 2);
    }

    #[test]
    fn test_out_of_bounds_events_are_counted() {
        let matches = vec![empty_match("M1")
            .with_event(1_000, MapPoint::new(100, 100), EventKind::Death)
            .with_event(2_000, MapPoint::new(-10, 100), EventKind::Death)
            .with_event(3_000, MapPoint::new(100, 20_000), EventKind::Death)];

        let aggregate = aggregator(100).aggregate(&matches, EventKind::Death);
        assert_eq!(aggregate.grid.total(), 1);
        assert_eq!(aggregate.diagnostics.out_of_bounds_events, 2);
        assert!(aggregate.diagnostics.has_data_quality_issues());
    }

    #[test]
    fn test_traces_are_per_match() {
        let matches = vec![
            empty_match("M1")
                .with_event(0, MapPoint::new(100, 100), EventKind::PositionSample)
                .with_event(60_000, MapPoint::new(200, 200), EventKind::PositionSample),
            empty_match("M2").with_event(0, MapPoint::new(300, 300), EventKind::PositionSample),
        ];

        let aggregate = aggregator(100).aggregate(&matches, EventKind::Kill);
        assert_eq!(aggregate.traces.len(), 2);
        assert_eq!(aggregate.trace(&MatchId::new("M1")).unwrap().point_count(), 2);
        assert_eq!(aggregate.trace(&MatchId::new("M2")).unwrap().point_count(), 1);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let matches: Vec<_> = (0..40)
            .map(|i| {
                empty_match(&format!("M{i}"))
                    .with_event(1_000, MapPoint::new(i * 300, i * 200), EventKind::Assist)
                    .with_event(2_000, MapPoint::new(14_000 - i * 100, 700), EventKind::Assist)
                    .with_event(3_000, MapPoint::new(i * 50, i * 50), EventKind::PositionSample)
            })
            .collect();

        let sequential = SpatialAggregator::new(SpatialConfig {
            parallel_threshold: usize::MAX,
            ..SpatialConfig::default()
        })
        .aggregate(&matches, EventKind::Assist);
        let parallel = SpatialAggregator::new(SpatialConfig {
            parallel_threshold: 0,
            ..SpatialConfig::default()
        })
        .aggregate(&matches, EventKind::Assist);

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let matches = vec![empty_match("M1")
            .with_event(1_000, MapPoint::new(1_000, 1_000), EventKind::WardPlaced)
            .with_event(2_000, MapPoint::new(1_100, 1_050), EventKind::WardPlaced)];
        let aggregator = SpatialAggregator::with_defaults();
        assert_eq!(
            aggregator.aggregate(&matches, EventKind::WardPlaced),
            aggregator.aggregate(&matches, EventKind::WardPlaced)
        );
    }

    proptest! {
        /// Property: grid counts sum to the number of qualifying in-bounds events.
        #[test]
        fn prop_grid_conserves_in_bounds_events(
            points in proptest::collection::vec((-2_000i32..17_000, -2_000i32..17_000), 0..200),
            cell_size in 1u32..3_000,
        ) {
            let bounds = MapBounds::default();
            let mut record = empty_match("P1");
            for (i, (x, y)) in points.iter().enumerate() {
                let point = MapPoint::new(*x, *y);
                record = record.with_event(i as u64 * 1_000, point, EventKind::Death);
            }
            let expected = points
                .iter()
                .filter(|(x, y)| bounds.contains(MapPoint::new(*x, *y)))
                .count() as u64;

            let aggregate = aggregator(cell_size).aggregate(&[record], EventKind::Death);
            prop_assert_eq!(aggregate.grid.total(), expected);
            prop_assert_eq!(aggregate.diagnostics.events_counted, expected);
            prop_assert_eq!(
                aggregate.diagnostics.out_of_bounds_events,
                points.len() as u64 - expected
            );
        }
    }
}
