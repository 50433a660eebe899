//! Path traces: the time-ordered positions of the player, split at data gaps.

use match_data::{EventKind, MapBounds, MapPoint, MatchId, MatchRecord};
use serde::{Deserialize, Serialize};

/// A single position sample on a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracePoint {
    pub timestamp_ms: u64,
    pub point: MapPoint,
}

/// A run of samples with no gap longer than the configured threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PathSegment {
    pub points: Vec<TracePoint>,
}

impl PathSegment {
    pub fn start_ms(&self) -> Option<u64> {
        self.points.first().map(|p| p.timestamp_ms)
    }

    pub fn end_ms(&self) -> Option<u64> {
        self.points.last().map(|p| p.timestamp_ms)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Ordered, gap-split trace for one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTrace {
    pub match_id: MatchId,
    pub segments: Vec<PathSegment>,
}

impl PathTrace {
    pub fn point_count(&self) -> usize {
        self.segments.iter().map(PathSegment::len).sum()
    }

    /// `(start_ms, end_ms)` of every segment.
    pub fn boundaries(&self) -> Vec<(u64, u64)> {
        self.segments
            .iter()
            .filter_map(|s| Some((s.start_ms()?, s.end_ms()?)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Build the trace of a match from its position samples.
///
/// Samples are stable-sorted by timestamp. Out-of-bounds samples are dropped
/// and returned as the second tuple element. A gap strictly longer than
/// `gap_ms` between consecutive kept samples starts a new segment.
pub fn build_trace(record: &MatchRecord, gap_ms: u64, bounds: &MapBounds) -> (PathTrace, u64) {
    let mut samples: Vec<TracePoint> = Vec::new();
    let mut dropped = 0u64;

    for event in record.events_of(EventKind::PositionSample) {
        if bounds.contains(event.point) {
            samples.push(TracePoint {
                timestamp_ms: event.timestamp_ms,
                point: event.point,
            });
        } else {
            dropped += 1;
        }
    }
    samples.sort_by_key(|p| p.timestamp_ms);

    let mut segments: Vec<PathSegment> = Vec::new();
    let mut current = PathSegment::default();
    for sample in samples {
        if let Some(last) = current.points.last() {
            if sample.timestamp_ms - last.timestamp_ms > gap_ms {
                segments.push(std::mem::take(&mut current));
            }
        }
        current.points.push(sample);
    }
    if !current.is_empty() {
        segments.push(current);
    }

    (
        PathTrace {
            match_id: record.id.clone(),
            segments,
        },
        dropped,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use match_data::{Outcome, PlayerId, Role};

    fn record_with_samples(samples: &[(u64, i32, i32)]) -> MatchRecord {
        let mut record = MatchRecord::new(
            MatchId::new("NA1_7"),
            PlayerId::new("p1"),
            Role::Support,
            "Rakan",
            Outcome::Loss,
            0,
        );
        for (ts, x, y) in samples {
            record = record.with_event(*ts, MapPoint::new(*x, *y), EventKind::PositionSample);
        }
        record
    }

    #[test]
    fn test_trace_splits_on_gaps() {
        let record = record_with_samples(&[
            (0, 500, 500),
            (60_000, 1_000, 900),
            (120_000, 1_500, 1_200),
            (400_000, 9_000, 9_000),
            (460_000, 9_500, 9_200),
        ]);
        let (trace, dropped) = build_trace(&record, 90_000, &MapBounds::default());

        assert_eq!(dropped, 0);
        assert_eq!(trace.segments.len(), 2);
        assert_eq!(trace.boundaries(), vec![(0, 120_000), (400_000, 460_000)]);
        assert_eq!(trace.point_count(), 5);
    }

    #[test]
    fn test_gap_equal_to_threshold_does_not_split() {
        let record = record_with_samples(&[(0, 10, 10), (90_000, 20, 20)]);
        let (trace, _) = build_trace(&record, 90_000, &MapBounds::default());
        assert_eq!(trace.segments.len(), 1);
    }

    #[test]
    fn test_trace_sorts_and_drops_out_of_bounds() {
        let record = record_with_samples(&[(60_000, 200, 200), (0, 100, 100), (30_000, -50, 100)]);
        let (trace, dropped) = build_trace(&record, 90_000, &MapBounds::default());

        assert_eq!(dropped, 1);
        let timestamps: Vec<_> = trace.segments[0].points.iter().map(|p| p.timestamp_ms).collect();
        assert_eq!(timestamps, vec![0, 60_000]);
    }

    #[test]
    fn test_trace_is_idempotent() {
        let record = record_with_samples(&[
            (0, 10, 10),
            (200_000, 20, 20),
            (210_000, 30, 30),
            (500_000, 40, 40),
        ]);
        let first = build_trace(&record, 90_000, &MapBounds::default());
        let second = build_trace(&record, 90_000, &MapBounds::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_match_without_samples_has_empty_trace() {
        let record = record_with_samples(&[]);
        let (trace, dropped) = build_trace(&record, 90_000, &MapBounds::default());
        assert!(trace.is_empty());
        assert_eq!(dropped, 0);
    }
}
