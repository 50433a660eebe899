//! Timestamped events recorded during a match.

use serde::{Deserialize, Serialize};

use crate::ids::MatchId;
use crate::map::MapPoint;

/// Kinds of positional telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    Kill,
    Death,
    Assist,
    Ping,
    /// Periodic position snapshot; these form the path trace.
    PositionSample,
    WardPlaced,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Kill,
        EventKind::Death,
        EventKind::Assist,
        EventKind::Ping,
        EventKind::PositionSample,
        EventKind::WardPlaced,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Kill => "kill",
            EventKind::Death => "death",
            EventKind::Assist => "assist",
            EventKind::Ping => "ping",
            EventKind::PositionSample => "position",
            EventKind::WardPlaced => "ward",
        }
    }

    /// Kills and assists, the "takedown" half of a combat map.
    pub fn is_takedown(&self) -> bool {
        matches!(self, EventKind::Kill | EventKind::Assist)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A timestamped map coordinate owned by a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionalEvent {
    pub match_id: MatchId,
    /// Milliseconds since game start.
    pub timestamp_ms: u64,
    pub point: MapPoint,
    pub kind: EventKind,
}

impl PositionalEvent {
    pub fn new(match_id: MatchId, timestamp_ms: u64, point: MapPoint, kind: EventKind) -> Self {
        Self {
            match_id,
            timestamp_ms,
            point,
            kind,
        }
    }
}

/// Which team took an objective, relative to the tracked player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Ally,
    Enemy,
}

/// An epic monster or building taken by either team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveEvent {
    pub timestamp_ms: u64,
    /// Upstream objective type, e.g. `DRAGON`, `BARON_NASHOR`, `TOWER_BUILDING`.
    pub objective: String,
    pub taken_by: Side,
    pub point: Option<MapPoint>,
}

impl ObjectiveEvent {
    /// Objective name in title case for statements, e.g. `Tower Building`.
    pub fn display_name(&self) -> String {
        self.objective
            .split('_')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let lower = part.to_lowercase();
                let mut chars = lower.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_takedown_kinds() {
        assert!(EventKind::Kill.is_takedown());
        assert!(EventKind::Assist.is_takedown());
        assert!(!EventKind::Death.is_takedown());
    }

    #[test]
    fn test_objective_display_name() {
        let event = ObjectiveEvent {
            timestamp_ms: 0,
            objective: "BARON_NASHOR".to_string(),
            taken_by: Side::Enemy,
            point: None,
        };
        assert_eq!(event.display_name(), "Baron Nashor");
    }
}
