//! Match records: one played game for the tracked player.

mod events;

pub use events::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::{MatchId, PlayerId};
use crate::map::MapPoint;

/// Lane assignment of a player in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Top,
    Jungle,
    Mid,
    Bottom,
    Support,
}

impl Role {
    /// Parse a role name, accepting the upstream team-position aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "TOP" => Some(Role::Top),
            "JUNGLE" | "JG" => Some(Role::Jungle),
            "MID" | "MIDDLE" => Some(Role::Mid),
            "BOTTOM" | "BOT" | "ADC" => Some(Role::Bottom),
            "SUPPORT" | "UTILITY" | "SUP" => Some(Role::Support),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Top => "top",
            Role::Jungle => "jungle",
            Role::Mid => "mid",
            Role::Bottom => "bottom",
            Role::Support => "support",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Result of a match for the tracked player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    /// Early surrender; excluded from win-rate figures.
    Remake,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
            Outcome::Remake => "remake",
        }
    }
}

/// Scalar end-of-game statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MatchStats {
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub gold: u32,
    pub damage: u32,
    pub duration_secs: u32,

    // Support-specific
    pub vision_score: f64,
    pub wards_placed: u32,
    pub wards_killed: u32,
    pub control_wards_placed: u32,
    /// Share of the team's kills the player took part in (0.0 - 1.0).
    pub kill_participation: f64,
    pub heal_and_shield: f64,
    pub cc_time_secs: f64,

    /// Any other upstream challenge metric, keyed by canonical snake_case name.
    #[serde(default)]
    pub extra: BTreeMap<String, f64>,
}

impl MatchStats {
    /// Canonical metric names served by named fields.
    pub const NAMED_METRICS: [&'static str; 13] = [
        "kills",
        "deaths",
        "assists",
        "gold",
        "damage",
        "duration_secs",
        "vision_score",
        "wards_placed",
        "wards_killed",
        "control_wards_placed",
        "kill_participation",
        "heal_and_shield",
        "cc_time_secs",
    ];

    /// Look up a metric by canonical name, falling back to `extra`.
    pub fn get(&self, metric: &str) -> Option<f64> {
        let value = match metric {
            "kills" => self.kills as f64,
            "deaths" => self.deaths as f64,
            "assists" => self.assists as f64,
            "gold" => self.gold as f64,
            "damage" => self.damage as f64,
            "duration_secs" => self.duration_secs as f64,
            "vision_score" => self.vision_score,
            "wards_placed" => self.wards_placed as f64,
            "wards_killed" => self.wards_killed as f64,
            "control_wards_placed" => self.control_wards_placed as f64,
            "kill_participation" => self.kill_participation,
            "heal_and_shield" => self.heal_and_shield,
            "cc_time_secs" => self.cc_time_secs,
            "vision_score_per_minute" if self.duration_secs > 0 => {
                self.vision_score / (self.duration_secs as f64 / 60.0)
            }
            other => return self.extra.get(other).copied(),
        };
        Some(value)
    }

    /// (kills + assists) / deaths, with zero deaths counted as one.
    pub fn kda(&self) -> f64 {
        (self.kills + self.assists) as f64 / self.deaths.max(1) as f64
    }
}

/// One played game instance for the tracked player.
///
/// Records are written by the ingestion collaborator and never mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub player_id: PlayerId,
    pub role: Role,
    pub champion: String,
    pub outcome: Outcome,

    /// Match start, unix seconds.
    pub started_at: u64,

    pub stats: MatchStats,

    /// Positional telemetry in timestamp order.
    #[serde(default)]
    pub events: Vec<PositionalEvent>,

    /// Objectives taken by either team.
    #[serde(default)]
    pub objectives: Vec<ObjectiveEvent>,

    /// Final build item ids.
    #[serde(default)]
    pub items: Vec<u32>,
}

impl MatchRecord {
    /// Create a new record with empty telemetry.
    pub fn new(
        id: MatchId,
        player_id: PlayerId,
        role: Role,
        champion: impl Into<String>,
        outcome: Outcome,
        started_at: u64,
    ) -> Self {
        Self {
            id,
            player_id,
            role,
            champion: champion.into(),
            outcome,
            started_at,
            stats: MatchStats::default(),
            events: Vec::new(),
            objectives: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn with_stats(mut self, stats: MatchStats) -> Self {
        self.stats = stats;
        self
    }

    /// Append an event owned by this match.
    pub fn with_event(mut self, timestamp_ms: u64, point: MapPoint, kind: EventKind) -> Self {
        self.events
            .push(PositionalEvent::new(self.id.clone(), timestamp_ms, point, kind));
        self
    }

    pub fn with_objective(mut self, objective: ObjectiveEvent) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn is_win(&self) -> bool {
        self.outcome == Outcome::Win
    }

    /// Iterate over events of a given kind in recorded order.
    pub fn events_of(&self, kind: EventKind) -> impl Iterator<Item = &PositionalEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }
}
