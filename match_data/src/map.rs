//! Map geometry: coordinates, valid bounds, named regions and game phases.

use serde::{Deserialize, Serialize};

/// Side length of the game map in map units.
pub const MAP_SIZE: i32 = 15_000;

/// End of the early game, in milliseconds of game time.
pub const EARLY_GAME_END_MS: u64 = 14 * 60 * 1000;

/// End of the mid game, in milliseconds of game time.
pub const MID_GAME_END_MS: u64 = 25 * 60 * 1000;

/// A coordinate in map space. `y` grows towards the top of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: i32,
    pub y: i32,
}

impl MapPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &MapPoint) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Inclusive rectangle of valid map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: MAP_SIZE,
            max_y: MAP_SIZE,
        }
    }
}

impl MapBounds {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Check whether a point lies inside the bounds (edges included).
    pub fn contains(&self, point: MapPoint) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    pub fn width(&self) -> i64 {
        self.max_x as i64 - self.min_x as i64
    }

    pub fn height(&self) -> i64 {
        self.max_y as i64 - self.min_y as i64
    }

    /// A degenerate rectangle cannot be mapped onto a grid or an image.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }
}

/// Coarse named zones of the map, used to phrase spatial findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MapRegion {
    /// Bottom-left base.
    BlueBase,
    /// Top-right base.
    RedBase,
    TopLane,
    MidLane,
    BotLane,
    River,
    Jungle,
}

impl MapRegion {
    /// Classify a point relative to the given bounds.
    ///
    /// Bases take precedence over lanes, the outer lanes over the mid lane,
    /// and the mid lane over the river. Anything else is jungle.
    pub fn classify(point: MapPoint, bounds: &MapBounds) -> Self {
        if bounds.is_degenerate() {
            return MapRegion::Jungle;
        }
        let u = (point.x as f64 - bounds.min_x as f64) / bounds.width() as f64;
        let v = (point.y as f64 - bounds.min_y as f64) / bounds.height() as f64;

        if u < 0.25 && v < 0.25 {
            MapRegion::BlueBase
        } else if u > 0.75 && v > 0.75 {
            MapRegion::RedBase
        } else if u < 0.13 || v > 0.87 {
            MapRegion::TopLane
        } else if v < 0.13 || u > 0.87 {
            MapRegion::BotLane
        } else if (u - v).abs() < 0.08 {
            MapRegion::MidLane
        } else if (u + v - 1.0).abs() < 0.08 {
            MapRegion::River
        } else {
            MapRegion::Jungle
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MapRegion::BlueBase => "blue base",
            MapRegion::RedBase => "red base",
            MapRegion::TopLane => "top lane",
            MapRegion::MidLane => "mid lane",
            MapRegion::BotLane => "bot lane",
            MapRegion::River => "river",
            MapRegion::Jungle => "jungle",
        }
    }
}

impl std::fmt::Display for MapRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Phases of a game used to colour path traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GamePhase {
    #[default]
    Early,
    Mid,
    Late,
}

impl GamePhase {
    pub fn from_timestamp_ms(timestamp_ms: u64) -> Self {
        if timestamp_ms <= EARLY_GAME_END_MS {
            GamePhase::Early
        } else if timestamp_ms <= MID_GAME_END_MS {
            GamePhase::Mid
        } else {
            GamePhase::Late
        }
    }
}
