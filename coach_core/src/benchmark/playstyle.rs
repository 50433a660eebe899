//! Playstyle classification from benchmark results.

use serde::{Deserialize, Serialize};

use super::BenchmarkResult;

/// Vision above this multiple of the reference mean reads as vision-focused.
pub const VISION_FOCUS_RATIO: f64 = 1.15;
/// Kill participation above this multiple reads as a playmaker.
pub const PLAYMAKER_RATIO: f64 = 1.1;
/// Deaths above this multiple count as high-risk evidence.
pub const HIGH_RISK_DEATH_RATIO: f64 = 1.2;
/// Deaths below this multiple read as a safe player.
pub const SAFE_DEATH_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Playstyle {
    VisionFocusedController,
    AggressivePlaymaker,
    SafeDefensive,
    Balanced,
}

impl Playstyle {
    pub fn label(&self) -> &'static str {
        match self {
            Playstyle::VisionFocusedController => "Vision-Focused Controller",
            Playstyle::AggressivePlaymaker => "Aggressive Playmaker",
            Playstyle::SafeDefensive => "Safe/Defensive Player",
            Playstyle::Balanced => "Balanced",
        }
    }
}

impl std::fmt::Display for Playstyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// An inferred playstyle with the statements supporting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaystyleReport {
    pub playstyle: Playstyle,
    pub evidence: Vec<String>,
}

fn find<'a>(results: &'a [BenchmarkResult], metric: &str) -> Option<&'a BenchmarkResult> {
    results
        .iter()
        .find(|r| r.metric == metric && r.reference_mean.abs() > f64::EPSILON)
}

/// Infer a playstyle from vision, kill participation and deaths.
///
/// Needs a vision score result with a non-zero player value and reference
/// mean; returns `None` otherwise. Later rules override earlier ones, so a
/// low death count wins over high kill participation, which wins over
/// vision.
pub fn infer_playstyle(results: &[BenchmarkResult]) -> Option<PlaystyleReport> {
    let vision = find(results, "vision_score").filter(|r| r.player_value > 0.0)?;

    let mut playstyle = Playstyle::Balanced;
    let mut evidence = Vec::new();

    if vision.player_value > vision.reference_mean * VISION_FOCUS_RATIO {
        playstyle = Playstyle::VisionFocusedController;
        evidence.push(format!(
            "Your {} vision score ({:.2}) is higher than the reference average ({:.2}).",
            vision.aggregate.label(),
            vision.player_value,
            vision.reference_mean
        ));
    }

    if let Some(kp) = find(results, "kill_participation") {
        if kp.player_value > kp.reference_mean * PLAYMAKER_RATIO {
            playstyle = Playstyle::AggressivePlaymaker;
            evidence.push(format!(
                "Your kill participation ({:.0}%) is higher than the reference average ({:.0}%).",
                kp.player_value * 100.0,
                kp.reference_mean * 100.0
            ));
        }
    }

    if let Some(deaths) = find(results, "deaths") {
        if deaths.player_value > deaths.reference_mean * HIGH_RISK_DEATH_RATIO {
            evidence.push(format!(
                "You tend to die more ({:.2}) than the reference ({:.2}), \
                 suggesting a high-risk style.",
                deaths.player_value, deaths.reference_mean
            ));
        } else if deaths.player_value < deaths.reference_mean * SAFE_DEATH_RATIO {
            playstyle = Playstyle::SafeDefensive;
            evidence.push(format!(
                "Your deaths ({:.2}) are lower than the reference average ({:.2}).",
                deaths.player_value, deaths.reference_mean
            ));
        }
    }

    if evidence.is_empty() {
        evidence.push("Your stats are very similar to the reference averages.".to_string());
    }

    Some(PlaystyleReport { playstyle, evidence })
}
