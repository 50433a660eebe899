//! Metric names and extraction from match records.

use match_data::{MatchRecord, MatchStats};

/// Upstream field names whose canonical name is not their snake_case form.
const ALIASES: &[(&str, &str)] = &[
    ("gold_earned", "gold"),
    ("total_damage_dealt_to_champions", "damage"),
    ("game_duration", "duration_secs"),
    ("duration", "duration_secs"),
    ("total_heals_on_teammates", "heal_and_shield"),
    ("effective_heal_and_shielding", "heal_and_shield"),
    ("total_time_c_cing_others", "cc_time_secs"),
    ("time_c_cing_others", "cc_time_secs"),
    ("control_wards", "control_wards_placed"),
    ("kp", "kill_participation"),
];

const DERIVED_METRICS: &[&str] = &["vision_score_per_minute"];

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.trim().chars() {
        if c.is_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if c == '-' || c == ' ' {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Canonical snake_case metric name for any accepted spelling
/// (`visionScore`, `vision_score`, `visionscore`, `VISION_SCORE`).
pub fn canonical_metric(name: &str) -> String {
    let snake = to_snake_case(name).to_lowercase();

    if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == snake) {
        return canonical.to_string();
    }

    let squashed = snake.replace('_', "");
    MatchStats::NAMED_METRICS
        .iter()
        .chain(DERIVED_METRICS.iter())
        .find(|known| known.replace('_', "") == squashed)
        .map(|known| known.to_string())
        .unwrap_or(snake)
}

/// Whether the metric is served by a named stats field or derived from one.
pub fn is_builtin_metric(canonical: &str) -> bool {
    MatchStats::NAMED_METRICS.contains(&canonical) || DERIVED_METRICS.contains(&canonical)
}

/// Values of a metric across matches, skipping matches that lack it.
pub fn metric_values(matches: &[MatchRecord], canonical: &str) -> Vec<f64> {
    matches
        .iter()
        .filter_map(|m| m.stats.get(canonical))
        .filter(|v| v.is_finite())
        .collect()
}

/// Human-readable metric label, e.g. `vision score`.
pub fn metric_label(canonical: &str) -> String {
    canonical.trim_end_matches("_secs").replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names() {
        assert_eq!(canonical_metric("visionScore"), "vision_score");
        assert_eq!(canonical_metric("vision_score"), "vision_score");
        assert_eq!(canonical_metric("visionscore"), "vision_score");
        assert_eq!(canonical_metric("VISION_SCORE"), "vision_score");
        assert_eq!(canonical_metric("killParticipation"), "kill_participation");
        assert_eq!(canonical_metric("goldEarned"), "gold");
        assert_eq!(canonical_metric("totalTimeCCingOthers"), "cc_time_secs");
        assert_eq!(canonical_metric("visionScorePerMinute"), "vision_score_per_minute");
        assert_eq!(canonical_metric("skillshotsHit"), "skillshots_hit");
    }

    #[test]
    fn test_builtin_metrics() {
        assert!(is_builtin_metric("deaths"));
        assert!(is_builtin_metric("vision_score_per_minute"));
        assert!(!is_builtin_metric("skillshots_hit"));
    }

    #[test]
    fn test_metric_label() {
        assert_eq!(metric_label("vision_score"), "vision score");
        assert_eq!(metric_label("cc_time_secs"), "cc time");
    }
}
