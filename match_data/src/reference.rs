//! Reference population statistics (e.g. the professional support corpus).

use serde::{Deserialize, Serialize};

use crate::matches::Role;

/// Percentiles summarised when building a distribution from raw samples.
pub const DEFAULT_PERCENTILES: [f64; 7] = [5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0];

/// One point of a distribution: `percentile`% of the population is at or below `value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileBucket {
    pub percentile: f64,
    pub value: f64,
}

/// Distribution summary of one metric for a comparison population.
///
/// Keyed by role, optional champion and metric name. A `champion` of `None`
/// is the role-wide entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePlayerStat {
    pub role: Role,
    pub champion: Option<String>,
    pub metric: String,
    pub mean: f64,
    pub std_dev: f64,
    pub sample_size: usize,
    /// Ordered by ascending percentile.
    pub buckets: Vec<PercentileBucket>,
}

impl ReferencePlayerStat {
    /// Summarise raw population samples into a reference distribution.
    ///
    /// Percentile values use linear interpolation between order statistics.
    /// Returns `None` for an empty sample set.
    pub fn from_samples(
        role: Role,
        champion: Option<String>,
        metric: impl Into<String>,
        samples: &[f64],
        percentiles: &[f64],
    ) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        let mut wanted: Vec<f64> = percentiles
            .iter()
            .copied()
            .filter(|p| (0.0..=100.0).contains(p))
            .collect();
        wanted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        wanted.dedup();

        let buckets = wanted
            .into_iter()
            .map(|percentile| PercentileBucket {
                percentile,
                value: interpolate_sorted(&sorted, percentile),
            })
            .collect();

        Some(Self {
            role,
            champion,
            metric: metric.into(),
            mean,
            std_dev: variance.sqrt(),
            sample_size: sorted.len(),
            buckets,
        })
    }

    /// Whether this entry is specific to the given champion (case-insensitive).
    pub fn is_for_champion(&self, champion: &str) -> bool {
        self.champion
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(champion))
    }

    pub fn is_role_wide(&self) -> bool {
        self.champion.is_none()
    }
}

fn interpolate_sorted(sorted: &[f64], percentile: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = percentile / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_samples_summary() {
        let samples = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stat = ReferencePlayerStat::from_samples(
            Role::Support,
            None,
            "deaths",
            &samples,
            &[0.0, 50.0, 100.0],
        )
        .unwrap();

        assert!((stat.mean - 5.0).abs() < 1e-9);
        assert!((stat.std_dev - 2.0).abs() < 1e-9);
        assert_eq!(stat.sample_size, 8);
        assert_eq!(stat.buckets.len(), 3);
        assert_eq!(stat.buckets[0].value, 2.0);
        assert!((stat.buckets[1].value - 4.5).abs() < 1e-9);
        assert_eq!(stat.buckets[2].value, 9.0);
    }

    #[test]
    fn test_from_samples_empty() {
        let empty = ReferencePlayerStat::from_samples(Role::Support, None, "kills", &[], &[50.0]);
        assert!(empty.is_none());
    }

    #[test]
    fn test_champion_matching() {
        let stat = ReferencePlayerStat::from_samples(
            Role::Support,
            Some("Nautilus".to_string()),
            "vision_score",
            &[40.0, 50.0],
            &DEFAULT_PERCENTILES,
        )
        .unwrap();
        assert!(stat.is_for_champion("nautilus"));
        assert!(!stat.is_role_wide());
    }
}
