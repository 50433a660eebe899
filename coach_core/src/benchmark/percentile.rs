//! Aggregation and distribution math.

use match_data::PercentileBucket;
use serde::{Deserialize, Serialize};

/// How a player's per-match values are reduced to one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    #[default]
    Mean,
    /// Robust to outliers; preferred for skewed counts such as deaths.
    Median,
}

impl AggregateKind {
    pub fn label(&self) -> &'static str {
        match self {
            AggregateKind::Mean => "average",
            AggregateKind::Median => "median",
        }
    }

    /// Reduce values to a single aggregate. `None` for an empty slice.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        match self {
            AggregateKind::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            AggregateKind::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    Some((sorted[mid - 1] + sorted[mid]) / 2.0)
                } else {
                    Some(sorted[mid])
                }
            }
        }
    }
}

/// Percentile rank of `value` within a bucketed distribution.
///
/// Linearly interpolates between the two buckets surrounding the value.
/// Values outside the bucket range take the nearest end bucket's percentile.
/// Buckets are re-sorted by value and percentiles forced non-decreasing, so
/// the rank never decreases as `value` grows. `None` without buckets.
pub fn percentile_rank(value: f64, buckets: &[PercentileBucket]) -> Option<f64> {
    let mut sorted: Vec<PercentileBucket> = buckets
        .iter()
        .copied()
        .filter(|b| b.value.is_finite() && b.percentile.is_finite())
        .collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| {
        a.value
            .partial_cmp(&b.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.percentile.partial_cmp(&b.percentile).unwrap_or(std::cmp::Ordering::Equal))
    });
    let mut running = f64::NEG_INFINITY;
    for bucket in &mut sorted {
        running = running.max(bucket.percentile);
        bucket.percentile = running;
    }

    if value < sorted[0].value {
        return Some(sorted[0].percentile);
    }

    // Last bucket at or below the value.
    let lower = sorted.iter().rposition(|b| b.value <= value).unwrap_or(0);
    if lower + 1 == sorted.len() {
        return Some(sorted[lower].percentile);
    }

    let lo = sorted[lower];
    let hi = sorted[lower + 1];
    let fraction = (value - lo.value) / (hi.value - lo.value);
    Some(lo.percentile + (hi.percentile - lo.percentile) * fraction)
}

/// (value - mean) / std_dev, or 0 when the distribution has no spread.
pub fn normalized_delta(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev <= f64::EPSILON {
        0.0
    } else {
        (value - mean) / std_dev
    }
}

/// Clamp a delta to `[-limit, limit]`. A NaN limit leaves the delta as is.
pub fn clamp_delta(delta: f64, limit: f64) -> f64 {
    let limit = limit.abs();
    if limit.is_nan() {
        delta
    } else {
        delta.clamp(-limit, limit)
    }
}
