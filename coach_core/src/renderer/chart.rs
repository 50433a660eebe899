//! Player-versus-reference chart series.

use serde::{Deserialize, Serialize};

use super::ArtifactRenderer;
use crate::benchmark::{clamp_delta, metric_label, BenchmarkResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
}

impl ChartSeries {
    fn new(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }
}

/// Bars of the player's aggregates against the reference means, plus a line
/// of normalized deltas. All series share `labels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkChart {
    pub labels: Vec<String>,
    pub player: ChartSeries,
    pub reference: ChartSeries,
    pub percentile: ChartSeries,
    pub delta: ChartSeries,
    /// Symmetric axis range of the delta series.
    pub delta_range: f64,
}

impl BenchmarkChart {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl ArtifactRenderer {
    /// Chart series for a set of benchmark results, in input order.
    pub fn benchmark_chart(&self, results: &[BenchmarkResult]) -> BenchmarkChart {
        let range = self.config().delta_range.abs();
        BenchmarkChart {
            labels: results.iter().map(|r| metric_label(&r.metric)).collect(),
            player: ChartSeries::new("player", results.iter().map(|r| r.player_value).collect()),
            reference: ChartSeries::new(
                "reference",
                results.iter().map(|r| r.reference_mean).collect(),
            ),
            percentile: ChartSeries::new(
                "percentile",
                results.iter().map(|r| r.percentile).collect(),
            ),
            delta: ChartSeries::new(
                "normalized delta",
                results.iter().map(|r| clamp_delta(r.raw_delta, range)).collect(),
            ),
            delta_range: range,
        }
    }
}
