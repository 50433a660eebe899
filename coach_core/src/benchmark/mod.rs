//! Benchmark Engine - ranks a player's statistics against a reference
//! population.
//!
//! For each metric:
//! 1. **Collect**: the player's values over their most recent matches in the role
//! 2. **Aggregate**: mean or median, configurable per metric
//! 3. **Reference**: champion-specific distribution, or role-wide fallback per policy
//! 4. **Rank**: interpolated percentile within the reference buckets
//! 5. **Normalize**: (aggregate - mean) / std_dev, clamped for display

mod metric;
mod percentile;
mod playstyle;
mod pool;

pub use metric::*;
pub use percentile::*;
pub use playstyle::*;
pub use pool::*;

use match_data::{MatchRecord, PlayerId, ReferencePlayerStat, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{BenchmarkError, StoreError};
use crate::record_store::{MatchFilter, RecordStore};

/// What to do when champion-specific reference data is missing or sparse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChampionFallback {
    /// Use the role-wide distribution when the champion entry is absent or
    /// has fewer than `min_reference_samples` samples.
    #[default]
    RoleWide,
    /// Only ever compare against the champion's own distribution.
    ChampionOnly,
}

/// Configuration for the benchmark engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Aggregate used for metrics without an explicit entry.
    pub default_aggregate: AggregateKind,

    /// Per-metric aggregate choice, keyed by canonical metric name.
    pub aggregates: BTreeMap<String, AggregateKind>,

    /// Minimum matches carrying a metric before it can be benchmarked.
    pub min_matches: usize,

    /// Per-metric overrides of `min_matches`.
    pub min_matches_overrides: BTreeMap<String, usize>,

    /// Only the most recent `window` matches are considered.
    pub window: usize,

    /// Normalized deltas are clamped to `[-delta_clamp, delta_clamp]`.
    pub delta_clamp: f64,

    pub champion_fallback: ChampionFallback,

    /// Champion entries with fewer samples count as sparse.
    pub min_reference_samples: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        let mut aggregates = BTreeMap::new();
        aggregates.insert("deaths".to_string(), AggregateKind::Median);
        Self {
            default_aggregate: AggregateKind::Mean,
            aggregates,
            min_matches: 5,
            min_matches_overrides: BTreeMap::new(),
            window: 20,
            delta_clamp: 3.0,
            champion_fallback: ChampionFallback::RoleWide,
            min_reference_samples: 10,
        }
    }
}

impl BenchmarkConfig {
    pub fn aggregate_for(&self, canonical: &str) -> AggregateKind {
        self.aggregates
            .get(canonical)
            .copied()
            .unwrap_or(self.default_aggregate)
    }

    pub fn min_matches_for(&self, canonical: &str) -> usize {
        self.min_matches_overrides
            .get(canonical)
            .copied()
            .unwrap_or(self.min_matches)
    }
}

/// Which reference distribution a result was compared against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceScope {
    Champion(String),
    RoleWide,
}

/// One benchmarked metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Canonical metric name.
    pub metric: String,
    pub role: Role,
    pub aggregate: AggregateKind,
    pub player_value: f64,
    pub matches_used: usize,
    pub reference_mean: f64,
    pub reference_std_dev: f64,
    pub scope: ReferenceScope,
    /// Percentile rank (0 - 100) of the player's aggregate.
    pub percentile: f64,
    /// Unclamped (value - mean) / std_dev.
    pub raw_delta: f64,
    /// `raw_delta` clamped to the configured display range.
    pub normalized_delta: f64,
}

impl BenchmarkResult {
    /// Ratio of the player's value to the reference mean, if defined.
    pub fn ratio_to_reference(&self) -> Option<f64> {
        (self.reference_mean.abs() > f64::EPSILON).then(|| self.player_value / self.reference_mean)
    }
}

/// Per-metric outcome of a multi-metric benchmark run.
pub type MetricOutcome = (String, Result<BenchmarkResult, BenchmarkError>);

/// Computes benchmark results.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkEngine {
    config: BenchmarkConfig,
}

impl BenchmarkEngine {
    /// Create a new engine with the given configuration.
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    /// Create an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(BenchmarkConfig::default())
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Pick the reference distribution for a metric according to the
    /// fallback policy.
    pub fn select_reference<'a>(
        &self,
        reference: &'a [ReferencePlayerStat],
        role: Role,
        champion: Option<&str>,
        canonical: &str,
    ) -> Option<(&'a ReferencePlayerStat, ReferenceScope)> {
        let candidates = || {
            reference
                .iter()
                .filter(move |s| s.role == role && canonical_metric(&s.metric) == canonical)
        };

        let role_wide = || {
            candidates()
                .find(|s| s.is_role_wide())
                .map(|s| (s, ReferenceScope::RoleWide))
        };

        let Some(champion) = champion else {
            return role_wide();
        };

        let specific = candidates().find(|s| s.is_for_champion(champion));
        match (self.config.champion_fallback, specific) {
            (ChampionFallback::ChampionOnly, Some(stat)) => {
                Some((stat, ReferenceScope::Champion(champion.to_string())))
            }
            (ChampionFallback::ChampionOnly, None) => None,
            (ChampionFallback::RoleWide, Some(stat))
                if stat.sample_size >= self.config.min_reference_samples =>
            {
                Some((stat, ReferenceScope::Champion(champion.to_string())))
            }
            (ChampionFallback::RoleWide, Some(stat)) => {
                // Sparse champion data: prefer role-wide, keep the sparse entry as last resort.
                role_wide().or(Some((stat, ReferenceScope::Champion(champion.to_string()))))
            }
            (ChampionFallback::RoleWide, None) => role_wide(),
        }
    }

    /// Benchmark one metric.
    ///
    /// `matches` should be ordered most recent first; only matches in `role`
    /// (and on `champion`, when given) within the configured window count.
    pub fn benchmark_metric(
        &self,
        matches: &[MatchRecord],
        reference: &[ReferencePlayerStat],
        role: Role,
        champion: Option<&str>,
        metric: &str,
    ) -> Result<BenchmarkResult, BenchmarkError> {
        let canonical = canonical_metric(metric);

        let relevant: Vec<MatchRecord> = matches
            .iter()
            .filter(|m| m.role == role)
            .filter(|m| champion.map_or(true, |c| m.champion.eq_ignore_ascii_case(c)))
            .take(self.config.window)
            .cloned()
            .collect();
        let values = metric_values(&relevant, &canonical);

        let known = is_builtin_metric(&canonical)
            || !values.is_empty()
            || reference.iter().any(|s| canonical_metric(&s.metric) == canonical);
        if !known {
            return Err(BenchmarkError::UnknownMetric(canonical));
        }

        let required = self.config.min_matches_for(&canonical);
        if values.len() < required {
            return Err(BenchmarkError::InsufficientData {
                metric: canonical,
                required,
                available: values.len(),
            });
        }

        let (stat, scope) = self
            .select_reference(reference, role, champion, &canonical)
            .ok_or_else(|| BenchmarkError::MissingReference {
                metric: canonical.clone(),
                role,
            })?;

        let aggregate = self.config.aggregate_for(&canonical);
        let player_value = aggregate.apply(&values).ok_or_else(|| BenchmarkError::InsufficientData {
            metric: canonical.clone(),
            required: required.max(1),
            available: 0,
        })?;

        // Without buckets only the mean is known; report the median rank.
        let percentile = percentile_rank(player_value, &stat.buckets).unwrap_or(50.0);
        let raw_delta = normalized_delta(player_value, stat.mean, stat.std_dev);

        Ok(BenchmarkResult {
            metric: canonical,
            role,
            aggregate,
            player_value,
            matches_used: values.len(),
            reference_mean: stat.mean,
            reference_std_dev: stat.std_dev,
            scope,
            percentile,
            raw_delta,
            normalized_delta: clamp_delta(raw_delta, self.config.delta_clamp),
        })
    }

    /// Benchmark several metrics, reporting each outcome separately.
    pub fn benchmark_all<S: AsRef<str>>(
        &self,
        matches: &[MatchRecord],
        reference: &[ReferencePlayerStat],
        role: Role,
        champion: Option<&str>,
        metrics: &[S],
    ) -> Vec<MetricOutcome> {
        metrics
            .iter()
            .map(|metric| {
                let metric = metric.as_ref();
                (
                    canonical_metric(metric),
                    self.benchmark_metric(matches, reference, role, champion, metric),
                )
            })
            .collect()
    }

    /// Fetch the player's matches and the reference data, then benchmark.
    ///
    /// The window covers the most recent matches in the role, and on the
    /// champion when one is given.
    ///
    /// Store failures are returned as the outer error; per-metric problems
    /// are reported in the inner results.
    pub fn benchmark_player<R: RecordStore + ?Sized, S: AsRef<str>>(
        &self,
        store: &R,
        player_id: &PlayerId,
        role: Role,
        champion: Option<&str>,
        metrics: &[S],
    ) -> Result<Vec<MetricOutcome>, StoreError> {
        let mut filter = MatchFilter::new().role(role).limit(self.config.window);
        if let Some(champion) = champion {
            filter = filter.champion(champion);
        }
        let matches = store.get_matches(player_id, &filter)?;
        let reference = store.get_reference_stats(role, champion)?;
        Ok(self.benchmark_all(&matches, &reference, role, champion, metrics))
    }
}
