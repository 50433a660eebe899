//! Error taxonomy for the analytics core.

use match_data::{PlayerId, Role};
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the Record Store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The player id is unknown to the store. A known player with zero
    /// matches is not an error.
    #[error("unknown player: {0}")]
    NotFound(PlayerId),

    /// Underlying I/O or decoding failed. Never retried by the core.
    #[error("record store unavailable: {context}")]
    Unavailable {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    pub fn unavailable(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        StoreError::Unavailable {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Reasons a metric cannot be benchmarked. The engine signals; callers decide
/// whether to show a partial result or omit the metric.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BenchmarkError {
    #[error("not enough matches to benchmark {metric}: need {required}, have {available}")]
    InsufficientData {
        metric: String,
        required: usize,
        available: usize,
    },

    #[error("no reference distribution for {metric} ({role})")]
    MissingReference { metric: String, role: Role },

    #[error("unknown metric: {0}")]
    UnknownMetric(String),
}

/// Programming-invariant violations in artifact rendering. Fatal to the request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderSpecError {
    #[error("coordinate ({x}, {y}) is outside the map bounds")]
    OutOfBounds { x: i32, y: i32 },

    #[error("cannot render onto an empty canvas or degenerate map")]
    EmptyCanvas,
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Any failure surfaced by the core.
#[derive(Debug, Error)]
pub enum CoachError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Benchmark(#[from] BenchmarkError),

    #[error(transparent)]
    Render(#[from] RenderSpecError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = CoachError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BenchmarkError::InsufficientData {
            metric: "deaths".to_string(),
            required: 5,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "not enough matches to benchmark deaths: need 5, have 2"
        );

        let err = StoreError::NotFound(PlayerId::new("ghost"));
        assert_eq!(err.to_string(), "unknown player: ghost");
    }

    #[test]
    fn test_store_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StoreError::unavailable("reading players/p1.json", io);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("denied"));

        let coach: CoachError = err.into();
        assert!(matches!(coach, CoachError::Store(StoreError::Unavailable { .. })));
    }
}
