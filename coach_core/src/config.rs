//! Top-level configuration, loadable from TOML.
//!
//! Every section is optional; missing tables and keys take their defaults.
//!
//! ```toml
//! [spatial]
//! cell_size = 250
//!
//! [benchmark]
//! min_matches = 3
//!
//! [context]
//! budget = 2000
//!
//! [render]
//! width = 512
//! height = 512
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::benchmark::BenchmarkConfig;
use crate::context_assembler::ContextConfig;
use crate::error::ConfigError;
use crate::renderer::RenderConfig;
use crate::spatial::SpatialConfig;

fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    pub spatial: SpatialConfig,
    pub benchmark: BenchmarkConfig,
    pub context: ContextConfig,
    pub render: RenderConfig,
}

impl CoachConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: CoachConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading config");
        Self::from_toml_str(&source)
    }

    /// Reject values that would make the pipeline meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spatial.cell_size == 0 {
            return Err(ConfigError::Invalid("spatial.cell_size must be positive".into()));
        }
        if self.spatial.bounds.is_degenerate() {
            return Err(ConfigError::Invalid("spatial.bounds must have positive area".into()));
        }
        if !is_positive_finite(self.benchmark.delta_clamp) {
            return Err(ConfigError::Invalid(
                "benchmark.delta_clamp must be positive and finite".into(),
            ));
        }
        if self.benchmark.window == 0 {
            return Err(ConfigError::Invalid("benchmark.window must be positive".into()));
        }
        if self.context.budget == 0 {
            return Err(ConfigError::Invalid("context.budget must be positive".into()));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(ConfigError::Invalid("render canvas must be non-empty".into()));
        }
        if !is_positive_finite(self.render.delta_range) {
            return Err(ConfigError::Invalid(
                "render.delta_range must be positive and finite".into(),
            ));
        }
        Ok(())
    }
}
