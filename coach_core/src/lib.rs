//! # Coach Core
//!
//! Analytics and retrieval core of Rift Coach. Match history from `match_data`
//! flows through three analyses and ends in a bounded context payload for an
//! advice generator, plus drawable artifact specifications.
//!
//! ## Core Components
//!
//! - **record_store**: Read-only access to matches, reference stats and snippets
//! - **spatial**: Heat grids and path traces over map space
//! - **benchmark**: Percentiles and normalized deltas against a reference population
//! - **context_assembler**: Budgeted selection of facts and knowledge snippets
//! - **renderer**: Pixel-space overlays and chart series
//!
//! ## Design Philosophy
//!
//! - **Pure**: Every analysis is a function of its inputs; the store is the only I/O seam
//! - **Deterministic**: Identical inputs produce identical payloads and artifacts
//! - **Bounded**: The assembled payload never exceeds its budget silently

pub mod benchmark;
pub mod config;
pub mod context_assembler;
pub mod error;
pub mod record_store;
pub mod renderer;
pub mod spatial;
pub mod text;

pub use benchmark::{BenchmarkConfig, BenchmarkEngine, BenchmarkResult};
pub use config::CoachConfig;
pub use context_assembler::{ContextAssembler, ContextConfig, ContextPayload, ContextRequest};
pub use error::{BenchmarkError, CoachError, ConfigError, RenderSpecError, Result, StoreError};
pub use record_store::RecordStore;
pub use renderer::{ArtifactRenderer, RenderConfig};
pub use spatial::{SpatialAggregate, SpatialAggregator, SpatialConfig};
