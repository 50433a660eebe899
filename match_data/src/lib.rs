//! # Match Data
//!
//! The data model shared by every Rift Coach component: match records with
//! their positional telemetry, map geometry, reference population statistics
//! and general-knowledge snippets. This crate holds no analytics logic; it is
//! the vocabulary the ingestion collaborator writes and the core reads.

pub mod ids;
pub mod knowledge;
pub mod map;
pub mod matches;
pub mod reference;

pub use ids::*;
pub use knowledge::*;
pub use map::*;
pub use matches::*;
pub use reference::*;
