//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - grid containers (`Grid`, `NormalizedGrid`, `CompositeImage`)
//! - channel/stage/shape vocabulary (`Channel`, `Stage`, `Shape`)
//! - configuration and summary records (`CompositeConfig`, `RunSummary`, etc.)

pub mod grid;
pub mod types;

pub use grid::*;
pub use types::*;
