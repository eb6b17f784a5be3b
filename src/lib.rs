//! `udf-rgb` library crate.
//!
//! The binary (`udf`) is a thin wrapper around this library so that:
//!
//! - the compositing core is testable without spawning processes
//! - loaders, catalog collaborators and exports are reusable on their own
//! - code stays easy to navigate as the project grows
//!
//! The core entry point is [`app::pipeline::build_composite`].

pub mod app;
pub mod catalog;
pub mod cli;
pub mod composite;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;

pub use app::pipeline::{build_composite, run_composite};
