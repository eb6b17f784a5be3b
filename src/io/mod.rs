//! Input/output helpers.
//!
//! - FITS decoding/encoding (`fits`) and the `GridLoader` seam (`loader`)
//! - catalog CSV ingest + validation (`catalog`)
//! - PNG / CSV exports (`export`)
//! - run summary JSON read/write (`summary`)

pub mod catalog;
pub mod export;
pub mod fits;
pub mod loader;
pub mod summary;

pub use catalog::*;
pub use export::*;
pub use fits::*;
pub use loader::*;
pub use summary::*;
