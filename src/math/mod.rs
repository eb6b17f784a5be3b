//! Numerical utilities: separable interpolation kernels and robust statistics.

pub mod interp;
pub mod stats;

pub use interp::*;
pub use stats::*;
