//! Compositing core: normalize -> reconcile shapes (resample) -> compose.
//!
//! ```text
//!   Grid ──normalize──▶ NormalizedGrid ─┐
//!   Grid ──normalize──▶ NormalizedGrid ─┼─reconcile─▶ [NormalizedGrid; 3] ──compose──▶ CompositeImage
//!   Grid ──normalize──▶ NormalizedGrid ─┘
//! ```
//!
//! Normalization runs before resampling so the interpolation kernels only ever
//! see finite, bounded data.

pub mod compositor;
pub mod normalize;
pub mod reconcile;
pub mod resample;

pub use compositor::*;
pub use normalize::*;
pub use reconcile::*;
pub use resample::*;
