//! Catalog collaborators of the composite.
//!
//! - `overlay`: place catalog objects on the composite's pixel grid
//! - `redshift`: compare photometric and spectroscopic redshifts

pub mod overlay;
pub mod redshift;

pub use overlay::*;
pub use redshift::*;
