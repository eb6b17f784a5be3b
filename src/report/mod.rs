//! Reporting utilities: outlier ranking and formatted terminal output.

use crate::catalog::RedshiftPair;

pub mod format;

pub use format::*;

/// Pairs with the largest `|Δz| / (1 + z_spec)`, worst first.
pub fn rank_outliers(pairs: &[RedshiftPair], top_n: usize) -> Vec<RedshiftPair> {
    let mut sorted = pairs.to_vec();
    sorted.sort_by(|a, b| {
        b.scaled_delta()
            .abs()
            .partial_cmp(&a.scaled_delta().abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(top_n);
    sorted
}
