//! Channel normalization: arbitrary-range grid -> [0, 1] grid.
//!
//! `v ↦ (v - lo) / (hi - lo)` over the finite samples, fill value elsewhere.
//! A grid with no finite samples, or with `hi == lo`, has no dynamic range and
//! is rejected instead of producing NaN/Inf.

use log::debug;
use nalgebra::DMatrix;

use crate::domain::{Grid, NormalizedGrid};
use crate::error::CompositeError;

/// Facts about the source grid gathered during normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeStats {
    pub lo: f64,
    pub hi: f64,
    pub undefined_cells: usize,
}

/// Maps grids into [0, 1], filling undefined cells with a fixed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelNormalizer {
    fill_value: f64,
}

impl Default for ChannelNormalizer {
    fn default() -> Self {
        Self { fill_value: 0.0 }
    }
}

impl ChannelNormalizer {
    /// The fill value must itself satisfy the [0, 1] invariant.
    pub fn new(fill_value: f64) -> Result<Self, CompositeError> {
        if !(0.0..=1.0).contains(&fill_value) {
            return Err(CompositeError::InvalidFill(fill_value));
        }
        Ok(Self { fill_value })
    }

    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    pub fn normalize(&self, grid: &Grid) -> Result<NormalizedGrid, CompositeError> {
        self.normalize_with_stats(grid).map(|(normalized, _)| normalized)
    }

    /// Normalize and also report the range and undefined-cell count used.
    pub fn normalize_with_stats(&self, grid: &Grid) -> Result<(NormalizedGrid, NormalizeStats), CompositeError> {
        let (lo, hi) = grid
            .finite_range()
            .ok_or(CompositeError::DegenerateRange { constant: None })?;
        if hi == lo {
            return Err(CompositeError::DegenerateRange { constant: Some(lo) });
        }

        let span = hi - lo;
        // Extreme inputs (e.g. ±1e308) overflow the span; halving keeps the ratio exact enough.
        let scale = |v: f64| -> f64 {
            let u = if span.is_finite() {
                (v - lo) / span
            } else {
                (v * 0.5 - lo * 0.5) / (hi * 0.5 - lo * 0.5)
            };
            u.clamp(0.0, 1.0)
        };

        let fill = self.fill_value;
        let data: DMatrix<f64> = grid.matrix().map(|v| if v.is_finite() { scale(v) } else { fill });
        let stats = NormalizeStats {
            lo,
            hi,
            undefined_cells: grid.undefined_count(),
        };
        debug!(
            "normalized {} grid: lo={lo:.6e} hi={hi:.6e} undefined={}",
            grid.shape(),
            stats.undefined_cells
        );

        Ok((NormalizedGrid::from_matrix_unchecked(data), stats))
    }
}

/// Normalize with the default fill value (0.0).
pub fn normalize(grid: &Grid) -> Result<NormalizedGrid, CompositeError> {
    ChannelNormalizer::default().normalize(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Shape;

    fn ramp(rows: usize, cols: usize, lo: f64, step: f64) -> Grid {
        Grid::from_fn(rows, cols, |r, c| lo + step * (r * cols + c) as f64)
    }

    #[test]
    fn extremes_map_to_zero_and_one() {
        let g = Grid::from_row_major(2, 3, &[-40.0, 12.5, 7.0, 300.0, f64::NAN, -3.0]).unwrap();
        let n = normalize(&g).unwrap();
        assert_eq!(n.get(0, 0), 0.0);
        assert_eq!(n.get(1, 0), 1.0);
        let (min, max) = n.value_range();
        assert!(min >= 0.0 && max <= 1.0);
        assert!(((n.get(0, 1)) - (52.5 / 340.0)).abs() < 1e-12);
    }

    #[test]
    fn undefined_cells_take_fill_value() {
        let g = Grid::from_row_major(1, 4, &[0.0, f64::NAN, 10.0, f64::NEG_INFINITY]).unwrap();
        let normalizer = ChannelNormalizer::new(0.25).unwrap();
        let (n, stats) = normalizer.normalize_with_stats(&g).unwrap();
        assert_eq!(n.get(0, 1), 0.25);
        assert_eq!(n.get(0, 3), 0.25);
        assert_eq!(n.get(0, 2), 1.0);
        assert_eq!(stats.undefined_cells, 2);
        assert_eq!((stats.lo, stats.hi), (0.0, 10.0));
    }

    #[test]
    fn idempotent_on_unit_range_grid() {
        let g = Grid::from_row_major(2, 2, &[0.0, 0.3, 0.7, 1.0]).unwrap();
        let once = normalize(&g).unwrap();
        let twice = normalize(&Grid::new(once.matrix().clone())).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.get(0, 1), 0.3);
    }

    #[test]
    fn constant_grid_is_degenerate() {
        let g = Grid::filled(Shape::new(4, 4), 0.0);
        assert_eq!(
            normalize(&g),
            Err(CompositeError::DegenerateRange { constant: Some(0.0) })
        );
    }

    #[test]
    fn all_undefined_grid_is_degenerate() {
        let g = Grid::filled(Shape::new(3, 2), f64::NAN);
        assert_eq!(normalize(&g), Err(CompositeError::DegenerateRange { constant: None }));
    }

    #[test]
    fn fill_value_outside_unit_interval_is_rejected() {
        assert_eq!(ChannelNormalizer::new(1.5), Err(CompositeError::InvalidFill(1.5)));
        assert!(ChannelNormalizer::new(f64::NAN).is_err());
    }

    #[test]
    fn huge_range_stays_bounded() {
        let g = Grid::from_row_major(1, 3, &[-1e308, 0.0, 1e308]).unwrap();
        let n = normalize(&g).unwrap();
        assert_eq!(n.get(0, 0), 0.0);
        assert_eq!(n.get(0, 2), 1.0);
        assert!((n.get(0, 1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn ramp_is_monotonic_after_scaling() {
        let n = normalize(&ramp(5, 7, -3.0, 0.75)).unwrap();
        let flat: Vec<f64> = (0..5).flat_map(|r| (0..7).map(move |c| (r, c))).map(|(r, c)| n.get(r, c)).collect();
        assert!(flat.windows(2).all(|w| w[0] < w[1]));
    }
}
