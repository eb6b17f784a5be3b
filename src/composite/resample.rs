//! Grid resampling onto a target shape.
//!
//! Steps, per call:
//!
//! 1. optional Gaussian pre-smoothing on axes that shrink (anti-aliasing)
//! 2. separable interpolation at pixel-centre aligned coordinates, mirror boundaries
//! 3. clamp to the source value range
//!
//! Step 3 is a no-op for the convex kernels (nearest, bilinear, Gaussian) and
//! removes the overshoot of the cubic kernel, so the output is always a valid
//! `NormalizedGrid`.

use log::debug;
use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::domain::{Interpolation, NormalizedGrid, Shape};
use crate::error::CompositeError;
use crate::math::{Taps, anti_alias_sigma, axis_taps, gaussian_smooth};

/// Resamples normalized grids with a fixed kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridResampler {
    pub interpolation: Interpolation,
    pub anti_alias: bool,
}

impl Default for GridResampler {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Bilinear,
            anti_alias: true,
        }
    }
}

impl GridResampler {
    pub fn new(interpolation: Interpolation, anti_alias: bool) -> Self {
        Self {
            interpolation,
            anti_alias,
        }
    }

    /// Resample `grid` to exactly `target`.
    pub fn resample(&self, grid: &NormalizedGrid, target: Shape) -> Result<NormalizedGrid, CompositeError> {
        if !target.is_valid() {
            return Err(CompositeError::InvalidShape {
                rows: target.rows,
                cols: target.cols,
            });
        }
        let src = grid.shape();
        if !src.is_valid() {
            return Err(CompositeError::InvalidShape {
                rows: src.rows,
                cols: src.cols,
            });
        }
        if src == target {
            return Ok(grid.clone());
        }

        let (lo, hi) = grid.value_range();

        let sigma_rows = if self.anti_alias { anti_alias_sigma(src.rows, target.rows) } else { 0.0 };
        let sigma_cols = if self.anti_alias { anti_alias_sigma(src.cols, target.cols) } else { 0.0 };
        let smoothed;
        let source: &DMatrix<f64> = if sigma_rows > 0.0 || sigma_cols > 0.0 {
            smoothed = gaussian_smooth(grid.matrix(), sigma_rows, sigma_cols);
            &smoothed
        } else {
            grid.matrix()
        };

        let row_taps = axis_taps(src.rows, target.rows, self.interpolation);
        let col_taps = axis_taps(src.cols, target.cols, self.interpolation);

        let rows: Vec<Vec<f64>> = row_taps
            .par_iter()
            .map(|rt| {
                col_taps
                    .iter()
                    .map(|ct| sample(source, rt, ct).clamp(lo, hi))
                    .collect()
            })
            .collect();

        debug!(
            "resampled {src} -> {target} ({:?}, sigma rows={sigma_rows:.3} cols={sigma_cols:.3})",
            self.interpolation
        );

        let data = DMatrix::from_fn(target.rows, target.cols, |r, c| rows[r][c]);
        Ok(NormalizedGrid::from_matrix_unchecked(data))
    }
}

fn sample(source: &DMatrix<f64>, row_taps: &Taps, col_taps: &Taps) -> f64 {
    row_taps
        .iter()
        .map(|&(r, wr)| {
            let inner: f64 = col_taps.iter().map(|&(c, wc)| wc * source[(r, c)]).sum();
            wr * inner
        })
        .sum()
}

/// Resample with the default bilinear, anti-aliased kernel.
pub fn resample(grid: &NormalizedGrid, target: Shape) -> Result<NormalizedGrid, CompositeError> {
    GridResampler::default().resample(grid, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::normalize;
    use crate::domain::Grid;

    fn checker(rows: usize, cols: usize) -> NormalizedGrid {
        let g = Grid::from_fn(rows, cols, |r, c| ((r * 7 + c * 3) % 11) as f64);
        normalize(&g).unwrap()
    }

    const KERNELS: [Interpolation; 3] = [Interpolation::Nearest, Interpolation::Bilinear, Interpolation::Bicubic];

    #[test]
    fn identity_resample_returns_input() {
        let g = checker(9, 13);
        for kernel in KERNELS {
            let out = GridResampler::new(kernel, true).resample(&g, g.shape()).unwrap();
            assert_eq!(out, g);
        }
    }

    #[test]
    fn output_shape_matches_target_for_mixed_scale_factors() {
        let g = checker(40, 50);
        let targets = [
            Shape::new(60, 60),
            Shape::new(20, 75),
            Shape::new(1, 1),
            Shape::new(40, 7),
            Shape::new(123, 3),
        ];
        for kernel in KERNELS {
            for target in targets {
                let out = GridResampler::new(kernel, true).resample(&g, target).unwrap();
                assert_eq!(out.shape(), target);
            }
        }
    }

    #[test]
    fn values_stay_within_source_range() {
        // Sharp step edges are where a cubic kernel overshoots.
        let g = Grid::from_fn(16, 16, |r, c| if (r / 4 + c / 4) % 2 == 0 { 0.2 } else { 0.9 });
        let g = NormalizedGrid::try_new(g.matrix().clone()).unwrap();
        for kernel in KERNELS {
            for anti_alias in [true, false] {
                let resampler = GridResampler::new(kernel, anti_alias);
                for target in [Shape::new(37, 29), Shape::new(5, 9)] {
                    let out = resampler.resample(&g, target).unwrap();
                    let (lo, hi) = out.value_range();
                    assert!(lo >= 0.2 - 1e-12 && hi <= 0.9 + 1e-12, "{kernel:?}: [{lo}, {hi}]");
                }
            }
        }
    }

    #[test]
    fn bilinear_upsample_of_linear_ramp_is_linear_inside() {
        // Columns 0..4 hold 0, 1/3, 2/3, 1; doubling the width samples half-way points.
        let g = Grid::from_fn(1, 4, |_, c| c as f64);
        let g = normalize(&g).unwrap();
        let out = GridResampler::new(Interpolation::Bilinear, false)
            .resample(&g, Shape::new(1, 8))
            .unwrap();
        // dst 1 -> src 0.25, dst 2 -> src 0.75
        assert!((out.get(0, 1) - 0.25 / 3.0).abs() < 1e-12);
        assert!((out.get(0, 2) - 0.75 / 3.0).abs() < 1e-12);
        // dst 0 -> src -0.25, mirrored onto 0.25
        assert!((out.get(0, 0) - 0.25 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn constant_grid_stays_constant() {
        let g = NormalizedGrid::try_new(DMatrix::from_element(10, 6, 0.4)).unwrap();
        for kernel in KERNELS {
            let out = GridResampler::new(kernel, true).resample(&g, Shape::new(3, 17)).unwrap();
            assert!(out.matrix().iter().all(|v| (v - 0.4).abs() < 1e-12));
        }
    }

    #[test]
    fn zero_dimension_target_is_rejected() {
        let g = checker(4, 4);
        assert_eq!(
            resample(&g, Shape::new(0, 5)),
            Err(CompositeError::InvalidShape { rows: 0, cols: 5 })
        );
        assert_eq!(
            resample(&g, Shape::new(5, 0)),
            Err(CompositeError::InvalidShape { rows: 5, cols: 0 })
        );
    }
}
