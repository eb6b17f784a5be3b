//! Separable interpolation and smoothing kernels.
//!
//! Everything here works one axis at a time: for each output index we compute a
//! small list of `(source index, weight)` taps. A 2-D resample is then the outer
//! product of a row tap list and a column tap list.
//!
//! Boundary handling is mirror reflection about the edge samples
//! (`d c b | a b c d | c b a`), so no tap ever reads outside the source.

use nalgebra::DMatrix;

use crate::domain::Interpolation;

/// Gaussian kernels are truncated at this many standard deviations.
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// `(source index, weight)` pairs contributing to one output sample.
pub type Taps = Vec<(usize, f64)>;

/// Reflect an arbitrary integer index into `0..n` (mirror, edge not repeated).
pub fn mirror_index(i: isize, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let m = i.rem_euclid(period);
    if m >= n as isize {
        (period - m) as usize
    } else {
        m as usize
    }
}

/// Source coordinate sampled by output index `dst` when mapping `n_in` samples onto `n_out`.
///
/// Pixel centres are aligned, so equal sizes map every index onto itself.
pub fn source_coordinate(dst: usize, n_in: usize, n_out: usize) -> f64 {
    let scale = n_in as f64 / n_out as f64;
    (dst as f64 + 0.5) * scale - 0.5
}

/// Tap lists for every output index along one axis.
pub fn axis_taps(n_in: usize, n_out: usize, kernel: Interpolation) -> Vec<Taps> {
    (0..n_out)
        .map(|dst| {
            let x = source_coordinate(dst, n_in, n_out);
            match kernel {
                Interpolation::Nearest => nearest_taps(x, n_in),
                Interpolation::Bilinear => linear_taps(x, n_in),
                Interpolation::Bicubic => cubic_taps(x, n_in),
            }
        })
        .collect()
}

fn nearest_taps(x: f64, n: usize) -> Taps {
    vec![(mirror_index(x.round() as isize, n), 1.0)]
}

fn linear_taps(x: f64, n: usize) -> Taps {
    let x0 = x.floor();
    let t = x - x0;
    let i0 = x0 as isize;
    if t == 0.0 {
        return vec![(mirror_index(i0, n), 1.0)];
    }
    vec![(mirror_index(i0, n), 1.0 - t), (mirror_index(i0 + 1, n), t)]
}

fn cubic_taps(x: f64, n: usize) -> Taps {
    let x1 = x.floor();
    let t = x - x1;
    let i1 = x1 as isize;
    if t == 0.0 {
        return vec![(mirror_index(i1, n), 1.0)];
    }
    (-1..=2)
        .map(|k| {
            let d = (t - k as f64).abs();
            (mirror_index(i1 + k, n), keys_weight(d))
        })
        .collect()
}

/// Keys cubic convolution weight with `a = -0.5`.
fn keys_weight(d: f64) -> f64 {
    const A: f64 = -0.5;
    if d <= 1.0 {
        (A + 2.0) * d.powi(3) - (A + 3.0) * d.powi(2) + 1.0
    } else if d < 2.0 {
        A * d.powi(3) - 5.0 * A * d.powi(2) + 8.0 * A * d - 4.0 * A
    } else {
        0.0
    }
}

/// Normalized 1-D Gaussian kernel (odd length, centre at `len / 2`).
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return vec![1.0];
    }
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as isize;
    let mut weights: Vec<f64> = (-radius..=radius)
        .map(|k| (-0.5 * (k as f64 / sigma).powi(2)).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Smooth rows and/or columns with independent Gaussian widths (mirror boundaries).
///
/// A sigma of zero leaves that axis untouched.
pub fn gaussian_smooth(src: &DMatrix<f64>, sigma_rows: f64, sigma_cols: f64) -> DMatrix<f64> {
    let mut out = src.clone();
    if sigma_rows > 0.0 {
        out = convolve_rows(&out, &gaussian_kernel(sigma_rows));
    }
    if sigma_cols > 0.0 {
        out = convolve_cols(&out, &gaussian_kernel(sigma_cols));
    }
    out
}

/// Convolve along the row index (vertical direction).
fn convolve_rows(src: &DMatrix<f64>, kernel: &[f64]) -> DMatrix<f64> {
    let r = (kernel.len() / 2) as isize;
    let n = src.nrows();
    DMatrix::from_fn(n, src.ncols(), |row, col| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * src[(mirror_index(row as isize + k as isize - r, n), col)])
            .sum()
    })
}

/// Convolve along the column index (horizontal direction).
fn convolve_cols(src: &DMatrix<f64>, kernel: &[f64]) -> DMatrix<f64> {
    let r = (kernel.len() / 2) as isize;
    let n = src.ncols();
    DMatrix::from_fn(src.nrows(), n, |row, col| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * src[(row, mirror_index(col as isize + k as isize - r, n))])
            .sum()
    })
}

/// Anti-aliasing width for an axis shrunk from `n_in` to `n_out` samples.
pub fn anti_alias_sigma(n_in: usize, n_out: usize) -> f64 {
    let factor = n_in as f64 / n_out as f64;
    ((factor - 1.0) / 2.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_index_reflects_without_repeating_edge() {
        // n = 4: ... 2 1 | 0 1 2 3 | 2 1 0 ...
        let got: Vec<usize> = (-3..=6).map(|i| mirror_index(i, 4)).collect();
        assert_eq!(got, vec![3, 2, 1, 0, 1, 2, 3, 2, 1, 0]);
        assert_eq!(mirror_index(-5, 1), 0);
    }

    #[test]
    fn equal_sizes_map_onto_integer_coordinates() {
        for dst in 0..7 {
            assert!((source_coordinate(dst, 7, 7) - dst as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn tap_weights_sum_to_one() {
        for kernel in [Interpolation::Nearest, Interpolation::Bilinear, Interpolation::Bicubic] {
            for taps in axis_taps(5, 13, kernel) {
                let sum: f64 = taps.iter().map(|(_, w)| w).sum();
                assert!((sum - 1.0).abs() < 1e-12, "{kernel:?}: {sum}");
                assert!(taps.iter().all(|(i, _)| *i < 5));
            }
        }
    }

    #[test]
    fn gaussian_kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(1.5);
        assert_eq!(k.len() % 2, 1);
        let sum: f64 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        for i in 0..k.len() / 2 {
            assert!((k[i] - k[k.len() - 1 - i]).abs() < 1e-15);
        }
        assert_eq!(gaussian_kernel(0.0), vec![1.0]);
    }

    #[test]
    fn smoothing_keeps_constant_grid_constant() {
        let m = DMatrix::from_element(6, 9, 0.25);
        let s = gaussian_smooth(&m, 1.2, 0.7);
        assert!(s.iter().all(|v| (v - 0.25).abs() < 1e-12));
    }

    #[test]
    fn anti_alias_sigma_only_when_shrinking() {
        assert_eq!(anti_alias_sigma(40, 60), 0.0);
        assert_eq!(anti_alias_sigma(60, 60), 0.0);
        assert!((anti_alias_sigma(90, 30) - 1.0).abs() < 1e-12);
    }
}
