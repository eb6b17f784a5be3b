//! Grid containers.
//!
//! All three are thin wrappers over `nalgebra::DMatrix<f64>` indexed as
//! `(row, col)`. The wrappers exist to carry invariants in the type:
//!
//! - `Grid`: anything a loader produced (may contain NaN / ±Inf)
//! - `NormalizedGrid`: every value finite and inside [0, 1]
//! - `CompositeImage`: three normalized channels of identical shape

use nalgebra::DMatrix;

use crate::domain::{Channel, Shape};

/// Raw 2-D samples from a loader.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    data: DMatrix<f64>,
}

impl Grid {
    pub fn new(data: DMatrix<f64>) -> Self {
        Self { data }
    }

    /// Build a grid from row-major samples. Returns `None` if the length does not match.
    pub fn from_row_major(rows: usize, cols: usize, values: &[f64]) -> Option<Self> {
        if rows.checked_mul(cols)? != values.len() {
            return None;
        }
        Some(Self::new(DMatrix::from_row_slice(rows, cols, values)))
    }

    pub fn from_fn(rows: usize, cols: usize, f: impl FnMut(usize, usize) -> f64) -> Self {
        Self::new(DMatrix::from_fn(rows, cols, f))
    }

    pub fn filled(shape: Shape, value: f64) -> Self {
        Self::new(DMatrix::from_element(shape.rows, shape.cols, value))
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.data.nrows(), self.data.ncols())
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// `(min, max)` over finite samples, or `None` if there are none.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in self.data.iter().filter(|v| v.is_finite()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if lo <= hi { Some((lo, hi)) } else { None }
    }

    /// Number of non-finite samples.
    pub fn undefined_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_finite()).count()
    }
}

/// A grid whose every value is finite and lies in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedGrid {
    data: DMatrix<f64>,
}

impl NormalizedGrid {
    /// Wrap a matrix after checking the [0, 1] invariant.
    pub fn try_new(data: DMatrix<f64>) -> Option<Self> {
        data.iter()
            .all(|v| (0.0..=1.0).contains(v))
            .then_some(Self { data })
    }

    /// Caller guarantees the invariant.
    pub(crate) fn from_matrix_unchecked(data: DMatrix<f64>) -> Self {
        debug_assert!(data.iter().all(|v| (0.0..=1.0).contains(v)));
        Self { data }
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.data.nrows(), self.data.ncols())
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    pub fn into_matrix(self) -> DMatrix<f64> {
        self.data
    }

    /// `(min, max)` of the stored values; `(0, 0)` for an empty grid.
    pub fn value_range(&self) -> (f64, f64) {
        if self.data.is_empty() {
            return (0.0, 0.0);
        }
        (self.data.min(), self.data.max())
    }
}

/// `rows × cols × 3` image in (red, green, blue) order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeImage {
    channels: [DMatrix<f64>; 3],
}

impl CompositeImage {
    /// Only the compositor builds composites; it has already checked the shapes.
    pub(crate) fn from_channels(red: NormalizedGrid, green: NormalizedGrid, blue: NormalizedGrid) -> Self {
        Self {
            channels: [red.into_matrix(), green.into_matrix(), blue.into_matrix()],
        }
    }

    /// Spatial shape shared by all channels.
    pub fn shape(&self) -> Shape {
        Shape::new(self.channels[0].nrows(), self.channels[0].ncols())
    }

    /// Full tensor dimensions `(rows, cols, 3)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        let s = self.shape();
        (s.rows, s.cols, 3)
    }

    pub fn channel(&self, channel: Channel) -> &DMatrix<f64> {
        &self.channels[channel.index()]
    }

    /// Element at `(row, col, k)`, `k` in 0..3.
    pub fn get(&self, row: usize, col: usize, k: usize) -> f64 {
        self.channels[k][(row, col)]
    }

    pub fn pixel(&self, row: usize, col: usize) -> [f64; 3] {
        [
            self.channels[0][(row, col)],
            self.channels[1][(row, col)],
            self.channels[2][(row, col)],
        ]
    }

    /// Row-major, channel-last samples (`[r, g, b, r, g, b, ...]`).
    pub fn to_interleaved(&self) -> Vec<f64> {
        let s = self.shape();
        let mut out = Vec::with_capacity(s.cells() * 3);
        for row in 0..s.rows {
            for col in 0..s.cols {
                out.extend_from_slice(&self.pixel(row, col));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_row_major_checks_length() {
        assert!(Grid::from_row_major(2, 3, &[0.0; 5]).is_none());
        let g = Grid::from_row_major(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(g.shape(), Shape::new(2, 3));
        assert_eq!(g.get(1, 0), 4.0);
        assert_eq!(g.get(0, 2), 3.0);
    }

    #[test]
    fn finite_range_skips_undefined() {
        let g = Grid::from_row_major(1, 4, &[f64::NAN, 3.0, f64::INFINITY, -1.0]).unwrap();
        assert_eq!(g.finite_range(), Some((-1.0, 3.0)));
        assert_eq!(g.undefined_count(), 2);

        let empty = Grid::filled(Shape::new(2, 2), f64::NAN);
        assert_eq!(empty.finite_range(), None);
    }

    #[test]
    fn normalized_grid_rejects_out_of_range() {
        assert!(NormalizedGrid::try_new(DMatrix::from_element(2, 2, 1.5)).is_none());
        assert!(NormalizedGrid::try_new(DMatrix::from_element(2, 2, f64::NAN)).is_none());
        assert!(NormalizedGrid::try_new(DMatrix::from_element(2, 2, 0.5)).is_some());
    }
}
