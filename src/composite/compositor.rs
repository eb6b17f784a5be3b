//! Channel stacking.

use log::debug;

use crate::domain::{CompositeImage, NormalizedGrid};
use crate::error::CompositeError;

/// Stack three same-shape normalized grids into a `(rows, cols, 3)` composite.
///
/// No rescaling happens here; each output channel is its input, unchanged.
pub fn compose(red: NormalizedGrid, green: NormalizedGrid, blue: NormalizedGrid) -> Result<CompositeImage, CompositeError> {
    let (r, g, b) = (red.shape(), green.shape(), blue.shape());
    if r != g || g != b {
        return Err(CompositeError::ShapeMismatch {
            red: r,
            green: g,
            blue: b,
        });
    }
    debug!("stacking channels into {g}x3 composite");
    Ok(CompositeImage::from_channels(red, green, blue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Channel, Shape};
    use nalgebra::DMatrix;

    fn grid(rows: usize, cols: usize, seed: usize) -> NormalizedGrid {
        let m = DMatrix::from_fn(rows, cols, |r, c| ((r * 31 + c * 17 + seed * 7) % 101) as f64 / 100.0);
        NormalizedGrid::try_new(m).unwrap()
    }

    #[test]
    fn mismatched_shapes_are_reported() {
        let err = compose(grid(50, 50, 0), grid(60, 60, 1), grid(50, 50, 2)).unwrap_err();
        assert_eq!(
            err,
            CompositeError::ShapeMismatch {
                red: Shape::new(50, 50),
                green: Shape::new(60, 60),
                blue: Shape::new(50, 50),
            }
        );
    }

    #[test]
    fn mismatch_in_last_channel_only_is_reported() {
        assert!(matches!(
            compose(grid(8, 8, 0), grid(8, 8, 1), grid(8, 9, 2)),
            Err(CompositeError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn channels_are_stacked_in_order_without_scaling() {
        let (r, g, b) = (grid(60, 60, 0), grid(60, 60, 1), grid(60, 60, 2));
        let image = compose(r.clone(), g.clone(), b.clone()).unwrap();

        assert_eq!(image.dims(), (60, 60, 3));
        assert_eq!(image.channel(Channel::Red), r.matrix());
        assert_eq!(image.channel(Channel::Green), g.matrix());
        assert_eq!(image.channel(Channel::Blue), b.matrix());
        assert_eq!(image.pixel(3, 5), [r.get(3, 5), g.get(3, 5), b.get(3, 5)]);
        assert_eq!(image.get(59, 0, 2), b.get(59, 0));

        let flat = image.to_interleaved();
        assert_eq!(flat.len(), 60 * 60 * 3);
        assert_eq!(&flat[3..6], &image.pixel(0, 1));
    }
}
