//! FITS image reading and writing on top of `fitsio-pure`.
//!
//! Block and card parsing, BITPIX decoding, `BSCALE`/`BZERO` and `BLANK`
//! handling all live in the crate. This module only picks the HDU and squeezes
//! it to a 2-D grid:
//! - the first HDU holding image data (primary, or an `IMAGE` extension when
//!   the primary HDU is empty, as in most drizzled HST products)
//! - axes beyond the second must have length 1
//!
//! `NAXIS1` is the fastest-varying axis, so it becomes the grid's column count.

use std::path::Path;

use fitsio_pure::hdu::{parse_fits, Hdu, HduInfo};
use fitsio_pure::image::{
    build_image_hdu, bytes_per_pixel, image_dimensions, read_image_physical, ImageData,
};
use thiserror::Error;

use crate::domain::Grid;

#[derive(Debug, Error)]
pub enum FitsError {
    #[error("FITS decode failed: {0}")]
    Decode(String),
    #[error("image is not two-dimensional (axes {0:?})")]
    NotTwoDimensional(Vec<usize>),
    #[error("image axes {0:?} exceed the addressable size")]
    Oversized(Vec<usize>),
    #[error("data truncated: need {needed} bytes at offset {offset}, file has {len}")]
    Truncated { offset: usize, needed: usize, len: usize },
    #[error("no HDU with 2-D image data")]
    NoImage,
    #[error("FITS I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<fitsio_pure::error::Error> for FitsError {
    fn from(e: fitsio_pure::error::Error) -> Self {
        FitsError::Decode(format!("{e:?}"))
    }
}

/// Decode the first 2-D image in an in-memory FITS file.
pub fn parse_fits_grid(bytes: &[u8]) -> Result<Grid, FitsError> {
    let fits = parse_fits(bytes)?;

    let (hdu, axes) = fits
        .hdus
        .iter()
        .find_map(|hdu| match image_dimensions(hdu) {
            Ok(axes) if !axes.is_empty() => Some((hdu, axes)),
            _ => None,
        })
        .ok_or(FitsError::NoImage)?;

    let (rows, cols) = squeeze_2d(&axes)?;
    check_extent(bytes, hdu, &axes)?;

    let values = read_image_physical(bytes, hdu)?;
    values
        .get(..rows * cols)
        .and_then(|cells| Grid::from_row_major(rows, cols, cells))
        .ok_or(FitsError::NotTwoDimensional(axes))
}

/// `(rows, cols)` of an image whose axes past the second are all 1.
fn squeeze_2d(axes: &[usize]) -> Result<(usize, usize), FitsError> {
    match axes {
        [cols, rows, rest @ ..] if *cols > 0 && *rows > 0 && rest.iter().all(|&n| n == 1) => {
            Ok((*rows, *cols))
        }
        _ => Err(FitsError::NotTwoDimensional(axes.to_vec())),
    }
}

/// Reject headers whose declared data size overflows or runs past the buffer.
fn check_extent(bytes: &[u8], hdu: &Hdu, axes: &[usize]) -> Result<(), FitsError> {
    let oversized = || FitsError::Oversized(axes.to_vec());
    let bitpix = image_bitpix(hdu)?;
    let needed = axes
        .iter()
        .try_fold(bytes_per_pixel(bitpix)?, |acc, &n| acc.checked_mul(n))
        .ok_or_else(oversized)?;
    let end = hdu.data_start.checked_add(needed).ok_or_else(oversized)?;
    if end > bytes.len() {
        return Err(FitsError::Truncated {
            offset: hdu.data_start,
            needed,
            len: bytes.len(),
        });
    }
    Ok(())
}

fn image_bitpix(hdu: &Hdu) -> Result<i64, FitsError> {
    match &hdu.info {
        HduInfo::Primary { bitpix, .. } | HduInfo::Image { bitpix, .. } => Ok(*bitpix),
        _ => Err(FitsError::NoImage),
    }
}

/// Encode a grid as a single-HDU `BITPIX = -32` FITS file.
pub fn encode_fits_f32(grid: &Grid) -> Result<Vec<u8>, FitsError> {
    let shape = grid.shape();
    let mut pixels = Vec::with_capacity(shape.cells());
    for row in 0..shape.rows {
        for col in 0..shape.cols {
            pixels.push(grid.get(row, col) as f32);
        }
    }
    Ok(build_image_hdu(-32, &[shape.cols, shape.rows], &ImageData::F32(pixels))?)
}

/// Write a grid to disk as `BITPIX = -32` FITS.
pub fn write_fits_f32(path: &Path, grid: &Grid) -> Result<(), FitsError> {
    std::fs::write(path, encode_fits_f32(grid)?)?;
    Ok(())
}
