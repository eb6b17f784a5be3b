//! Export composites and comparison results.
//!
//! - composite → 8-bit RGB PNG, optional overlay markers
//! - redshift pairs → CSV (easy to consume in spreadsheets or downstream scripts)

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};

use crate::catalog::{Overlay, RedshiftPair};
use crate::domain::{CompositeImage, Origin};
use crate::error::AppError;

/// Marker colour for overlay points.
const MARKER: Rgb<u8> = Rgb([255, 64, 64]);

/// Half-length of a marker arm, in pixels.
const MARKER_ARM: i64 = 2;

/// Quantize a composite into an 8-bit RGB raster.
///
/// With `Origin::Lower` grid row 0 ends up on the bottom image row.
pub fn composite_to_rgb8(image: &CompositeImage, overlay: Option<&Overlay>, origin: Origin) -> RgbImage {
    let shape = image.shape();
    let (width, height) = (shape.cols as u32, shape.rows as u32);
    let to_y = |row: usize| match origin {
        Origin::Lower => (shape.rows - 1 - row) as u32,
        Origin::Upper => row as u32,
    };

    let mut out = RgbImage::new(width, height);
    for row in 0..shape.rows {
        for col in 0..shape.cols {
            let [r, g, b] = image.pixel(row, col);
            out.put_pixel(col as u32, to_y(row), Rgb([quantize(r), quantize(g), quantize(b)]));
        }
    }

    if let Some(overlay) = overlay {
        for p in &overlay.points {
            let col = p.x.round() as i64;
            let row = p.y.round() as i64;
            for d in -MARKER_ARM..=MARKER_ARM {
                for (c, r) in [(col + d, row), (col, row + d)] {
                    if (0..shape.cols as i64).contains(&c) && (0..shape.rows as i64).contains(&r) {
                        out.put_pixel(c as u32, to_y(r as usize), MARKER);
                    }
                }
            }
        }
    }
    out
}

fn quantize(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Write the composite as a PNG file.
pub fn write_composite_png(
    path: &Path,
    image: &CompositeImage,
    overlay: Option<&Overlay>,
    origin: Origin,
) -> Result<(), AppError> {
    composite_to_rgb8(image, overlay, origin)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| AppError::new(4, format!("Failed to write PNG '{}': {e}", path.display())))
}

/// Write redshift pairs to a CSV file.
pub fn write_redshift_pairs_csv(path: &Path, pairs: &[RedshiftPair]) -> Result<(), AppError> {
    let write_err = |e: csv::Error| AppError::new(4, format!("Failed to write CSV '{}': {e}", path.display()));

    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    writer
        .write_record(["line", "id", "z_phot", "z_spec", "delta_z", "scaled_delta_z"])
        .map_err(write_err)?;
    for p in pairs {
        writer
            .write_record([
                p.line.to_string(),
                p.label.clone(),
                format!("{:.6}", p.z_phot),
                format!("{:.6}", p.z_spec),
                format!("{:.6}", p.z_phot - p.z_spec),
                format!("{:.6}", p.scaled_delta()),
            ])
            .map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to write CSV '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OverlayPoint;
    use crate::composite::compose;
    use crate::domain::NormalizedGrid;
    use nalgebra::DMatrix;

    fn gradient_image() -> CompositeImage {
        // red encodes the row index, green is 1 everywhere, blue 0
        let red = NormalizedGrid::try_new(DMatrix::from_fn(3, 4, |r, _| r as f64 / 2.0)).unwrap();
        let green = NormalizedGrid::try_new(DMatrix::from_element(3, 4, 1.0)).unwrap();
        let blue = NormalizedGrid::try_new(DMatrix::from_element(3, 4, 0.0)).unwrap();
        compose(red, green, blue).unwrap()
    }

    #[test]
    fn lower_origin_puts_row_zero_at_bottom() {
        let img = gradient_image();
        let lower = composite_to_rgb8(&img, None, Origin::Lower);
        let upper = composite_to_rgb8(&img, None, Origin::Upper);
        assert_eq!(lower.dimensions(), (4, 3));
        assert_eq!(lower.get_pixel(0, 2).0, [0, 255, 0]);
        assert_eq!(lower.get_pixel(0, 0).0, [255, 255, 0]);
        assert_eq!(upper.get_pixel(0, 0).0, [0, 255, 0]);
        assert_eq!(upper.get_pixel(3, 1).0, [128, 255, 0]);
    }

    #[test]
    fn overlay_markers_are_drawn_and_clipped() {
        let img = gradient_image();
        let overlay = Overlay {
            points: vec![OverlayPoint {
                line: 2,
                label: "a".to_string(),
                x: 0.0,
                y: 0.0,
            }],
            ..Overlay::default()
        };
        let raster = composite_to_rgb8(&img, Some(&overlay), Origin::Upper);
        assert_eq!(*raster.get_pixel(0, 0), MARKER);
        assert_eq!(*raster.get_pixel(2, 0), MARKER);
        assert_eq!(*raster.get_pixel(0, 2), MARKER);
        assert_eq!(raster.get_pixel(3, 0).0, [0, 255, 0]);
    }

    #[test]
    fn png_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("composite.png");
        write_composite_png(&path, &gradient_image(), None, Origin::Lower).unwrap();
        let back = image::open(&path).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (4, 3));
        assert_eq!(back.get_pixel(1, 2).0, [0, 255, 0]);
    }

    #[test]
    fn redshift_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.csv");
        let pairs = vec![RedshiftPair {
            line: 7,
            label: "g7".to_string(),
            z_phot: 1.5,
            z_spec: 1.0,
        }];
        write_redshift_pairs_csv(&path, &pairs).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("line,id,z_phot,z_spec,delta_z,scaled_delta_z"));
        assert_eq!(lines.next(), Some("7,g7,1.500000,1.000000,0.500000,0.250000"));
    }
}
