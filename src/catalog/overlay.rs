//! Sky → pixel projection of catalog positions onto a composite.
//!
//! The projection is linear over a `SkyExtent`:
//! - RA decreases to the right (east-left, as on the sky), so `ra_max` lands on column 0
//! - Dec increases with the row index, so `dec_min` lands on row 0 (lower origin)
//!
//! Pixel coordinates are fractional and refer to pixel centres, so the extent's
//! corners map onto the centres of the corner pixels.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::{CatalogRow, CompositeImage, Shape};

/// Rectangular RA/Dec window (degrees) covered by the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyExtent {
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
}

/// Padding applied around a derived extent whose span would otherwise be zero (1 arcsec).
const MIN_SPAN_DEG: f64 = 1.0 / 3600.0;

impl SkyExtent {
    /// Returns `None` unless both spans are finite and positive.
    pub fn new(ra_min: f64, ra_max: f64, dec_min: f64, dec_max: f64) -> Option<Self> {
        let ok = [ra_min, ra_max, dec_min, dec_max].iter().all(|v| v.is_finite())
            && ra_max > ra_min
            && dec_max > dec_min;
        ok.then_some(Self {
            ra_min,
            ra_max,
            dec_min,
            dec_max,
        })
    }

    /// Bounding box of the rows' positions, or `None` when no row has one.
    pub fn from_rows(rows: &[CatalogRow]) -> Option<Self> {
        let mut positions = rows.iter().filter_map(CatalogRow::position);
        let (ra0, dec0) = positions.next()?;
        let (mut ra_min, mut ra_max, mut dec_min, mut dec_max) = (ra0, ra0, dec0, dec0);
        for (ra, dec) in positions {
            ra_min = ra_min.min(ra);
            ra_max = ra_max.max(ra);
            dec_min = dec_min.min(dec);
            dec_max = dec_max.max(dec);
        }
        if ra_max - ra_min < MIN_SPAN_DEG {
            ra_min -= MIN_SPAN_DEG / 2.0;
            ra_max += MIN_SPAN_DEG / 2.0;
        }
        if dec_max - dec_min < MIN_SPAN_DEG {
            dec_min -= MIN_SPAN_DEG / 2.0;
            dec_max += MIN_SPAN_DEG / 2.0;
        }
        Self::new(ra_min, ra_max, dec_min, dec_max)
    }

    pub fn contains(&self, ra: f64, dec: f64) -> bool {
        (self.ra_min..=self.ra_max).contains(&ra) && (self.dec_min..=self.dec_max).contains(&dec)
    }

    /// `(x, y)` = `(column, row)` for a position inside the extent.
    pub fn to_pixel(&self, ra: f64, dec: f64, shape: Shape) -> (f64, f64) {
        let u = (self.ra_max - ra) / (self.ra_max - self.ra_min);
        let v = (dec - self.dec_min) / (self.dec_max - self.dec_min);
        let x = u * (shape.cols.saturating_sub(1)) as f64;
        let y = v * (shape.rows.saturating_sub(1)) as f64;
        (x, y)
    }
}

/// One catalog object placed on the composite.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPoint {
    pub line: usize,
    pub label: String,
    /// Column coordinate.
    pub x: f64,
    /// Row coordinate (row 0 = first grid row).
    pub y: f64,
}

/// Projection result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Overlay {
    pub points: Vec<OverlayPoint>,
    /// Rows without RA or Dec.
    pub excluded: usize,
    /// Rows with a position outside the extent.
    pub outside: usize,
    pub extent: Option<SkyExtent>,
}

/// Project catalog rows onto the composite's pixel grid.
///
/// Without an explicit `extent` the bounding box of the rows is used.
pub fn project(image: &CompositeImage, rows: &[CatalogRow], extent: Option<SkyExtent>) -> Overlay {
    let shape = image.shape();
    let extent = extent.or_else(|| SkyExtent::from_rows(rows));
    let mut overlay = Overlay {
        extent,
        ..Overlay::default()
    };

    for row in rows {
        let Some((ra, dec)) = row.position() else {
            overlay.excluded += 1;
            continue;
        };
        let Some(ext) = extent else {
            overlay.outside += 1;
            continue;
        };
        if !ext.contains(ra, dec) {
            overlay.outside += 1;
            continue;
        }
        let (x, y) = ext.to_pixel(ra, dec, shape);
        overlay.points.push(OverlayPoint {
            line: row.line,
            label: row.label(),
            x,
            y,
        });
    }

    debug!(
        "overlay: {} points on {shape}, {} without position, {} outside extent",
        overlay.points.len(),
        overlay.excluded,
        overlay.outside
    );
    overlay
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::compose;
    use crate::domain::NormalizedGrid;
    use nalgebra::DMatrix;

    fn image(rows: usize, cols: usize) -> CompositeImage {
        let g = || NormalizedGrid::try_new(DMatrix::from_element(rows, cols, 0.5)).unwrap();
        compose(g(), g(), g()).unwrap()
    }

    fn row(line: usize, ra: Option<f64>, dec: Option<f64>) -> CatalogRow {
        CatalogRow {
            line,
            ra,
            dec,
            ..CatalogRow::default()
        }
    }

    #[test]
    fn extent_corners_land_on_corner_pixels_with_ra_increasing_left() {
        let img = image(11, 21);
        let ext = SkyExtent::new(53.0, 53.2, -27.9, -27.7).unwrap();
        let rows = vec![
            row(2, Some(53.2), Some(-27.9)),
            row(3, Some(53.0), Some(-27.7)),
            row(4, Some(53.1), Some(-27.8)),
        ];
        let overlay = project(&img, &rows, Some(ext));
        assert_eq!(overlay.points.len(), 3);

        let p = &overlay.points;
        assert!(p[0].x.abs() < 1e-9 && p[0].y.abs() < 1e-9);
        assert!((p[1].x - 20.0).abs() < 1e-9 && (p[1].y - 10.0).abs() < 1e-9);
        assert!((p[2].x - 10.0).abs() < 1e-9 && (p[2].y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn rows_without_position_or_outside_are_counted() {
        let img = image(10, 10);
        let ext = SkyExtent::new(0.0, 1.0, 0.0, 1.0).unwrap();
        let rows = vec![
            row(2, Some(0.5), Some(0.5)),
            row(3, None, Some(0.5)),
            row(4, Some(2.0), Some(0.5)),
        ];
        let overlay = project(&img, &rows, Some(ext));
        assert_eq!(overlay.points.len(), 1);
        assert_eq!(overlay.excluded, 1);
        assert_eq!(overlay.outside, 1);
        assert_eq!(overlay.points[0].label, "line 2");
    }

    #[test]
    fn derived_extent_covers_all_positions() {
        let rows = vec![row(2, Some(10.0), Some(-5.0)), row(3, Some(12.0), Some(-3.0))];
        let ext = SkyExtent::from_rows(&rows).unwrap();
        assert_eq!(ext, SkyExtent::new(10.0, 12.0, -5.0, -3.0).unwrap());

        let single = SkyExtent::from_rows(&rows[..1]).unwrap();
        assert!(single.contains(10.0, -5.0));
        assert!(SkyExtent::from_rows(&[row(2, None, None)]).is_none());
    }

    #[test]
    fn invalid_extent_is_rejected() {
        assert!(SkyExtent::new(1.0, 1.0, 0.0, 1.0).is_none());
        assert!(SkyExtent::new(0.0, 1.0, f64::NAN, 1.0).is_none());
    }
}
