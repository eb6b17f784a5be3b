//! Synthetic deep-field generation.
//!
//! Produces three band images of the same patch of sky plus a matching galaxy
//! catalog. The bands deliberately disagree on pixel grid and units so the
//! compositing pipeline has real work to do:
//! - red/blue on a coarser grid than green
//! - very different gains and offsets per band
//! - a sprinkling of undefined (NaN) pixels
//!
//! Everything is driven by a seeded `StdRng`, so the same config always yields
//! the same files.

use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::catalog::SkyExtent;
use crate::domain::{Channel, Grid, Shape};
use crate::error::AppError;
use crate::io::fits::write_fits_f32;

/// Probability that a galaxy's photometric redshift is a catastrophic failure.
const CATASTROPHIC_PROB: f64 = 0.05;

/// Photo-z scatter in units of `1 + z`.
const PHOTO_Z_SCATTER: f64 = 0.04;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub galaxies: usize,
    pub red_shape: Shape,
    pub green_shape: Shape,
    pub blue_shape: Shape,
    /// Background noise standard deviation (before per-band gain).
    pub noise_sigma: f64,
    /// Fraction of pixels replaced by NaN.
    pub nan_fraction: f64,
    /// Fraction of catalog rows with a blank spectroscopic redshift.
    pub missing_spec_fraction: f64,
    pub extent: SkyExtent,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            galaxies: 40,
            red_shape: Shape::new(40, 50),
            green_shape: Shape::new(60, 60),
            blue_shape: Shape::new(40, 50),
            noise_sigma: 0.02,
            nan_fraction: 0.01,
            missing_spec_fraction: 0.2,
            // A patch around the Hubble Ultra Deep Field.
            extent: SkyExtent {
                ra_min: 53.13,
                ra_max: 53.19,
                dec_min: -27.82,
                dec_max: -27.77,
            },
        }
    }
}

/// One generated galaxy.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticGalaxy {
    pub seq: usize,
    pub ra: f64,
    pub dec: f64,
    /// Peak brightness per band (red, green, blue), before gain.
    pub flux: [f64; 3],
    /// Gaussian width as a fraction of the image width.
    pub size: f64,
    pub z_spec: Option<f64>,
    pub z_phot: f64,
}

#[derive(Debug, Clone)]
pub struct SyntheticField {
    pub red: Grid,
    pub green: Grid,
    pub blue: Grid,
    pub galaxies: Vec<SyntheticGalaxy>,
    pub extent: SkyExtent,
}

impl SyntheticField {
    pub fn grid(&self, channel: Channel) -> &Grid {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }
}

/// Per-band `(gain, offset)`: each band lives in its own units.
fn band_scale(channel: Channel) -> (f64, f64) {
    match channel {
        Channel::Red => (850.0, 120.0),
        Channel::Green => (1.0, 0.0),
        Channel::Blue => (0.004, -0.001),
    }
}

pub fn generate_field(config: &SyntheticConfig) -> Result<SyntheticField, AppError> {
    for (channel, shape) in [
        (Channel::Red, config.red_shape),
        (Channel::Green, config.green_shape),
        (Channel::Blue, config.blue_shape),
    ] {
        if !shape.is_valid() {
            return Err(AppError::new(2, format!("Invalid {channel} shape {shape}.")));
        }
    }
    if !(config.noise_sigma.is_finite() && config.noise_sigma >= 0.0) {
        return Err(AppError::new(2, "Noise sigma must be finite and >= 0."));
    }
    if !(0.0..1.0).contains(&config.nan_fraction) || !(0.0..=1.0).contains(&config.missing_spec_fraction) {
        return Err(AppError::new(2, "Fractions must lie in [0, 1)."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let galaxies = generate_galaxies(&mut rng, config)?;

    let noise = Normal::new(0.0, config.noise_sigma.max(f64::MIN_POSITIVE))
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut render = |channel: Channel, shape: Shape| {
        let (gain, offset) = band_scale(channel);
        let clean = render_band(&galaxies, channel, shape, &config.extent);
        Grid::from_fn(shape.rows, shape.cols, |row, col| {
            if rng.gen_bool(config.nan_fraction) {
                return f64::NAN;
            }
            let sky = clean[row * shape.cols + col] + noise.sample(&mut rng);
            sky * gain + offset
        })
    };

    let red = render(Channel::Red, config.red_shape);
    let green = render(Channel::Green, config.green_shape);
    let blue = render(Channel::Blue, config.blue_shape);

    Ok(SyntheticField {
        red,
        green,
        blue,
        galaxies,
        extent: config.extent,
    })
}

fn generate_galaxies(rng: &mut StdRng, config: &SyntheticConfig) -> Result<Vec<SyntheticGalaxy>, AppError> {
    let unit = Normal::new(0.0, 1.0).map_err(|e| AppError::new(4, format!("Photo-z distribution error: {e}")))?;
    let ext = &config.extent;

    let galaxies = (0..config.galaxies)
        .map(|i| {
            let ra = rng.gen_range(ext.ra_min..=ext.ra_max);
            let dec = rng.gen_range(ext.dec_min..=ext.dec_max);
            let z: f64 = rng.gen_range(0.1..4.0);

            // Higher redshift -> fainter and redder.
            let brightness = rng.gen_range(0.3..1.0) / (1.0 + 0.5 * z);
            let redness = (z / 4.0).clamp(0.0, 1.0);
            let flux = [
                brightness * (0.4 + 0.6 * redness),
                brightness * 0.7,
                brightness * (1.0 - 0.7 * redness),
            ];

            let z_phot = if rng.gen_bool(CATASTROPHIC_PROB) {
                rng.gen_range(0.05..4.5)
            } else {
                (z + PHOTO_Z_SCATTER * (1.0 + z) * unit.sample(&mut *rng)).max(0.0)
            };
            let z_spec = (!rng.gen_bool(config.missing_spec_fraction)).then_some(z);

            SyntheticGalaxy {
                seq: i + 1,
                ra,
                dec,
                flux,
                size: rng.gen_range(0.01..0.035),
                z_spec,
                z_phot,
            }
        })
        .collect();
    Ok(galaxies)
}

/// Noise-free row-major band image.
fn render_band(galaxies: &[SyntheticGalaxy], channel: Channel, shape: Shape, extent: &SkyExtent) -> Vec<f64> {
    let mut pixels = vec![0.0; shape.cells()];
    for g in galaxies {
        let (cx, cy) = extent.to_pixel(g.ra, g.dec, shape);
        let sigma = (g.size * shape.cols as f64).max(0.5);
        let peak = g.flux[channel.index()];
        for row in 0..shape.rows {
            for col in 0..shape.cols {
                let dx = col as f64 - cx;
                let dy = row as f64 - cy;
                pixels[row * shape.cols + col] += peak * (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp();
            }
        }
    }
    pixels
}

/// Paths written by `write_demo`.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoFiles {
    pub red: PathBuf,
    pub green: PathBuf,
    pub blue: PathBuf,
    pub catalog: PathBuf,
}

/// Write the three bands as FITS plus the catalog CSV into `dir`.
pub fn write_demo(dir: &Path, field: &SyntheticField) -> Result<DemoFiles, AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", dir.display())))?;

    let files = DemoFiles {
        red: dir.join("red.fits"),
        green: dir.join("green.fits"),
        blue: dir.join("blue.fits"),
        catalog: dir.join("catalog.csv"),
    };
    for (channel, path) in [
        (Channel::Red, &files.red),
        (Channel::Green, &files.green),
        (Channel::Blue, &files.blue),
    ] {
        write_fits_f32(path, field.grid(channel))
            .map_err(|e| AppError::new(4, format!("Failed to write '{}': {e}", path.display())))?;
    }
    write_catalog_csv(&files.catalog, &field.galaxies)?;
    Ok(files)
}

fn write_catalog_csv(path: &Path, galaxies: &[SyntheticGalaxy]) -> Result<(), AppError> {
    let write_err = |e: csv::Error| AppError::new(4, format!("Failed to write '{}': {e}", path.display()));

    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    writer
        .write_record(["Seq", "RAJ2000", "DEJ2000", "Photometric_Redshift", "Spectroscopic_Redshift"])
        .map_err(write_err)?;
    for g in galaxies {
        writer
            .write_record([
                g.seq.to_string(),
                format!("{:.6}", g.ra),
                format!("{:.6}", g.dec),
                format!("{:.4}", g.z_phot),
                g.z_spec.map(|z| format!("{z:.4}")).unwrap_or_default(),
            ])
            .map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to write '{}': {e}", path.display())))
}
