//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between pipeline stages
//! - exported to JSON (run summaries)
//! - parsed straight from CLI flags (`ValueEnum`)

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One of the three wavelength channels of a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// Composite channel order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Position of this channel along the composite's trailing axis.
    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Configure,
    Load,
    Normalize,
    Resample,
    Compose,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Configure => "configure",
            Stage::Load => "load",
            Stage::Normalize => "normalize",
            Stage::Resample => "resample",
            Stage::Compose => "compose",
        };
        f.write_str(s)
    }
}

/// Grid resolution as `(rows, cols)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// A shape is usable as a resampling target when neither dimension is zero.
    pub fn is_valid(self) -> bool {
        self.rows >= 1 && self.cols >= 1
    }

    pub fn cells(self) -> usize {
        self.rows * self.cols
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Interpolation kernel used when resampling a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Nearest sample (order 0).
    Nearest,
    /// Bilinear (order 1).
    Bilinear,
    /// Keys cubic convolution (a = -0.5), clamped to the source range.
    Bicubic,
}

/// Which grid row is drawn at the top of an exported image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Row 0 at the bottom (FITS / sky convention).
    Lower,
    /// Row 0 at the top (raster convention).
    Upper,
}

/// How histogram bin edges are chosen for the two redshift series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HistogramBinning {
    /// Each series spans its own [min, max].
    Independent,
    /// Both series share the union range, so bins line up.
    Shared,
}

/// Source identifiers for the three channels, as understood by a `GridLoader`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSources {
    pub red: String,
    pub green: String,
    pub blue: String,
}

impl ChannelSources {
    pub fn new(red: impl Into<String>, green: impl Into<String>, blue: impl Into<String>) -> Self {
        Self {
            red: red.into(),
            green: green.into(),
            blue: blue.into(),
        }
    }

    pub fn get(&self, channel: Channel) -> &str {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }
}

/// Compositing configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeConfig {
    /// Channel whose (normalized) shape becomes the target shape.
    pub reference: Channel,
    /// Explicit target shape; overrides `reference` when set.
    pub target_shape: Option<Shape>,
    /// Value written into undefined (non-finite) cells. Must lie in [0, 1].
    pub fill_value: f64,
    pub interpolation: Interpolation,
    /// Gaussian pre-smoothing on downsampled axes.
    pub anti_alias: bool,
    /// Load and normalize the three channels concurrently.
    pub parallel: bool,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            reference: Channel::Green,
            target_shape: None,
            fill_value: 0.0,
            interpolation: Interpolation::Bilinear,
            anti_alias: true,
            parallel: true,
        }
    }
}

/// Catalog column names.
///
/// Matching against the CSV header is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub ra_column: String,
    pub dec_column: String,
    pub phot_column: String,
    pub spec_column: String,
    /// Identifier column; when `None` the first of `id`, `seq`, `name` present is used.
    pub id_column: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            ra_column: "RAJ2000".to_string(),
            dec_column: "DEJ2000".to_string(),
            phot_column: "Photometric_Redshift".to_string(),
            spec_column: "Spectroscopic_Redshift".to_string(),
            id_column: None,
        }
    }
}

/// Per-channel facts gathered while building a composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelReport {
    pub channel: Channel,
    pub source: String,
    pub input_shape: Shape,
    pub output_shape: Shape,
    /// Finite range of the raw grid (`lo`, `hi` used for scaling).
    pub finite_min: f64,
    pub finite_max: f64,
    /// Cells replaced by the fill value.
    pub undefined_cells: usize,
    pub resampled: bool,
}

/// A saved run summary (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub config: CompositeConfig,
    pub target_shape: Shape,
    pub channels: Vec<ChannelReport>,
    pub png: Option<PathBuf>,
    pub overlay_points: Option<usize>,
}

/// One parsed catalog record.
///
/// Every measured field is optional: a row lacking a field is excluded only
/// from the operations that need it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogRow {
    /// 1-based line number in the source CSV.
    pub line: usize,
    pub id: Option<String>,
    /// Right ascension (degrees, J2000).
    pub ra: Option<f64>,
    /// Declination (degrees, J2000).
    pub dec: Option<f64>,
    pub z_phot: Option<f64>,
    pub z_spec: Option<f64>,
}

impl CatalogRow {
    /// `(ra, dec)` when both are present.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.ra?, self.dec?))
    }

    /// `(photometric, spectroscopic)` when both are present.
    pub fn redshifts(&self) -> Option<(f64, f64)> {
        Some((self.z_phot?, self.z_spec?))
    }

    /// Label for reports: the id, or the line number.
    pub fn label(&self) -> String {
        self.id.clone().unwrap_or_else(|| format!("line {}", self.line))
    }
}
