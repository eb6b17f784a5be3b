//! Command-line parsing for the `udf` RGB compositing tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the compositing/catalog code.
//!
//! Every option can also come from a `UDF_*` environment variable (or a `.env`
//! file); an explicit flag always wins.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::catalog::SkyExtent;
use crate::domain::{Channel, HistogramBinning, Interpolation, Origin, Shape};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "udf", version, about = "Deep-field RGB compositor and catalog overlay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build an RGB composite from three single-band FITS images.
    Compose(ComposeArgs),
    /// Compare photometric and spectroscopic redshifts from a catalog.
    Redshift(RedshiftArgs),
    /// Write a synthetic deep field (three FITS bands + catalog CSV).
    Demo(DemoArgs),
    /// Print a saved run summary JSON.
    Show(ShowArgs),
}

/// Options for building a composite.
#[derive(Debug, Parser, Clone)]
pub struct ComposeArgs {
    /// Red channel FITS file (longest wavelength).
    #[arg(short = 'r', long, env = "UDF_RED", value_name = "FITS")]
    pub red: String,

    /// Green channel FITS file.
    #[arg(short = 'g', long, env = "UDF_GREEN", value_name = "FITS")]
    pub green: String,

    /// Blue channel FITS file (shortest wavelength).
    #[arg(short = 'b', long, env = "UDF_BLUE", value_name = "FITS")]
    pub blue: String,

    /// Directory relative channel paths are resolved against.
    #[arg(long, env = "UDF_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Channel whose shape becomes the composite shape.
    #[arg(long, env = "UDF_REFERENCE", value_enum, default_value_t = Channel::Green)]
    pub reference: Channel,

    /// Explicit composite shape `ROWSxCOLS` (overrides --reference).
    #[arg(long, env = "UDF_TARGET_SHAPE", value_name = "ROWSxCOLS", value_parser = parse_shape)]
    pub target_shape: Option<Shape>,

    /// Value in [0, 1] written into undefined pixels.
    #[arg(long, env = "UDF_FILL", default_value_t = 0.0)]
    pub fill: f64,

    /// Resampling kernel.
    #[arg(long, env = "UDF_INTERPOLATION", value_enum, default_value_t = Interpolation::Bilinear)]
    pub interpolation: Interpolation,

    /// Disable Gaussian pre-smoothing when downsampling.
    #[arg(long, env = "UDF_NO_ANTI_ALIAS")]
    pub no_anti_alias: bool,

    /// Load and normalize the channels one after another.
    #[arg(long, env = "UDF_SEQUENTIAL")]
    pub sequential: bool,

    /// Output PNG path.
    #[arg(short = 'o', long, env = "UDF_OUTPUT", default_value = "composite.png")]
    pub output: PathBuf,

    /// Which grid row is drawn at the top of the PNG.
    #[arg(long, env = "UDF_ORIGIN", value_enum, default_value_t = Origin::Lower)]
    pub origin: Origin,

    /// Catalog CSV whose positions are drawn on the composite.
    #[arg(long, env = "UDF_CATALOG", value_name = "CSV")]
    pub catalog: Option<PathBuf>,

    #[command(flatten)]
    pub columns: CatalogColumnArgs,

    /// Sky window `RA_MIN,RA_MAX,DEC_MIN,DEC_MAX` (degrees) covered by the image.
    /// Defaults to the bounding box of the catalog positions.
    #[arg(long, env = "UDF_EXTENT", value_parser = parse_extent)]
    pub extent: Option<SkyExtent>,

    /// Write a JSON run summary.
    #[arg(long, env = "UDF_SUMMARY", value_name = "JSON")]
    pub summary: Option<PathBuf>,
}

/// Catalog column names (matched case-insensitively).
#[derive(Debug, Args, Clone)]
pub struct CatalogColumnArgs {
    #[arg(long, env = "UDF_RA_COLUMN", default_value = "RAJ2000")]
    pub ra_column: String,

    #[arg(long, env = "UDF_DEC_COLUMN", default_value = "DEJ2000")]
    pub dec_column: String,

    #[arg(long, env = "UDF_PHOT_COLUMN", default_value = "Photometric_Redshift")]
    pub phot_column: String,

    #[arg(long, env = "UDF_SPEC_COLUMN", default_value = "Spectroscopic_Redshift")]
    pub spec_column: String,

    /// Identifier column (defaults to the first of id, seq, name).
    #[arg(long, env = "UDF_ID_COLUMN")]
    pub id_column: Option<String>,
}

/// Options for the redshift comparison.
#[derive(Debug, Parser, Clone)]
pub struct RedshiftArgs {
    /// Catalog CSV.
    #[arg(long, env = "UDF_CATALOG", value_name = "CSV")]
    pub catalog: PathBuf,

    #[command(flatten)]
    pub columns: CatalogColumnArgs,

    /// Histogram bins per series.
    #[arg(long, env = "UDF_BINS", default_value_t = 50)]
    pub bins: usize,

    /// Bin both series independently or over a shared range.
    #[arg(long, env = "UDF_BINNING", value_enum, default_value_t = HistogramBinning::Independent)]
    pub binning: HistogramBinning,

    /// Show the N largest disagreements.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the redshift pairs to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Options for writing synthetic demo data.
#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    /// Output directory.
    #[arg(long, env = "UDF_DEMO_DIR", default_value = "udf-demo")]
    pub out_dir: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of galaxies.
    #[arg(short = 'n', long, default_value_t = 40)]
    pub galaxies: usize,
}

/// Options for printing a saved summary.
#[derive(Debug, Parser, Clone)]
pub struct ShowArgs {
    /// Summary JSON produced by `udf compose --summary`.
    #[arg(value_name = "JSON")]
    pub summary: PathBuf,
}

/// Parse `ROWSxCOLS` (also accepts `ROWS,COLS`).
pub fn parse_shape(s: &str) -> Result<Shape, String> {
    let (rows, cols) = s
        .split_once(['x', 'X', ','])
        .ok_or_else(|| format!("expected ROWSxCOLS, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid dimension '{v}': {e}"))
    };
    Ok(Shape::new(parse(rows)?, parse(cols)?))
}

/// Parse `RA_MIN,RA_MAX,DEC_MIN,DEC_MAX`.
pub fn parse_extent(s: &str) -> Result<SkyExtent, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("invalid number '{v}': {e}")))
        .collect::<Result<Vec<f64>, String>>()?;
    match values.as_slice() {
        &[ra_min, ra_max, dec_min, dec_max] => SkyExtent::new(ra_min, ra_max, dec_min, dec_max)
            .ok_or_else(|| "extent needs RA_MIN < RA_MAX and DEC_MIN < DEC_MAX".to_string()),
        _ => Err(format!("expected 4 comma-separated values, got {}", values.len())),
    }
}
