//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds composites from FITS files
//! - projects catalogs onto them
//! - runs the redshift comparison
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use log::{info, warn};

use crate::catalog::{Overlay, compare, project};
use crate::cli::{CatalogColumnArgs, Command, ComposeArgs, DemoArgs, RedshiftArgs, ShowArgs};
use crate::data::{SyntheticConfig, generate_field, write_demo};
use crate::domain::{CatalogConfig, ChannelSources, CompositeConfig};
use crate::error::AppError;
use crate::io::catalog::load_catalog;
use crate::io::loader::FitsLoader;

pub mod pipeline;

/// Maximum number of catalog row problems echoed to the terminal.
const ROW_ERRORS_SHOWN: usize = 10;

/// Entry point for the `udf` binary.
pub fn run() -> Result<(), AppError> {
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Compose(args) => handle_compose(args),
        Command::Redshift(args) => handle_redshift(args),
        Command::Demo(args) => handle_demo(args),
        Command::Show(args) => handle_show(args),
    }
}

fn handle_compose(args: ComposeArgs) -> Result<(), AppError> {
    let config = compose_config_from_args(&args);
    let loader = match &args.data_dir {
        Some(dir) => FitsLoader::with_root(dir),
        None => FitsLoader::new(),
    };
    let sources = ChannelSources::new(args.red.as_str(), args.green.as_str(), args.blue.as_str());

    let run = pipeline::run_composite(&loader, &sources, &config)?;

    let overlay = match &args.catalog {
        Some(path) => {
            let catalog = load_catalog(path, &catalog_config_from_args(&args.columns))?;
            if !catalog.row_errors.is_empty() {
                eprint!("{}", crate::report::format_row_errors(&catalog.row_errors, ROW_ERRORS_SHOWN));
            }
            if !catalog.has_positions {
                return Err(AppError::new(
                    2,
                    format!(
                        "Catalog '{}' has no `{}`/`{}` columns to overlay.",
                        path.display(),
                        args.columns.ra_column,
                        args.columns.dec_column
                    ),
                ));
            }
            let overlay = project(&run.image, &catalog.rows, args.extent);
            if overlay.excluded > 0 {
                warn!("{} catalog rows have no position and were not overlaid", overlay.excluded);
            }
            Some(overlay)
        }
        None => None,
    };

    crate::io::export::write_composite_png(&args.output, &run.image, overlay.as_ref(), args.origin)?;
    info!("wrote {}", args.output.display());

    let mut summary = run.summary(&config);
    summary.png = Some(args.output.clone());
    summary.overlay_points = overlay.as_ref().map(|o: &Overlay| o.points.len());

    println!("{}", crate::report::format_run_summary(&summary));
    if let Some(overlay) = &overlay {
        println!("{}", crate::report::format_overlay_summary(overlay));
    }

    if let Some(path) = &args.summary {
        crate::io::summary::write_summary_json(path, &summary)?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

fn handle_redshift(args: RedshiftArgs) -> Result<(), AppError> {
    let catalog = load_catalog(&args.catalog, &catalog_config_from_args(&args.columns))?;
    println!("{}", crate::report::format_catalog_summary(&catalog));
    if !catalog.row_errors.is_empty() {
        eprint!("{}", crate::report::format_row_errors(&catalog.row_errors, ROW_ERRORS_SHOWN));
    }
    if !catalog.has_redshifts {
        return Err(AppError::new(
            2,
            format!(
                "Catalog '{}' has no `{}`/`{}` columns to compare.",
                args.catalog.display(),
                args.columns.phot_column,
                args.columns.spec_column
            ),
        ));
    }

    let comparison = compare(&catalog.rows, args.bins, args.binning);
    if comparison.pairs.is_empty() {
        return Err(AppError::new(3, "No catalog row carries both redshift estimates."));
    }

    println!("{}", crate::report::format_redshift_summary(&comparison));
    if args.top > 0 {
        let worst = crate::report::rank_outliers(&comparison.pairs, args.top);
        println!("Largest disagreements:");
        println!("{}", crate::report::format_outlier_table(&worst));
    }

    if !args.no_plot {
        println!(
            "{}",
            crate::plot::render_histogram(&comparison.phot_histogram, "Photometric", args.width, args.height)
        );
        println!(
            "{}",
            crate::plot::render_histogram(&comparison.spec_histogram, "Spectroscopic", args.width, args.height)
        );
        println!("{}", crate::plot::render_scatter(&comparison.pairs, args.width, args.height));
    }

    if let Some(path) = &args.export {
        crate::io::export::write_redshift_pairs_csv(path, &comparison.pairs)?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = SyntheticConfig {
        seed: args.seed,
        galaxies: args.galaxies,
        ..SyntheticConfig::default()
    };
    let field = generate_field(&config)?;
    let files = write_demo(&args.out_dir, &field)?;

    println!("Wrote synthetic deep field to {}:", args.out_dir.display());
    for path in [&files.red, &files.green, &files.blue, &files.catalog] {
        println!("  {}", path.display());
    }
    let ext = field.extent;
    println!(
        "\nTry: udf compose -r {} -g {} -b {} --catalog {} --extent {},{},{},{}",
        files.red.display(),
        files.green.display(),
        files.blue.display(),
        files.catalog.display(),
        ext.ra_min,
        ext.ra_max,
        ext.dec_min,
        ext.dec_max
    );
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let summary = crate::io::summary::read_summary_json(&args.summary)?;
    println!("{}", crate::report::format_run_summary(&summary));
    Ok(())
}

pub fn compose_config_from_args(args: &ComposeArgs) -> CompositeConfig {
    CompositeConfig {
        reference: args.reference,
        target_shape: args.target_shape,
        fill_value: args.fill,
        interpolation: args.interpolation,
        anti_alias: !args.no_anti_alias,
        parallel: !args.sequential,
    }
}

pub fn catalog_config_from_args(args: &CatalogColumnArgs) -> CatalogConfig {
    CatalogConfig {
        ra_column: args.ra_column.clone(),
        dec_column: args.dec_column.clone(),
        phot_column: args.phot_column.clone(),
        spec_column: args.spec_column.clone(),
        id_column: args.id_column.clone(),
    }
}

/// Rewrite argv so `udf` defaults to `udf compose`.
///
/// Rules:
/// - `udf -r R -g G -b B ...`   -> `udf compose -r R -g G -b B ...`
/// - `udf`, `udf --help/-V`     -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "compose" | "redshift" | "demo" | "show");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "compose flags".
    if arg1.starts_with('-') {
        argv.insert(1, "compose".to_string());
    }
    argv
}
