//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the compositing/catalog code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::catalog::{Overlay, RedshiftComparison, RedshiftPair};
use crate::domain::{ChannelReport, RunSummary};
use crate::io::catalog::{Catalog, RowError};

/// Format a composite run summary (configuration + per-channel table).
pub fn format_run_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let config = &summary.config;

    out.push_str("=== udf - RGB composite ===\n");
    out.push_str(&format!(
        "Generated: {}\n",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    let target = match config.target_shape {
        Some(shape) => format!("{shape} (explicit)"),
        None => format!("{} (reference: {})", summary.target_shape, config.reference),
    };
    out.push_str(&format!("Target: {target}\n"));
    out.push_str(&format!(
        "Resampling: {:?} | anti-alias: {} | fill: {}\n",
        config.interpolation,
        if config.anti_alias { "on" } else { "off" },
        config.fill_value
    ));

    out.push('\n');
    out.push_str(&format_channel_table(&summary.channels));

    if let Some(png) = &summary.png {
        out.push_str(&format!("\nPNG: {}\n", png.display()));
    }
    if let Some(n) = summary.overlay_points {
        out.push_str(&format!("Overlay points: {n}\n"));
    }
    out
}

fn format_channel_table(rows: &[ChannelReport]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<6} {:<28} {:>9} {:>9} {:>12} {:>12} {:>9}\n",
            "band", "source", "input", "output", "min", "max", "undef"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<6} {:-<28} {:-<9} {:-<9} {:-<12} {:-<12} {:-<9}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rows {
        let marker = if r.resampled { "*" } else { "" };
        out.push_str(
            format!(
                "{:<6} {:<28} {:>9} {:>9} {:>12} {:>12} {:>9}\n",
                r.channel.name(),
                truncate(&r.source, 28),
                r.input_shape.to_string(),
                format!("{}{marker}", r.output_shape),
                fmt_value(r.finite_min),
                fmt_value(r.finite_max),
                r.undefined_cells,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Format the overlay projection counts.
pub fn format_overlay_summary(overlay: &Overlay) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Overlay: {} points placed | {} without position | {} outside extent\n",
        overlay.points.len(),
        overlay.excluded,
        overlay.outside
    ));
    if let Some(ext) = &overlay.extent {
        out.push_str(&format!(
            "Extent: RA=[{:.5}, {:.5}] Dec=[{:.5}, {:.5}] deg\n",
            ext.ra_min, ext.ra_max, ext.dec_min, ext.dec_max
        ));
    }
    out
}

/// Format catalog ingest counts.
pub fn format_catalog_summary(catalog: &Catalog) -> String {
    format!(
        "Catalog: rows={} | with position={} | with both redshifts={} | cell problems={}\n",
        catalog.rows_read,
        catalog.with_positions(),
        catalog.with_redshifts(),
        catalog.row_errors.len()
    )
}

/// Format the first `max` row problems.
pub fn format_row_errors(errors: &[RowError], max: usize) -> String {
    let mut out = String::new();
    for e in errors.iter().take(max) {
        out.push_str(&format!("  line {}: {}\n", e.line, e.message));
    }
    if errors.len() > max {
        out.push_str(&format!("  ... and {} more\n", errors.len() - max));
    }
    out
}

/// Format redshift comparison statistics.
pub fn format_redshift_summary(cmp: &RedshiftComparison) -> String {
    let mut out = String::new();
    out.push_str("=== udf - photometric vs spectroscopic redshift ===\n");
    out.push_str(&format!(
        "Pairs: n={} | excluded rows={}\n",
        cmp.pairs.len(),
        cmp.excluded
    ));
    match &cmp.stats {
        Some(s) => {
            out.push_str(&format!("Bias (mean dz/(1+z)): {:+.4}\n", s.bias));
            out.push_str(&format!("Sigma NMAD: {:.4}\n", s.sigma_nmad));
            out.push_str(&format!(
                "Outliers (|dz|/(1+z) > 0.15): {} ({:.1}%)\n",
                s.outliers,
                s.outlier_fraction * 100.0
            ));
        }
        None => out.push_str("No statistics: no row carries both redshifts.\n"),
    }
    out
}

/// Format the worst redshift disagreements.
pub fn format_outlier_table(pairs: &[RedshiftPair]) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<20} {:>6} {:>9} {:>9} {:>10}\n", "id", "line", "z_phot", "z_spec", "dz/(1+z)").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<20} {:-<6} {:-<9} {:-<9} {:-<10}\n", "", "", "", "", "").trim_end());
    out.push('\n');
    for p in pairs {
        out.push_str(
            format!(
                "{:<20} {:>6} {:>9.4} {:>9.4} {:>+10.4}\n",
                truncate(&p.label, 20),
                p.line,
                p.z_phot,
                p.z_spec,
                p.scaled_delta()
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn fmt_value(v: f64) -> String {
    if v != 0.0 && (v.abs() >= 1e5 || v.abs() < 1e-3) {
        format!("{v:.4e}")
    } else {
        format!("{v:.4}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
