//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - histogram bars: `#`
//! - scatter points: `o`
//! - the `z_phot = z_spec` reference line: `.`

use crate::catalog::{Histogram, RedshiftPair};

/// Render one histogram as vertical bars.
///
/// When the plot is wider than the bin count each bin spans several columns;
/// when narrower, neighbouring bins are summed into one column.
pub fn render_histogram(hist: &Histogram, title: &str, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(3);
    let bins = hist.counts.len().max(1);

    let mut columns = vec![0usize; width];
    if width >= bins {
        for (x, col) in columns.iter_mut().enumerate() {
            *col = hist.counts.get(x * bins / width).copied().unwrap_or(0);
        }
    } else {
        for (i, &count) in hist.counts.iter().enumerate() {
            columns[i * width / bins] += count;
        }
    }

    let peak = columns.iter().copied().max().unwrap_or(0);
    let bar_heights: Vec<usize> = columns
        .iter()
        .map(|&c| {
            if c == 0 || peak == 0 {
                0
            } else {
                ((c as f64 / peak as f64 * height as f64).round() as usize).max(1)
            }
        })
        .collect();

    let (lo, hi) = hist.range();
    let mut out = String::new();
    out.push_str(&format!(
        "{title}: z=[{lo:.3}, {hi:.3}] | n={} | peak={}\n",
        hist.total(),
        hist.max_count()
    ));
    for level in (1..=height).rev() {
        let line: String = bar_heights
            .iter()
            .map(|&h| if h >= level { '#' } else { ' ' })
            .collect();
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Render `z_phot` (y) against `z_spec` (x) on a shared, padded axis range.
pub fn render_scatter(pairs: &[RedshiftPair], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (lo, hi) = value_range(pairs).unwrap_or((0.0, 1.0));
    let (lo, hi) = pad_range(lo, hi, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Reference line first so points can overlay.
    draw_line(
        &mut grid,
        map_x(lo, lo, hi, width),
        map_y(lo, lo, hi, height),
        map_x(hi, lo, hi, width),
        map_y(hi, lo, hi, height),
        '.',
    );

    for p in pairs {
        let x = map_x(p.z_spec, lo, hi, width);
        let y = map_y(p.z_phot, lo, hi, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Scatter: x=z_spec, y=z_phot over [{lo:.3}, {hi:.3}] | n={}\n",
        pairs.len()
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn value_range(pairs: &[RedshiftPair]) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for p in pairs {
        for v in [p.z_phot, p.z_spec] {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else if min.is_finite() && max.is_finite() {
        Some((min - 0.5, max + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(v: f64, min: f64, max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((v - min) / (max - min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(v: f64, min: f64, max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((v - min) / (max - min)).clamp(0.0, 1.0);
    // max at the top -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
