//! Photometric vs spectroscopic redshift comparison.
//!
//! Produces:
//! - the `(z_phot, z_spec)` pairs of rows carrying both estimates
//! - one histogram per series (independent or shared bin edges)
//! - the usual photo-z quality numbers (bias, σ_NMAD, outlier fraction)

use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::{CatalogRow, HistogramBinning};
use crate::math::{mean, nmad};

pub const DEFAULT_BINS: usize = 50;

/// `|Δz| / (1 + z_spec)` above this marks a catastrophic outlier.
pub const OUTLIER_THRESHOLD: f64 = 0.15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedshiftPair {
    pub line: usize,
    pub label: String,
    pub z_phot: f64,
    pub z_spec: f64,
}

impl RedshiftPair {
    /// `(z_phot - z_spec) / (1 + z_spec)`.
    pub fn scaled_delta(&self) -> f64 {
        (self.z_phot - self.z_spec) / (1.0 + self.z_spec)
    }
}

/// Fixed-width histogram: `edges.len() == counts.len() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins over `[lo, hi]`.
    ///
    /// Bins are half-open except the last, which includes `hi`. Values outside
    /// the range are ignored. A reversed range is swapped, an empty one is
    /// widened to `lo ± 0.5` and a non-finite one falls back to `[0, 1]`.
    pub fn new(values: &[f64], bins: usize, range: (f64, f64)) -> Self {
        let (lo, hi) = Self::usable_range(range);
        let bins = bins.max(1);
        let width = (hi - lo) / bins as f64;
        let mut edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        edges[bins] = hi;
        let mut counts = vec![0usize; bins];
        for &v in values {
            if !(lo..=hi).contains(&v) {
                continue;
            }
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Self { edges, counts }
    }

    /// `[min, max]` of the values, widened to `v ± 0.5` when constant and `[0, 1]` when empty.
    pub fn auto_range(values: &[f64]) -> (f64, f64) {
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if lo > hi {
            (0.0, 1.0)
        } else if lo == hi {
            (lo - 0.5, hi + 0.5)
        } else {
            (lo, hi)
        }
    }

    fn usable_range((lo, hi): (f64, f64)) -> (f64, f64) {
        if !lo.is_finite() || !hi.is_finite() {
            (0.0, 1.0)
        } else if lo == hi {
            (lo - 0.5, hi + 0.5)
        } else {
            (lo.min(hi), lo.max(hi))
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn range(&self) -> (f64, f64) {
        let lo = self.edges.first().copied().unwrap_or(0.0);
        let hi = self.edges.last().copied().unwrap_or(lo);
        (lo, hi)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedshiftStats {
    pub n: usize,
    /// Mean of `Δz / (1 + z_spec)`.
    pub bias: f64,
    pub sigma_nmad: f64,
    pub outliers: usize,
    pub outlier_fraction: f64,
}

impl RedshiftStats {
    /// `None` for an empty set of pairs.
    pub fn from_pairs(pairs: &[RedshiftPair]) -> Option<Self> {
        let deltas: Vec<f64> = pairs.iter().map(RedshiftPair::scaled_delta).collect();
        let bias = mean(&deltas)?;
        let sigma_nmad = nmad(&deltas)?;
        let outliers = deltas.iter().filter(|d| d.abs() > OUTLIER_THRESHOLD).count();
        Some(Self {
            n: pairs.len(),
            bias,
            sigma_nmad,
            outliers,
            outlier_fraction: outliers as f64 / pairs.len() as f64,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedshiftComparison {
    pub pairs: Vec<RedshiftPair>,
    /// Rows lacking one or both redshifts.
    pub excluded: usize,
    pub phot_histogram: Histogram,
    pub spec_histogram: Histogram,
    pub stats: Option<RedshiftStats>,
}

impl RedshiftComparison {
    pub fn phot_values(&self) -> Vec<f64> {
        self.pairs.iter().map(|p| p.z_phot).collect()
    }

    pub fn spec_values(&self) -> Vec<f64> {
        self.pairs.iter().map(|p| p.z_spec).collect()
    }
}

/// Compare the two redshift estimates over every row that carries both.
pub fn compare(rows: &[CatalogRow], bins: usize, binning: HistogramBinning) -> RedshiftComparison {
    let pairs: Vec<RedshiftPair> = rows
        .iter()
        .filter_map(|row| {
            let (z_phot, z_spec) = row.redshifts()?;
            Some(RedshiftPair {
                line: row.line,
                label: row.label(),
                z_phot,
                z_spec,
            })
        })
        .collect();
    let excluded = rows.len() - pairs.len();

    let phot: Vec<f64> = pairs.iter().map(|p| p.z_phot).collect();
    let spec: Vec<f64> = pairs.iter().map(|p| p.z_spec).collect();

    let (phot_range, spec_range) = match binning {
        HistogramBinning::Independent => (Histogram::auto_range(&phot), Histogram::auto_range(&spec)),
        HistogramBinning::Shared => {
            let both: Vec<f64> = phot.iter().chain(spec.iter()).copied().collect();
            let range = Histogram::auto_range(&both);
            (range, range)
        }
    };

    let stats = RedshiftStats::from_pairs(&pairs);
    debug!("redshift comparison: {} pairs, {excluded} rows excluded", pairs.len());

    RedshiftComparison {
        phot_histogram: Histogram::new(&phot, bins, phot_range),
        spec_histogram: Histogram::new(&spec, bins, spec_range),
        pairs,
        excluded,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(line: usize, z_phot: Option<f64>, z_spec: Option<f64>) -> CatalogRow {
        CatalogRow {
            line,
            z_phot,
            z_spec,
            ..CatalogRow::default()
        }
    }

    #[test]
    fn histogram_last_bin_is_closed() {
        let h = Histogram::new(&[0.0, 0.5, 1.0, 1.0], 4, (0.0, 1.0));
        assert_eq!(h.counts, vec![1, 0, 1, 2]);
        assert_eq!(h.edges.len(), 5);
        assert_eq!(h.total(), 4);
    }

    #[test]
    fn histogram_widens_empty_and_invalid_ranges() {
        let h = Histogram::new(&[1.0, 1.0, 1.0], 4, (1.0, 1.0));
        assert_eq!(h.range(), (0.5, 1.5));
        assert_eq!(h.counts, vec![0, 0, 3, 0]);

        let h = Histogram::new(&[0.5], 2, (1.0, 0.0));
        assert_eq!(h.range(), (0.0, 1.0));
        assert_eq!(h.counts, vec![0, 1]);

        let h = Histogram::new(&[0.25], 2, (f64::NAN, 1.0));
        assert_eq!(h.range(), (0.0, 1.0));
        assert_eq!(h.total(), 1);
    }

    #[test]
    fn auto_range_handles_constant_and_empty() {
        assert_eq!(Histogram::auto_range(&[2.0, 2.0]), (1.5, 2.5));
        assert_eq!(Histogram::auto_range(&[]), (0.0, 1.0));
        assert_eq!(Histogram::auto_range(&[0.3, 1.7, f64::NAN]), (0.3, 1.7));
    }

    #[test]
    fn rows_missing_a_redshift_are_excluded() {
        let rows = vec![
            row(2, Some(1.0), Some(1.0)),
            row(3, Some(0.5), None),
            row(4, None, Some(2.0)),
            row(5, Some(2.0), Some(2.2)),
        ];
        let cmp = compare(&rows, DEFAULT_BINS, HistogramBinning::Independent);
        assert_eq!(cmp.pairs.len(), 2);
        assert_eq!(cmp.excluded, 2);
        assert_eq!(cmp.phot_histogram.total(), 2);
        assert_eq!(cmp.spec_histogram.total(), 2);
        assert_eq!(cmp.phot_histogram.counts.len(), DEFAULT_BINS);
    }

    #[test]
    fn shared_binning_uses_union_range() {
        let rows = vec![row(2, Some(0.2), Some(0.4)), row(3, Some(1.0), Some(3.0))];
        let cmp = compare(&rows, 10, HistogramBinning::Shared);
        assert_eq!(cmp.phot_histogram.edges, cmp.spec_histogram.edges);
        assert_eq!(cmp.phot_histogram.range(), (0.2, 3.0));
    }

    #[test]
    fn stats_measure_bias_scatter_and_outliers() {
        // scaled deltas: 0, 0, 0.5 (outlier)
        let rows = vec![
            row(2, Some(1.0), Some(1.0)),
            row(3, Some(0.0), Some(0.0)),
            row(4, Some(2.0), Some(1.0)),
        ];
        let stats = compare(&rows, 5, HistogramBinning::Independent).stats.unwrap();
        assert_eq!(stats.n, 3);
        assert!((stats.bias - 0.5 / 3.0).abs() < 1e-12);
        assert_eq!(stats.sigma_nmad, 0.0);
        assert_eq!(stats.outliers, 1);
        assert!((stats.outlier_fraction - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn no_pairs_means_no_stats() {
        let cmp = compare(&[row(2, None, Some(1.0))], 5, HistogramBinning::Shared);
        assert!(cmp.stats.is_none());
        assert_eq!(cmp.phot_histogram.range(), (0.0, 1.0));
    }
}
