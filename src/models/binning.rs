//! Quantile binning of feature columns for histogram split finding

use ndarray::{ArrayView2, Axis};

/// Upper bound on bins per feature (bin indices fit in a `u8`)
pub const MAX_BINS: usize = 256;

/// Feature matrix quantized to per-feature bins
///
/// A value `v` of feature `j` falls in bin `b` when `cuts[j][b-1] < v <= cuts[j][b]`;
/// the last bin is open above. Splitting "bin <= b" is therefore the same as
/// the raw-value test `v <= cuts[j][b]`.
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    n_rows: usize,
    n_features: usize,
    /// Row-major bin indices
    bins: Vec<u8>,
    cuts: Vec<Vec<f64>>,
}

impl BinnedMatrix {
    pub fn from_array(x: ArrayView2<f64>, max_bins: usize) -> Self {
        let max_bins = max_bins.clamp(2, MAX_BINS);
        let cuts: Vec<Vec<f64>> = x
            .axis_iter(Axis(1))
            .map(|column| feature_cuts(column.iter().copied(), max_bins))
            .collect();

        let (n_rows, n_features) = x.dim();
        let mut bins = Vec::with_capacity(n_rows * n_features);
        for row in x.axis_iter(Axis(0)) {
            for (j, &v) in row.iter().enumerate() {
                bins.push(bin_index(&cuts[j], v));
            }
        }

        Self {
            n_rows,
            n_features,
            bins,
            cuts,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of bins used by a feature
    pub fn n_bins(&self, feature: usize) -> usize {
        self.cuts[feature].len() + 1
    }

    #[inline]
    pub fn bin(&self, row: usize, feature: usize) -> usize {
        self.bins[row * self.n_features + feature] as usize
    }

    /// Raw-value threshold equivalent to "bin <= b"
    pub fn threshold(&self, feature: usize, bin: usize) -> f64 {
        self.cuts[feature][bin]
    }
}

/// Candidate thresholds for one feature
fn feature_cuts(values: impl Iterator<Item = f64>, max_bins: usize) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();

    if sorted.len() <= max_bins {
        return sorted.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    }

    let n = sorted.len();
    let mut cuts: Vec<f64> = (1..max_bins)
        .map(|k| {
            let idx = k * n / max_bins;
            (sorted[idx - 1] + sorted[idx]) / 2.0
        })
        .collect();
    cuts.dedup();
    cuts
}

fn bin_index(cuts: &[f64], value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    cuts.partition_point(|&c| c < value) as u8
}
