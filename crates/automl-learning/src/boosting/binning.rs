//! Quantile binning of the training matrix.
//!
//! Every feature gets a [`BinMapper`] holding sorted bin upper bounds; a
//! value maps to the first bin whose bound is `>= value`. The last bound is
//! `+inf`, so every finite value has a bin. Bin indices are stored as `u8`
//! in feature-major order.

use ndarray::ArrayView2;

/// Upper bounds of one feature's bins.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BinMapper {
    upper_bounds: Vec<f64>,
}

impl BinMapper {
    /// Build bounds from one feature column.
    ///
    /// With at most `max_bins` distinct values each value gets its own bin,
    /// separated at the midpoints. Otherwise bounds are taken at evenly
    /// spaced quantiles of the sorted column.
    pub(crate) fn from_values(values: impl Iterator<Item = f64>, max_bins: usize) -> Self {
        let mut sorted: Vec<f64> = values.filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        let mut distinct = sorted.clone();
        distinct.dedup();

        let mut upper_bounds: Vec<f64> = if distinct.len() <= max_bins {
            distinct
                .windows(2)
                .map(|pair| pair[0] + (pair[1] - pair[0]) / 2.0)
                .collect()
        } else {
            let n = sorted.len();
            let mut bounds: Vec<f64> = (1..max_bins)
                .map(|k| sorted[(k * n / max_bins).min(n - 1)])
                .collect();
            bounds.dedup();
            // A bound at the maximum would leave the +inf bin empty
            if bounds.last().is_some_and(|&last| Some(&last) == sorted.last()) {
                bounds.pop();
            }
            bounds
        };

        upper_bounds.push(f64::INFINITY);
        Self { upper_bounds }
    }

    pub(crate) fn n_bins(&self) -> usize {
        self.upper_bounds.len()
    }

    pub(crate) fn bin(&self, value: f64) -> u8 {
        let bin = self.upper_bounds.partition_point(|&bound| bound < value);
        bin.min(self.upper_bounds.len() - 1) as u8
    }

    /// Raw-value threshold equivalent to "bin <= `bin`".
    pub(crate) fn threshold(&self, bin: usize) -> f64 {
        self.upper_bounds[bin]
    }
}

/// The training matrix reduced to bin indices.
#[derive(Debug, Clone)]
pub(crate) struct BinnedMatrix {
    bins: Vec<u8>,
    n_rows: usize,
    mappers: Vec<BinMapper>,
}

impl BinnedMatrix {
    /// Bin every column of `x` into at most `max_bins` (<= 256) bins.
    pub(crate) fn from_matrix(x: ArrayView2<f64>, max_bins: usize) -> Self {
        let max_bins = max_bins.clamp(2, 256);
        let n_rows = x.nrows();
        let mut bins = Vec::with_capacity(n_rows * x.ncols());
        let mut mappers = Vec::with_capacity(x.ncols());

        for column in x.columns() {
            let mapper = BinMapper::from_values(column.iter().copied(), max_bins);
            bins.extend(column.iter().map(|&value| mapper.bin(value)));
            mappers.push(mapper);
        }

        Self {
            bins,
            n_rows,
            mappers,
        }
    }

    pub(crate) fn n_features(&self) -> usize {
        self.mappers.len()
    }

    pub(crate) fn feature_bins(&self, feature: usize) -> &[u8] {
        &self.bins[feature * self.n_rows..(feature + 1) * self.n_rows]
    }

    pub(crate) fn mapper(&self, feature: usize) -> &BinMapper {
        &self.mappers[feature]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_few_distinct_values_get_own_bins() {
        let mapper = BinMapper::from_values([3.0, 1.0, 2.0, 1.0].into_iter(), 256);
        assert_eq!(mapper.n_bins(), 3);
        assert_eq!(mapper.bin(1.0), 0);
        assert_eq!(mapper.bin(2.0), 1);
        assert_eq!(mapper.bin(3.0), 2);
        assert_eq!(mapper.threshold(0), 1.5);
        assert_eq!(mapper.bin(100.0), 2);
        assert_eq!(mapper.bin(-100.0), 0);
    }

    #[test]
    fn test_quantile_bins_are_capped() {
        let mapper = BinMapper::from_values((0..1000).map(f64::from), 16);
        assert!(mapper.n_bins() <= 16);
        assert!(mapper.n_bins() >= 15);

        // Bin membership agrees with the threshold rule
        for value in (0..1000).map(f64::from) {
            let bin = mapper.bin(value) as usize;
            assert!(value <= mapper.threshold(bin));
            if bin > 0 {
                assert!(value > mapper.threshold(bin - 1));
            }
        }
    }

    #[test]
    fn test_constant_column_has_single_bin() {
        let mapper = BinMapper::from_values([5.0, 5.0, 5.0].into_iter(), 256);
        assert_eq!(mapper.n_bins(), 1);
        assert_eq!(mapper.bin(5.0), 0);
    }

    #[test]
    fn test_binned_matrix_layout() {
        let x = array![[1.0, 10.0], [2.0, 10.0], [3.0, 20.0]];
        let binned = BinnedMatrix::from_matrix(x.view(), 256);
        assert_eq!(binned.n_features(), 2);
        assert_eq!(binned.feature_bins(0), &[0, 1, 2]);
        assert_eq!(binned.feature_bins(1), &[0, 0, 1]);
        assert_eq!(binned.mapper(1).threshold(0), 15.0);
    }
}
