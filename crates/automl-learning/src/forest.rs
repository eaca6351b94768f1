//! Random forest over CART trees.
//!
//! Each tree is fit on a bootstrap sample drawn with its own seed
//! (`seed + tree index`), so fitting is reproducible. Classification
//! predictions average the trees' class probabilities and take the most
//! probable class; regression predictions average the trees' outputs.

use crate::config::{ForestParams, MaxFeatures};
use crate::error::{LearningError, Result};
use crate::tree::DecisionTree;
use crate::types::Task;
use ndarray::{Array1, Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Fitted random forest.
#[derive(Debug, Clone)]
pub struct RandomForest {
    task: Task,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Fit a forest on `x` / `y`.
    pub fn fit(
        x: ArrayView2<f64>,
        y: &Array1<f64>,
        task: Task,
        params: &ForestParams,
        seed: u64,
    ) -> Result<Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples == 0 || n_features == 0 {
            return Err(LearningError::InvalidData(
                "cannot fit a forest on an empty matrix".to_string(),
            ));
        }

        let max_features = params
            .max_features
            .unwrap_or(match task {
                Task::Classification { .. } => MaxFeatures::Sqrt,
                Task::Regression => MaxFeatures::All,
            })
            .resolve(n_features);

        let mut trees = Vec::with_capacity(params.n_trees);
        for tree_idx in 0..params.n_trees {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(tree_idx as u64));
            let bootstrap: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

            let mut tree = match task {
                Task::Classification { n_classes } => DecisionTree::new_classifier(n_classes),
                Task::Regression => DecisionTree::new_regressor(),
            }
            .with_max_depth(params.max_depth)
            .with_min_samples_split(params.min_samples_split)
            .with_max_features(max_features);

            tree.fit(x, y.view(), bootstrap, &mut rng);
            trees.push(tree);
        }

        debug!(
            n_trees = trees.len(),
            max_features,
            max_depth = trees.iter().map(DecisionTree::depth).max().unwrap_or(0),
            "Fitted random forest"
        );

        Ok(Self {
            task,
            trees,
            n_features,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Averaged class probabilities, shape `(n_rows, n_classes)`.
    ///
    /// Regression forests return a single column with the averaged prediction.
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.check_width(x)?;
        let width = match self.task {
            Task::Classification { n_classes } => n_classes,
            Task::Regression => 1,
        };

        let mut out = Array2::<f64>::zeros((x.nrows(), width));
        for (row, mut target) in x.rows().into_iter().zip(out.rows_mut()) {
            for tree in &self.trees {
                for (slot, value) in target.iter_mut().zip(tree.predict_row(row)) {
                    *slot += value;
                }
            }
        }
        out /= self.trees.len().max(1) as f64;
        Ok(out)
    }

    /// Class indices (as `f64`) for classification, values for regression.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let averaged = self.predict_proba(x)?;
        Ok(match self.task {
            Task::Classification { .. } => averaged
                .rows()
                .into_iter()
                .map(|row| argmax(row.iter().copied()) as f64)
                .collect(),
            Task::Regression => averaged.column(0).to_owned(),
        })
    }

    fn check_width(&self, x: ArrayView2<f64>) -> Result<()> {
        if x.ncols() != self.n_features {
            return Err(LearningError::InvalidData(format!(
                "model expects {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok(())
    }
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best_idx = 0;
    let mut best = f64::NEG_INFINITY;
    for (idx, value) in values.enumerate() {
        if value > best {
            best = value;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::accuracy;
    use ndarray::Array2;

    fn two_blobs() -> (Array2<f64>, Array1<f64>) {
        let n = 80;
        let x = Array2::from_shape_fn((n, 3), |(i, j)| {
            let class = (i % 2) as f64;
            let jitter = ((i * 7 + j * 13) % 10) as f64 / 10.0;
            match j {
                0 => class * 5.0 + jitter,
                1 => jitter * 3.0,
                _ => (i % 5) as f64,
            }
        });
        let y = Array1::from_shape_fn(n, |i| (i % 2) as f64);
        (x, y)
    }

    #[test]
    fn test_forest_learns_separable_classes() {
        let (x, y) = two_blobs();
        let task = Task::Classification { n_classes: 2 };
        let forest = RandomForest::fit(x.view(), &y, task, &ForestParams::default(), 42).unwrap();

        assert_eq!(forest.n_trees(), 50);
        let predictions = forest.predict(x.view()).unwrap();
        assert!(accuracy(&y, &predictions) > 0.95);

        let proba = forest.predict_proba(x.view()).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_forest_is_deterministic() {
        let (x, y) = two_blobs();
        let task = Task::Classification { n_classes: 2 };
        let params = ForestParams {
            n_trees: 5,
            ..ForestParams::default()
        };
        let a = RandomForest::fit(x.view(), &y, task, &params, 7).unwrap();
        let b = RandomForest::fit(x.view(), &y, task, &params, 7).unwrap();
        assert_eq!(
            a.predict_proba(x.view()).unwrap(),
            b.predict_proba(x.view()).unwrap()
        );
    }

    #[test]
    fn test_regression_forest() {
        let x = Array2::from_shape_fn((60, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(60, |i| 2.0 * i as f64 + 1.0);
        let forest =
            RandomForest::fit(x.view(), &y, Task::Regression, &ForestParams::default(), 42).unwrap();

        let predictions = forest.predict(x.view()).unwrap();
        let max_error = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, t)| (p - t).abs())
            .fold(0.0, f64::max);
        assert!(max_error < 12.0, "max error {max_error}");
    }

    #[test]
    fn test_width_mismatch() {
        let (x, y) = two_blobs();
        let params = ForestParams {
            n_trees: 2,
            ..ForestParams::default()
        };
        let forest =
            RandomForest::fit(x.view(), &y, Task::Classification { n_classes: 2 }, &params, 1)
                .unwrap();
        let narrow = Array2::<f64>::zeros((2, 1));
        assert!(forest.predict(narrow.view()).is_err());
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax([0.2, 0.5, 0.5].into_iter()), 1);
        assert_eq!(argmax([0.0].into_iter()), 0);
    }
}
