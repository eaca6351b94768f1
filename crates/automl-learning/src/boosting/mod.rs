//! Histogram-based gradient-boosted trees.
//!
//! Training bins the matrix once ([`binning`]), then adds one tree per
//! output every round ([`tree`]) against the gradients of the objective
//! ([`loss`]). Each round samples a fraction of the rows; each tree samples
//! a fraction of the columns. When a held-out set is given, the held-out
//! loss is tracked every round ([`early_stopping`]) and the ensemble is cut
//! back to its best round at the end.
//!
//! # Example
//!
//! ```
//! use automl_learning::{BoostingParams, GradientBoostedTrees, Task};
//! use ndarray::{Array1, Array2};
//!
//! let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64);
//! let y = Array1::from_shape_fn(40, |i| if i < 20 { 0.0 } else { 1.0 });
//! let params = BoostingParams {
//!     max_rounds: 20,
//!     learning_rate: 0.3,
//!     subsample: 1.0,
//!     ..BoostingParams::default()
//! };
//!
//! let model = GradientBoostedTrees::fit(
//!     x.view(), &y, None, Task::Classification { n_classes: 2 }, &params, None, 42,
//! ).unwrap();
//! assert_eq!(model.predict(x.view()).unwrap(), y);
//! ```

mod binning;
mod early_stopping;
mod loss;
mod tree;

use crate::config::BoostingParams;
use crate::error::{LearningError, Result};
use crate::forest::argmax;
use crate::types::{ClassWeight, Task};
use binning::BinnedMatrix;
use early_stopping::EarlyStopping;
use loss::{Objective, sigmoid, softmax_into};
use ndarray::{Array1, Array2, ArrayView2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use tracing::debug;
use tree::{BoostedTree, GrowerParams, TreeGrower};

/// Rounds between progress log lines.
const LOG_EVERY: usize = 100;

/// Fitted gradient-boosted ensemble.
#[derive(Debug, Clone)]
pub struct GradientBoostedTrees {
    objective: Objective,
    base_score: Vec<f64>,
    /// One tree per output for every kept round.
    rounds: Vec<Vec<BoostedTree>>,
    best_iteration: Option<usize>,
    n_features: usize,
}

impl GradientBoostedTrees {
    /// Fit on `x` / `y`, optionally early-stopping on `eval`.
    ///
    /// Classification targets hold class indices. `class_weight` multiplies
    /// the gradients and hessians of every row of that class.
    ///
    /// # Errors
    ///
    /// [`LearningError::InvalidData`] on empty input or mismatched shapes.
    pub fn fit(
        x: ArrayView2<f64>,
        y: &Array1<f64>,
        eval: Option<(ArrayView2<f64>, &Array1<f64>)>,
        task: Task,
        params: &BoostingParams,
        class_weight: Option<ClassWeight>,
        seed: u64,
    ) -> Result<Self> {
        let n_rows = x.nrows();
        let n_features = x.ncols();
        if n_rows == 0 || n_features == 0 {
            return Err(LearningError::InvalidData(
                "cannot fit a boosted ensemble on an empty matrix".to_string(),
            ));
        }
        if y.len() != n_rows {
            return Err(LearningError::InvalidData(format!(
                "{n_rows} feature rows but {} targets",
                y.len()
            )));
        }
        if let Some((eval_x, eval_y)) = eval
            && (eval_x.ncols() != n_features || eval_x.nrows() != eval_y.len())
        {
            return Err(LearningError::InvalidData(
                "evaluation set does not match the training matrix".to_string(),
            ));
        }

        let objective = Objective::for_task(task);
        let n_outputs = objective.n_outputs();
        let y_train = y.to_vec();
        let base_score = objective.base_score(&y_train);

        let weights: Vec<f64> = y_train
            .iter()
            .map(|&label| match class_weight {
                Some(cw) if label as usize == cw.class => cw.weight,
                _ => 1.0,
            })
            .collect();

        let binned = BinnedMatrix::from_matrix(x, params.max_bins);
        let grower = TreeGrower::new(
            &binned,
            GrowerParams {
                max_depth: params.max_depth,
                lambda: params.lambda,
                min_child_weight: params.min_child_weight,
                learning_rate: params.learning_rate,
            },
        );

        let mut scores = initial_scores(&base_score, n_rows);
        let mut grad = vec![0.0; n_rows * n_outputs];
        let mut hess = vec![0.0; n_rows * n_outputs];

        let mut eval_state = eval.map(|(eval_x, eval_y)| {
            (
                eval_x,
                eval_y.to_vec(),
                initial_scores(&base_score, eval_x.nrows()),
            )
        });
        let mut stopper = params
            .early_stopping_rounds
            .filter(|_| eval_state.is_some())
            .map(EarlyStopping::new);

        let n_sampled_rows = sample_size(n_rows, params.subsample);
        let n_sampled_features = sample_size(binned.n_features(), params.colsample_bytree);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut rounds: Vec<Vec<BoostedTree>> = Vec::new();

        for round in 0..params.max_rounds {
            objective.gradients(&y_train, &scores, &weights, &mut grad, &mut hess);
            let rows = sorted_sample(&mut rng, n_rows, n_sampled_rows);

            let mut trees = Vec::with_capacity(n_outputs);
            for output in 0..n_outputs {
                let features = sorted_sample(&mut rng, n_features, n_sampled_features);
                let span = output * n_rows..(output + 1) * n_rows;
                let tree = grower.grow(&grad[span.clone()], &hess[span], rows.clone(), &features);

                for (i, row) in x.rows().into_iter().enumerate() {
                    scores[output * n_rows + i] += tree.predict_row(row);
                }
                if let Some((eval_x, _, eval_scores)) = eval_state.as_mut() {
                    let n_eval = eval_x.nrows();
                    for (i, row) in eval_x.rows().into_iter().enumerate() {
                        eval_scores[output * n_eval + i] += tree.predict_row(row);
                    }
                }
                trees.push(tree);
            }
            rounds.push(trees);

            if let Some((_, eval_y, eval_scores)) = eval_state.as_ref() {
                let loss = objective.eval_loss(eval_y, eval_scores);
                if round % LOG_EVERY == 0 {
                    debug!(round, loss, "Boosting progress");
                }
                if let Some(stopper) = stopper.as_mut()
                    && stopper.should_stop(loss)
                {
                    debug!(
                        round,
                        best_round = stopper.best_round(),
                        best_loss = ?stopper.best_loss(),
                        "Early stopping"
                    );
                    break;
                }
            }
        }

        let best_iteration = stopper.as_ref().map(EarlyStopping::best_round);
        if let Some(best) = best_iteration {
            rounds.truncate(best + 1);
        }

        debug!(
            rounds = rounds.len(),
            ?best_iteration,
            leaves = rounds.iter().flatten().map(BoostedTree::n_leaves).sum::<usize>(),
            "Fitted boosted ensemble"
        );

        Ok(Self {
            objective,
            base_score,
            rounds,
            best_iteration,
            n_features,
        })
    }

    /// Total trees kept (rounds × outputs).
    pub fn n_trees(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum()
    }

    /// Zero-based best round when early stopping was active.
    pub fn best_iteration(&self) -> Option<usize> {
        self.best_iteration
    }

    /// Class probabilities `(n_rows, n_classes)`; one column of values for
    /// regression.
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        let scores = self.raw_scores(x)?;
        let n_rows = x.nrows();

        Ok(match self.objective {
            Objective::SquaredError => Array2::from_shape_fn((n_rows, 1), |(i, _)| scores[i]),
            Objective::Logistic => Array2::from_shape_fn((n_rows, 2), |(i, k)| {
                let p = sigmoid(scores[i]);
                if k == 1 { p } else { 1.0 - p }
            }),
            Objective::Softmax { n_classes } => {
                let mut out = Array2::<f64>::zeros((n_rows, n_classes));
                let mut probabilities = vec![0.0; n_classes];
                for (i, mut row) in out.rows_mut().into_iter().enumerate() {
                    softmax_into(&scores, n_rows, i, &mut probabilities);
                    row.assign(&Array1::from(probabilities.clone()));
                }
                out
            }
        })
    }

    /// Class indices (as `f64`) for classification, values for regression.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let scores = self.raw_scores(x)?;
        let n_rows = x.nrows();

        Ok(match self.objective {
            Objective::SquaredError => Array1::from(scores),
            Objective::Logistic => scores
                .iter()
                .map(|&s| if sigmoid(s) > 0.5 { 1.0 } else { 0.0 })
                .collect(),
            Objective::Softmax { n_classes } => (0..n_rows)
                .map(|i| argmax((0..n_classes).map(|k| scores[k * n_rows + i])) as f64)
                .collect(),
        })
    }

    /// Output-major raw scores of every row.
    fn raw_scores(&self, x: ArrayView2<f64>) -> Result<Vec<f64>> {
        if x.ncols() != self.n_features {
            return Err(LearningError::InvalidData(format!(
                "model expects {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let n_rows = x.nrows();
        let mut scores = initial_scores(&self.base_score, n_rows);
        for trees in &self.rounds {
            for (output, tree) in trees.iter().enumerate() {
                for (i, row) in x.rows().into_iter().enumerate() {
                    scores[output * n_rows + i] += tree.predict_row(row);
                }
            }
        }
        Ok(scores)
    }
}

fn initial_scores(base_score: &[f64], n_rows: usize) -> Vec<f64> {
    base_score
        .iter()
        .flat_map(|&score| std::iter::repeat_n(score, n_rows))
        .collect()
}

/// `ceil(n * fraction)`, at least one.
fn sample_size(n: usize, fraction: f64) -> usize {
    ((n as f64 * fraction).ceil() as usize).clamp(1, n.max(1))
}

fn sorted_sample(rng: &mut StdRng, n: usize, amount: usize) -> Vec<usize> {
    if amount >= n {
        return (0..n).collect();
    }
    let mut picked = sample(rng, n, amount).into_vec();
    picked.sort_unstable();
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{accuracy, rmse};

    fn quick_params() -> BoostingParams {
        BoostingParams {
            max_rounds: 60,
            learning_rate: 0.3,
            max_depth: 3,
            ..BoostingParams::default()
        }
    }

    fn three_classes(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 { (i % 3) as f64 * 10.0 + (i % 7) as f64 / 7.0 } else { (i % 5) as f64 }
        });
        let y = Array1::from_shape_fn(n, |i| (i % 3) as f64);
        (x, y)
    }

    #[test]
    fn test_multiclass_softmax() {
        let (x, y) = three_classes(90);
        let task = Task::Classification { n_classes: 3 };
        let model = GradientBoostedTrees::fit(x.view(), &y, None, task, &quick_params(), None, 42)
            .unwrap();

        assert_eq!(model.n_trees(), 60 * 3);
        assert_eq!(model.best_iteration(), None);
        let predictions = model.predict(x.view()).unwrap();
        assert!(accuracy(&y, &predictions) > 0.99);

        let proba = model.predict_proba(x.view()).unwrap();
        assert_eq!(proba.ncols(), 3);
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_regression_fits_linear_trend() {
        let x = Array2::from_shape_fn((100, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(100, |i| 3.0 * i as f64);
        let params = BoostingParams {
            max_rounds: 200,
            subsample: 1.0,
            colsample_bytree: 1.0,
            ..quick_params()
        };
        let model =
            GradientBoostedTrees::fit(x.view(), &y, None, Task::Regression, &params, None, 42)
                .unwrap();
        let predictions = model.predict(x.view()).unwrap();
        assert!(rmse(&y, &predictions) < 10.0);
    }

    #[test]
    fn test_early_stopping_truncates_to_best_round() {
        let (x, y) = three_classes(90);
        // Held-out labels that disagree with the training pattern
        let eval_y = y.mapv(|label| (label + 1.0) % 3.0);
        let params = BoostingParams {
            max_rounds: 500,
            early_stopping_rounds: Some(5),
            ..quick_params()
        };
        let task = Task::Classification { n_classes: 3 };
        let model = GradientBoostedTrees::fit(
            x.view(),
            &y,
            Some((x.view(), &eval_y)),
            task,
            &params,
            None,
            42,
        )
        .unwrap();

        let best = model.best_iteration().unwrap();
        assert!(best < 10, "best round {best}");
        assert_eq!(model.n_trees(), (best + 1) * 3);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (x, y) = three_classes(60);
        let task = Task::Classification { n_classes: 3 };
        let params = BoostingParams {
            max_rounds: 10,
            ..quick_params()
        };
        let a = GradientBoostedTrees::fit(x.view(), &y, None, task, &params, None, 9).unwrap();
        let b = GradientBoostedTrees::fit(x.view(), &y, None, task, &params, None, 9).unwrap();
        assert_eq!(
            a.predict_proba(x.view()).unwrap(),
            b.predict_proba(x.view()).unwrap()
        );
    }

    #[test]
    fn test_class_weight_shifts_binary_predictions() {
        // Overlapping classes: the weighted class should win the shared region
        let x = Array2::from_shape_fn((200, 1), |(i, _)| (i % 4) as f64);
        let y = Array1::from_shape_fn(200, |i| if i % 12 == 0 { 1.0 } else { 0.0 });
        let task = Task::Classification { n_classes: 2 };
        let params = BoostingParams {
            max_rounds: 100,
            subsample: 1.0,
            colsample_bytree: 1.0,
            ..quick_params()
        };

        let plain = GradientBoostedTrees::fit(x.view(), &y, None, task, &params, None, 1).unwrap();
        let weight = ClassWeight {
            class: 1,
            weight: 10.0,
        };
        let weighted =
            GradientBoostedTrees::fit(x.view(), &y, None, task, &params, Some(weight), 1).unwrap();

        let point = Array2::from_elem((1, 1), 0.0);
        let p_plain = plain.predict_proba(point.view()).unwrap()[[0, 1]];
        let p_weighted = weighted.predict_proba(point.view()).unwrap()[[0, 1]];
        assert!(p_plain < 0.5);
        assert!(p_weighted > 0.5);
    }

    #[test]
    fn test_rejects_mismatched_targets() {
        let x = Array2::<f64>::zeros((4, 2));
        let y = Array1::from(vec![0.0, 1.0]);
        let err = GradientBoostedTrees::fit(
            x.view(),
            &y,
            None,
            Task::Regression,
            &quick_params(),
            None,
            42,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATA");
    }
}
