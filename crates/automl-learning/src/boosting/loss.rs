//! Boosting objectives: gradients, base scores and evaluation losses.
//!
//! Raw scores, gradients and hessians are stored output-major:
//! `scores[k * n_rows + i]` is output `k` of row `i`. Binary and regression
//! objectives have a single output; softmax has one per class.

use crate::types::Task;

/// Lower bound on hessians so leaf weights stay finite.
const HESS_MIN: f64 = 1e-6;

/// Probability clamp used by base scores and log losses.
const PROB_EPS: f64 = 1e-15;

/// Loss being minimized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Objective {
    /// `0.5 * (pred - y)²`, evaluated as RMSE.
    SquaredError,
    /// Binary cross-entropy on `sigmoid(score)`, evaluated as log loss.
    Logistic,
    /// Softmax cross-entropy, evaluated as multiclass log loss.
    Softmax { n_classes: usize },
}

impl Objective {
    pub(crate) fn for_task(task: Task) -> Self {
        match task {
            Task::Regression => Objective::SquaredError,
            Task::Classification { n_classes } if n_classes <= 2 => Objective::Logistic,
            Task::Classification { n_classes } => Objective::Softmax { n_classes },
        }
    }

    pub(crate) fn n_outputs(&self) -> usize {
        match self {
            Objective::Softmax { n_classes } => *n_classes,
            _ => 1,
        }
    }

    /// Initial raw score per output, estimated from the training targets.
    pub(crate) fn base_score(&self, y: &[f64]) -> Vec<f64> {
        let mean = y.iter().sum::<f64>() / y.len().max(1) as f64;
        match self {
            Objective::SquaredError => vec![mean],
            Objective::Logistic => {
                let p = mean.clamp(1e-7, 1.0 - 1e-7);
                vec![(p / (1.0 - p)).ln()]
            }
            Objective::Softmax { n_classes } => vec![0.0; *n_classes],
        }
    }

    /// Fill `grad` / `hess` for every row from the current raw `scores`.
    ///
    /// `weights` holds one multiplier per row.
    pub(crate) fn gradients(
        &self,
        y: &[f64],
        scores: &[f64],
        weights: &[f64],
        grad: &mut [f64],
        hess: &mut [f64],
    ) {
        let n_rows = y.len();
        match self {
            Objective::SquaredError => {
                for i in 0..n_rows {
                    grad[i] = weights[i] * (scores[i] - y[i]);
                    hess[i] = weights[i];
                }
            }
            Objective::Logistic => {
                for i in 0..n_rows {
                    let p = sigmoid(scores[i]);
                    grad[i] = weights[i] * (p - y[i]);
                    hess[i] = (weights[i] * p * (1.0 - p)).max(HESS_MIN);
                }
            }
            Objective::Softmax { n_classes } => {
                let mut probabilities = vec![0.0; *n_classes];
                for i in 0..n_rows {
                    softmax_into(scores, n_rows, i, &mut probabilities);
                    let label = y[i] as usize;
                    for (k, &p) in probabilities.iter().enumerate() {
                        let target = if k == label { 1.0 } else { 0.0 };
                        grad[k * n_rows + i] = weights[i] * (p - target);
                        hess[k * n_rows + i] = (weights[i] * p * (1.0 - p)).max(HESS_MIN);
                    }
                }
            }
        }
    }

    /// Held-out loss of raw `scores` against `y`; lower is better.
    pub(crate) fn eval_loss(&self, y: &[f64], scores: &[f64]) -> f64 {
        let n_rows = y.len();
        if n_rows == 0 {
            return 0.0;
        }
        match self {
            Objective::SquaredError => {
                let mse = y
                    .iter()
                    .zip(scores)
                    .map(|(t, s)| (s - t).powi(2))
                    .sum::<f64>()
                    / n_rows as f64;
                mse.sqrt()
            }
            Objective::Logistic => {
                let total: f64 = y
                    .iter()
                    .zip(scores)
                    .map(|(&t, &s)| {
                        let p = sigmoid(s).clamp(PROB_EPS, 1.0 - PROB_EPS);
                        -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
                    })
                    .sum();
                total / n_rows as f64
            }
            Objective::Softmax { n_classes } => {
                let mut probabilities = vec![0.0; *n_classes];
                let mut total = 0.0;
                for (i, &label) in y.iter().enumerate() {
                    softmax_into(scores, n_rows, i, &mut probabilities);
                    let p = probabilities
                        .get(label as usize)
                        .copied()
                        .unwrap_or(0.0)
                        .clamp(PROB_EPS, 1.0);
                    total -= p.ln();
                }
                total / n_rows as f64
            }
        }
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Softmax of row `row` of output-major `scores` into `out`.
pub(crate) fn softmax_into(scores: &[f64], n_rows: usize, row: usize, out: &mut [f64]) {
    let max = (0..out.len())
        .map(|k| scores[k * n_rows + row])
        .fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for (k, slot) in out.iter_mut().enumerate() {
        *slot = (scores[k * n_rows + row] - max).exp();
        sum += *slot;
    }
    for slot in out.iter_mut() {
        *slot /= sum;
    }
}
