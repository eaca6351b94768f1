//! Common types used throughout the automl-learning crate.
//!
//! - [`Task`]: what the ensemble predicts
//! - [`ClassWeight`]: extra loss weight for one class
//! - [`Metrics`]: held-out evaluation metrics
//! - [`TrainingOutcome`]: everything a train-and-evaluate run reports

use crate::config::ModelKind;
use serde::{Deserialize, Serialize};

/// The learning task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    /// Targets are class indices `0..n_classes` stored as `f64`.
    Classification { n_classes: usize },
    /// Targets are real values.
    Regression,
}

impl Task {
    #[must_use]
    pub fn is_classification(&self) -> bool {
        matches!(self, Task::Classification { .. })
    }

    /// Number of classes, 0 for regression.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        match self {
            Task::Classification { n_classes } => *n_classes,
            Task::Regression => 0,
        }
    }
}

/// Multiplies the loss of every row of `class` by `weight`.
///
/// Used to counter binary class imbalance in the boosted ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassWeight {
    pub class: usize,
    pub weight: f64,
}

/// Evaluation metrics on the held-out partition.
///
/// Classification runs fill `accuracy`; regression runs fill `rmse` and `r2`.
/// `cv_score` is present only when cross-validation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rmse: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2: Option<f64>,

    /// Mean accuracy (classification) or mean R² (regression) across folds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_score: Option<f64>,
}

/// Result of [`Trainer::fit_evaluate`](crate::Trainer::fit_evaluate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    /// Ensemble that produced the metrics.
    pub model: ModelKind,

    /// Held-out metrics.
    pub metrics: Metrics,

    /// Rows in the training partition.
    pub train_rows: usize,

    /// Rows in the held-out partition.
    pub test_rows: usize,

    /// Columns of the feature matrix.
    pub n_features: usize,

    /// Trees in the final ensemble (rounds × trees per round for boosting).
    pub n_trees: usize,

    /// Zero-based best boosting round when early stopping was active.
    pub best_iteration: Option<usize>,

    /// Wall-clock seconds spent fitting and evaluating.
    pub training_time_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_helpers() {
        let task = Task::Classification { n_classes: 3 };
        assert!(task.is_classification());
        assert_eq!(task.n_classes(), 3);
        assert_eq!(Task::Regression.n_classes(), 0);
    }

    #[test]
    fn test_metrics_serialization_skips_missing() {
        let metrics = Metrics {
            accuracy: Some(0.93),
            ..Metrics::default()
        };
        let json = serde_json::to_string(&metrics).unwrap();
        assert_eq!(json, r#"{"accuracy":0.93}"#);
    }
}
