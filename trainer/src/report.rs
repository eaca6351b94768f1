//! The result record of a pipeline run.
//!
//! A [`ResultRecord`] is built exactly once, from either a finished training
//! run or the error that stopped it, and is immutable afterwards. It is what
//! the CLI prints and what callback sinks receive.

use crate::error::PipelineError;
use automl_learning::{ClassWeight, Metrics, ModelKind, TrainingOutcome};
use automl_processing::{PreparedDataset, ProblemType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Complete,
    Error,
}

/// What the run trained on and what it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Display name of the fitted ensemble.
    pub model: String,
    pub target: String,
    /// Rows read from the source, before any filtering.
    pub rows_loaded: usize,
    /// Rows that reached the trainer.
    pub rows_used: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Columns of the prepared feature matrix.
    pub features: usize,
    pub dropped_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_classes: Vec<String>,
    /// Whether a string target was coerced to numbers.
    pub target_coerced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_weight: Option<ClassWeight>,
    pub n_trees: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_iteration: Option<usize>,
    pub training_time_seconds: f64,
}

impl TrainingSummary {
    pub fn new(
        dataset: &PreparedDataset,
        outcome: &TrainingOutcome,
        class_weight: Option<ClassWeight>,
    ) -> Self {
        Self {
            model: outcome.model.display_name().to_string(),
            target: dataset.analysis.target.clone(),
            rows_loaded: dataset.analysis.rows_loaded,
            rows_used: dataset.features.n_rows(),
            train_rows: outcome.train_rows,
            test_rows: outcome.test_rows,
            features: dataset.features.n_features(),
            dropped_columns: dataset.analysis.dropped_columns(),
            classes: dataset.target.classes.clone(),
            removed_classes: dataset.target.removed_classes.clone(),
            target_coerced: dataset.target.coerced,
            class_weight,
            n_trees: outcome.n_trees,
            best_iteration: outcome.best_iteration,
            training_time_seconds: outcome.training_time_seconds,
        }
    }
}

/// Outcome of one pipeline run, as reported to the requester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<ProblemType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Held-out accuracy as a percentage, for classification runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_formatted: Option<String>,
    /// Identity of the requester.
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<TrainingSummary>,
    /// Code and message of the failure, for `Error` records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub completed_at: DateTime<Utc>,
}

/// Serialized form of a [`PipelineError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl From<&PipelineError> for ErrorInfo {
    fn from(err: &PipelineError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

impl ResultRecord {
    /// Record of a run that trained and evaluated a model.
    pub fn complete(
        email: impl Into<String>,
        problem_type: ProblemType,
        outcome: &TrainingOutcome,
        summary: TrainingSummary,
    ) -> Self {
        Self {
            status: RunStatus::Complete,
            problem_type: Some(problem_type),
            metrics: Some(outcome.metrics),
            message: success_message(problem_type, &outcome.metrics, outcome.model, summary.rows_used),
            details: Some(details_line(problem_type, &outcome.metrics)),
            accuracy_formatted: outcome.metrics.accuracy.map(format_percent),
            email: email.into(),
            summary: Some(summary),
            error: None,
            completed_at: Utc::now(),
        }
    }

    /// Record of a run that stopped at `err`.
    pub fn failed(email: impl Into<String>, err: &PipelineError) -> Self {
        Self {
            status: RunStatus::Error,
            problem_type: None,
            metrics: None,
            message: format!("Training failed: {err}"),
            details: None,
            accuracy_formatted: None,
            email: email.into(),
            summary: None,
            error: Some(ErrorInfo::from(err)),
            completed_at: Utc::now(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }
}

/// Headline message of a successful run.
///
/// Boosted runs use the high-accuracy wording.
///
/// ```
/// use automl_learning::{Metrics, ModelKind};
/// use automl_processing::ProblemType;
/// use automl_trainer::report::success_message;
///
/// let metrics = Metrics { accuracy: Some(0.93), ..Metrics::default() };
/// assert_eq!(
///     success_message(ProblemType::Classification, &metrics, ModelKind::Forest, 120),
///     "Training successful! Accuracy: 93.00% (Model: Random Forest)",
/// );
/// ```
pub fn success_message(
    problem_type: ProblemType,
    metrics: &Metrics,
    model: ModelKind,
    rows: usize,
) -> String {
    let accuracy = format_percent(metrics.accuracy.unwrap_or(0.0));
    match (model, problem_type) {
        (ModelKind::BoostedEnsemble, ProblemType::Classification) => {
            format!("High-precision model trained! Accuracy boosted to {accuracy}.")
        }
        (ModelKind::BoostedEnsemble, ProblemType::Regression) => {
            format!("Cloud training successful! (Trained on {rows} rows)")
        }
        (ModelKind::Forest, ProblemType::Classification) => format!(
            "Training successful! Accuracy: {accuracy} (Model: {})",
            model.display_name()
        ),
        (ModelKind::Forest, ProblemType::Regression) => format!(
            "Training successful! (Model: {}, trained on {rows} rows)",
            model.display_name()
        ),
    }
}

fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// One-line metric summary of a successful run.
pub fn details_line(problem_type: ProblemType, metrics: &Metrics) -> String {
    match problem_type {
        ProblemType::Classification => {
            format!("Accuracy: {}", format_percent(metrics.accuracy.unwrap_or(0.0)))
        }
        ProblemType::Regression => format!(
            "RMSE: {:.2}, R2 Score: {:.4}",
            metrics.rmse.unwrap_or(0.0),
            metrics.r2.unwrap_or(0.0)
        ),
    }
}
