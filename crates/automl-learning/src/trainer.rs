//! Train-and-evaluate runs.
//!
//! [`Trainer`] takes a prepared feature matrix and target, holds out a test
//! partition, fits the configured ensemble on the rest and scores it on the
//! held-out rows.
//!
//! # Stages
//!
//! 1. **Validation** - shapes agree, every value is finite, class labels are
//!    valid indices
//! 2. **Split** - stratified for classification, shuffled for regression
//! 3. **Fit** - random forest, or boosted trees early-stopping on the
//!    held-out rows
//! 4. **Evaluation** - accuracy, or RMSE and R²
//! 5. **Cross-validation** - optional k-fold score over the whole matrix
//!
//! # Example
//!
//! ```
//! use automl_learning::{Task, Trainer, TrainingConfig};
//! use ndarray::{Array1, Array2};
//!
//! let x = Array2::from_shape_fn((50, 2), |(i, j)| (i * (j + 1)) as f64);
//! let y = Array1::from_shape_fn(50, |i| if i < 25 { 0.0 } else { 1.0 });
//!
//! let trainer = Trainer::new(TrainingConfig::default()).unwrap();
//! let outcome = trainer
//!     .fit_evaluate(x.view(), &y, Task::Classification { n_classes: 2 }, None)
//!     .unwrap();
//! assert_eq!(outcome.test_rows, 10);
//! assert!(outcome.metrics.accuracy.unwrap() > 0.8);
//! ```

use crate::boosting::GradientBoostedTrees;
use crate::config::{ModelKind, TrainingConfig};
use crate::error::{LearningError, Result};
use crate::forest::RandomForest;
use crate::metrics::{accuracy, r2, rmse};
use crate::model::TrainedModel;
use crate::split::{Split, k_fold, shuffled_split, stratified_k_fold, stratified_split};
use crate::types::{ClassWeight, Metrics, Task, TrainingOutcome};
use ndarray::{Array1, ArrayView2, Axis};
use std::time::Instant;
use tracing::{debug, info};

/// Fits and evaluates the configured ensemble.
///
/// A `Trainer` is immutable and holds only its configuration, so one
/// instance can serve any number of runs.
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

static_assertions::assert_impl_all!(Trainer: Send, Sync);

impl Trainer {
    /// Create a trainer after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Split, fit, and score the held-out partition.
    ///
    /// # Arguments
    ///
    /// * `x` - Feature matrix, one row per sample, no missing values
    /// * `y` - Target: class indices for classification, values for regression
    /// * `task` - What `y` holds
    /// * `class_weight` - Loss weight for one class; honoured by the boosted
    ///   ensemble only
    ///
    /// # Errors
    ///
    /// - [`InvalidData`](LearningError::InvalidData): mismatched shapes,
    ///   non-finite values, or labels outside `0..n_classes`
    /// - [`InsufficientData`](LearningError::InsufficientData): the rows cannot
    ///   be split (single class, singleton class, too few rows)
    pub fn fit_evaluate(
        &self,
        x: ArrayView2<f64>,
        y: &Array1<f64>,
        task: Task,
        class_weight: Option<ClassWeight>,
    ) -> Result<TrainingOutcome> {
        let started = Instant::now();
        let labels = validate_inputs(x, y, task)?;

        let split = self.split(labels.as_deref(), y.len())?;
        debug!(
            train_rows = split.train.len(),
            test_rows = split.test.len(),
            "Split dataset"
        );

        let (model, mut metrics) = self.fit_and_score(x, y, &split, task, class_weight)?;

        if let Some(folds) = self.config.cv_folds {
            let score = self.cross_validate(x, y, labels.as_deref(), folds, task, class_weight)?;
            metrics.cv_score = Some(score);
        }

        let outcome = TrainingOutcome {
            model: self.config.model,
            metrics,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            n_features: x.ncols(),
            n_trees: model.n_trees(),
            best_iteration: model.best_iteration(),
            training_time_seconds: started.elapsed().as_secs_f64(),
        };

        info!(
            model = %outcome.model,
            accuracy = ?outcome.metrics.accuracy,
            rmse = ?outcome.metrics.rmse,
            r2 = ?outcome.metrics.r2,
            n_trees = outcome.n_trees,
            seconds = outcome.training_time_seconds,
            "Training complete"
        );
        Ok(outcome)
    }

    /// Fit the configured ensemble on every row of `x`.
    ///
    /// No rows are held out, so boosted ensembles run all rounds.
    ///
    /// # Errors
    ///
    /// Same validation errors as [`fit_evaluate`](Self::fit_evaluate).
    pub fn fit(
        &self,
        x: ArrayView2<f64>,
        y: &Array1<f64>,
        task: Task,
        class_weight: Option<ClassWeight>,
    ) -> Result<TrainedModel> {
        validate_inputs(x, y, task)?;
        self.fit_model(x, y, None, task, class_weight)
    }

    fn split(&self, labels: Option<&[usize]>, n_rows: usize) -> Result<Split> {
        match labels {
            Some(labels) => stratified_split(labels, self.config.test_size, self.config.seed),
            None => shuffled_split(n_rows, self.config.test_size, self.config.seed),
        }
    }

    fn fit_model(
        &self,
        x: ArrayView2<f64>,
        y: &Array1<f64>,
        eval: Option<(ArrayView2<f64>, &Array1<f64>)>,
        task: Task,
        class_weight: Option<ClassWeight>,
    ) -> Result<TrainedModel> {
        match self.config.model {
            ModelKind::Forest => {
                RandomForest::fit(x, y, task, &self.config.forest, self.config.seed)
                    .map(TrainedModel::Forest)
            }
            ModelKind::BoostedEnsemble => GradientBoostedTrees::fit(
                x,
                y,
                eval,
                task,
                &self.config.boosting,
                class_weight,
                self.config.seed,
            )
            .map(TrainedModel::Boosted),
        }
    }

    /// Fit on `split.train`, score on `split.test`.
    fn fit_and_score(
        &self,
        x: ArrayView2<f64>,
        y: &Array1<f64>,
        split: &Split,
        task: Task,
        class_weight: Option<ClassWeight>,
    ) -> Result<(TrainedModel, Metrics)> {
        let x_train = x.select(Axis(0), &split.train);
        let y_train = y.select(Axis(0), &split.train);
        let x_test = x.select(Axis(0), &split.test);
        let y_test = y.select(Axis(0), &split.test);

        let model = self.fit_model(
            x_train.view(),
            &y_train,
            Some((x_test.view(), &y_test)),
            task,
            class_weight,
        )?;
        let predictions = model.predict(x_test.view())?;
        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(LearningError::TrainingFailed(format!(
                "{} produced non-finite predictions",
                self.config.model
            )));
        }

        let metrics = match task {
            Task::Classification { .. } => Metrics {
                accuracy: Some(accuracy(&y_test, &predictions)),
                ..Metrics::default()
            },
            Task::Regression => Metrics {
                rmse: Some(rmse(&y_test, &predictions)),
                r2: Some(r2(&y_test, &predictions)),
                ..Metrics::default()
            },
        };
        Ok((model, metrics))
    }

    /// Mean accuracy or mean R² over `folds` folds of the whole matrix.
    fn cross_validate(
        &self,
        x: ArrayView2<f64>,
        y: &Array1<f64>,
        labels: Option<&[usize]>,
        folds: usize,
        task: Task,
        class_weight: Option<ClassWeight>,
    ) -> Result<f64> {
        let splits = match labels {
            Some(labels) => stratified_k_fold(labels, folds, self.config.seed)?,
            None => k_fold(y.len(), folds, self.config.seed)?,
        };

        let mut total = 0.0;
        for (fold, split) in splits.iter().enumerate() {
            let (_, metrics) = self.fit_and_score(x, y, split, task, class_weight)?;
            let score = metrics.accuracy.or(metrics.r2).unwrap_or(0.0);
            debug!(fold, score, "Cross-validation fold");
            total += score;
        }
        Ok(total / splits.len() as f64)
    }
}

/// Check shapes and values; returns class labels for classification.
fn validate_inputs(
    x: ArrayView2<f64>,
    y: &Array1<f64>,
    task: Task,
) -> Result<Option<Vec<usize>>> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(LearningError::InvalidData(format!(
            "feature matrix is empty ({} rows, {} columns)",
            x.nrows(),
            x.ncols()
        )));
    }
    if x.nrows() != y.len() {
        return Err(LearningError::InvalidData(format!(
            "feature matrix has {} rows but the target has {}",
            x.nrows(),
            y.len()
        )));
    }
    if let Some(((row, column), _)) = x.indexed_iter().find(|(_, value)| !value.is_finite()) {
        return Err(LearningError::InvalidData(format!(
            "feature matrix has a non-finite value at row {row}, column {column}"
        )));
    }
    if let Some(row) = y.iter().position(|value| !value.is_finite()) {
        return Err(LearningError::InvalidData(format!(
            "target has a non-finite value at row {row}"
        )));
    }

    match task {
        Task::Regression => Ok(None),
        Task::Classification { n_classes } => y
            .iter()
            .enumerate()
            .map(|(row, &value)| {
                if value >= 0.0 && value.fract() == 0.0 && (value as usize) < n_classes {
                    Ok(value as usize)
                } else {
                    Err(LearningError::InvalidData(format!(
                        "target value {value} at row {row} is not a class index below {n_classes}"
                    )))
                }
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
    }
}
