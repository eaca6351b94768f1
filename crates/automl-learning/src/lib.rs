//! automl-learning: tree-ensemble training and evaluation.
//!
//! This crate fits tree ensembles on a prepared numeric feature matrix and
//! reports held-out metrics. It is pure Rust: no external runtime, no
//! native ML libraries.
//!
//! # Features
//!
//! - **Random forest**: bagged CART trees, Gini or squared-error splits,
//!   probability-averaging vote
//! - **Gradient-boosted trees**: histogram splits, row and column
//!   subsampling, logistic / softmax / squared-error objectives, early
//!   stopping on the held-out loss
//! - **Seeded splits**: stratified train/test split for classification,
//!   shuffled for regression, plus k-fold cross-validation
//! - **Class weighting**: up-weight one class in the boosted loss
//!
//! # Quick Start
//!
//! ```
//! use automl_learning::{ModelKind, Task, Trainer, TrainingConfig};
//! use ndarray::{Array1, Array2};
//!
//! let x = Array2::from_shape_fn((60, 2), |(i, j)| ((i % 2) * 5 + j) as f64 + (i % 7) as f64 / 10.0);
//! let y = Array1::from_shape_fn(60, |i| (i % 2) as f64);
//!
//! let config = TrainingConfig::builder()
//!     .model(ModelKind::Forest)
//!     .build()?;
//! let outcome = Trainer::new(config)?
//!     .fit_evaluate(x.view(), &y, Task::Classification { n_classes: 2 }, None)?;
//!
//! println!("{} accuracy: {:?}", outcome.model, outcome.metrics.accuracy);
//! # Ok::<(), automl_learning::LearningError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! TrainingConfig ──► Trainer::fit_evaluate ──► TrainingOutcome
//!                        │
//!                        ├── split      (stratified / shuffled / k-fold)
//!                        ├── forest     (RandomForest over tree::DecisionTree)
//!                        ├── boosting   (GradientBoostedTrees over binned histograms)
//!                        └── metrics    (accuracy, RMSE, R²)
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, LearningError>`](LearningError):
//!
//! - [`LearningError::InvalidConfig`] - Invalid training configuration
//! - [`LearningError::InvalidData`] - Mismatched shapes or non-finite values
//! - [`LearningError::InsufficientData`] - The rows cannot be split as requested
//! - [`LearningError::TrainingFailed`] - A model produced unusable output
//!
//! # Determinism
//!
//! Every random step (splits, bootstraps, row and column sampling) draws
//! from a [`StdRng`](rand::rngs::StdRng) seeded from
//! [`TrainingConfig::seed`], so a run is reproducible for a fixed input.
//!
//! # Thread Safety
//!
//! [`Trainer`] holds only its configuration and is `Send + Sync`. Fitting
//! runs on the calling thread.

mod boosting;
mod config;
mod error;
mod forest;
pub mod metrics;
mod model;
pub mod split;
mod trainer;
pub mod tree;
mod types;

// Re-export public API
//
// Configuration types
pub use config::{
    BoostingParams, DEFAULT_SEED, DEFAULT_TEST_SIZE, ForestParams, MaxFeatures, ModelKind,
    TrainingConfig, TrainingConfigBuilder,
};
// Error types
pub use error::LearningError;
// Ensembles
pub use boosting::GradientBoostedTrees;
pub use forest::RandomForest;
pub use model::TrainedModel;
// Trainer
pub use trainer::Trainer;
// Task, metrics and outcome types
pub use types::{ClassWeight, Metrics, Task, TrainingOutcome};
