//! Configuration types for model training.
//!
//! This module provides [`TrainingConfig`] and its builder, the model
//! selector [`ModelKind`], and the hyperparameters of both ensembles.
//!
//! # Example
//!
//! ```
//! use automl_learning::{ModelKind, TrainingConfig};
//!
//! let config = TrainingConfig::builder()
//!     .model(ModelKind::BoostedEnsemble)
//!     .test_size(0.2)
//!     .seed(7)
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::LearningError;
use serde::{Deserialize, Serialize};

/// Seed used for splits and every sampling step unless overridden.
pub const DEFAULT_SEED: u64 = 42;

/// Fraction of rows held out for evaluation.
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Which tree ensemble to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Bagged CART trees with per-split feature subsampling.
    #[default]
    Forest,

    /// Histogram-based gradient-boosted trees with early stopping.
    BoostedEnsemble,
}

impl ModelKind {
    /// Human-readable model name used in result messages.
    ///
    /// # Examples
    ///
    /// ```
    /// use automl_learning::ModelKind;
    ///
    /// assert_eq!(ModelKind::Forest.display_name(), "Random Forest");
    /// ```
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::Forest => "Random Forest",
            ModelKind::BoostedEnsemble => "Gradient Boosted Trees",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// How many features a forest split may look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least one.
    Sqrt,
    /// Every feature.
    All,
    /// A fixed count, clamped to `1..=n_features`.
    Count(usize),
}

impl MaxFeatures {
    /// Resolve to a concrete feature count.
    #[must_use]
    pub fn resolve(&self, n_features: usize) -> usize {
        let count = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(count) => *count,
        };
        count.clamp(1, n_features.max(1))
    }
}

/// Hyperparameters of the random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees (default: 50).
    pub n_trees: usize,

    /// Maximum tree depth (default: 12). `None` grows until leaves are pure.
    pub max_depth: Option<usize>,

    /// Minimum samples a node needs to be split (default: 5).
    pub min_samples_split: usize,

    /// Features examined per split.
    ///
    /// `None` picks [`MaxFeatures::Sqrt`] for classification and
    /// [`MaxFeatures::All`] for regression.
    pub max_features: Option<MaxFeatures>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: Some(12),
            min_samples_split: 5,
            max_features: None,
        }
    }
}

/// Hyperparameters of the gradient-boosted ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    /// Upper bound on boosting rounds (default: 2000).
    pub max_rounds: usize,

    /// Maximum depth of each tree (default: 7).
    pub max_depth: usize,

    /// Shrinkage applied to every leaf weight (default: 0.02).
    pub learning_rate: f64,

    /// Fraction of rows sampled for each round (default: 0.8).
    pub subsample: f64,

    /// Fraction of features sampled for each tree (default: 0.9).
    pub colsample_bytree: f64,

    /// L2 regularization on leaf weights (default: 1.0).
    pub lambda: f64,

    /// Minimum hessian sum on each side of a split (default: 1.0).
    pub min_child_weight: f64,

    /// Maximum histogram bins per feature, at most 256 (default: 256).
    pub max_bins: usize,

    /// Stop after this many rounds without improvement of the held-out
    /// loss (default: 100). `None` always runs `max_rounds`.
    pub early_stopping_rounds: Option<usize>,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            max_rounds: 2000,
            max_depth: 7,
            learning_rate: 0.02,
            subsample: 0.8,
            colsample_bytree: 0.9,
            lambda: 1.0,
            min_child_weight: 1.0,
            max_bins: 256,
            early_stopping_rounds: Some(100),
        }
    }
}

/// Configuration for a train-and-evaluate run.
///
/// Use [`TrainingConfig::builder()`] to construct a validated configuration.
///
/// # Validation
///
/// - `test_size` must be in range `(0.0, 1.0)` (exclusive)
/// - `cv_folds`, when set, must be at least 2
/// - `forest.n_trees`, `boosting.max_rounds` and `boosting.max_depth` must be at least 1
/// - `boosting.learning_rate` must be positive
/// - `boosting.subsample` and `boosting.colsample_bytree` must be in `(0.0, 1.0]`
/// - `boosting.max_bins` must be in `2..=256`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Ensemble to fit (default: Forest).
    pub model: ModelKind,

    /// Fraction of rows held out for evaluation (default: 0.2).
    pub test_size: f64,

    /// Random seed for splits and sampling (default: 42).
    pub seed: u64,

    /// Number of cross-validation folds on the whole dataset (default: None).
    ///
    /// When set, a mean cross-validated score is reported next to the
    /// held-out metrics.
    pub cv_folds: Option<usize>,

    /// Random forest hyperparameters.
    pub forest: ForestParams,

    /// Gradient boosting hyperparameters.
    pub boosting: BoostingParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
            cv_folds: None,
            forest: ForestParams::default(),
            boosting: BoostingParams::default(),
        }
    }
}

impl TrainingConfig {
    /// Create a new builder for `TrainingConfig`.
    #[must_use]
    pub fn builder() -> TrainingConfigBuilder {
        TrainingConfigBuilder::default()
    }

    /// Check every constraint listed on the type.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] naming the first violated constraint.
    pub fn validate(&self) -> Result<(), LearningError> {
        if self.test_size <= 0.0 || self.test_size >= 1.0 {
            return Err(LearningError::InvalidConfig(
                "test_size must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }

        if let Some(folds) = self.cv_folds
            && folds < 2
        {
            return Err(LearningError::InvalidConfig(
                "cv_folds must be at least 2".to_string(),
            ));
        }

        if self.forest.n_trees == 0 {
            return Err(LearningError::InvalidConfig(
                "forest.n_trees must be at least 1".to_string(),
            ));
        }

        if self.forest.min_samples_split < 2 {
            return Err(LearningError::InvalidConfig(
                "forest.min_samples_split must be at least 2".to_string(),
            ));
        }

        let boosting = &self.boosting;
        if boosting.max_rounds == 0 || boosting.max_depth == 0 {
            return Err(LearningError::InvalidConfig(
                "boosting.max_rounds and boosting.max_depth must be at least 1".to_string(),
            ));
        }

        if !(boosting.learning_rate > 0.0) {
            return Err(LearningError::InvalidConfig(
                "boosting.learning_rate must be positive".to_string(),
            ));
        }

        for (name, value) in [
            ("boosting.subsample", boosting.subsample),
            ("boosting.colsample_bytree", boosting.colsample_bytree),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(LearningError::InvalidConfig(format!(
                    "{name} must be in (0.0, 1.0], got {value}"
                )));
            }
        }

        if !(2..=256).contains(&boosting.max_bins) {
            return Err(LearningError::InvalidConfig(
                "boosting.max_bins must be between 2 and 256".to_string(),
            ));
        }

        if boosting.lambda < 0.0 || boosting.min_child_weight < 0.0 {
            return Err(LearningError::InvalidConfig(
                "boosting.lambda and boosting.min_child_weight must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`TrainingConfig`].
///
/// Created via [`TrainingConfig::builder()`]. All setters return `self` to allow
/// method chaining.
#[derive(Debug, Clone, Default)]
pub struct TrainingConfigBuilder {
    config: TrainingConfig,
}

impl TrainingConfigBuilder {
    /// Set the ensemble to fit.
    #[must_use]
    pub fn model(mut self, model: ModelKind) -> Self {
        self.config.model = model;
        self
    }

    /// Set the held-out fraction (default: 0.2).
    #[must_use]
    pub fn test_size(mut self, size: f64) -> Self {
        self.config.test_size = size;
        self
    }

    /// Set the random seed (default: 42).
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Enable k-fold cross-validation with `folds` folds.
    #[must_use]
    pub fn cv_folds(mut self, folds: usize) -> Self {
        self.config.cv_folds = Some(folds);
        self
    }

    /// Replace the forest hyperparameters.
    #[must_use]
    pub fn forest(mut self, params: ForestParams) -> Self {
        self.config.forest = params;
        self
    }

    /// Replace the boosting hyperparameters.
    #[must_use]
    pub fn boosting(mut self, params: BoostingParams) -> Self {
        self.config.boosting = params;
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] if any constraint documented on
    /// [`TrainingConfig`] is violated.
    pub fn build(self) -> Result<TrainingConfig, LearningError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
