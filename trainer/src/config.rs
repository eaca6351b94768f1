//! Configuration of a whole pipeline run.
//!
//! [`PipelineConfig`] is the single flat set of knobs for one run. The fast
//! and the high-accuracy variants are the two presets
//! [`PipelineConfig::light`] and [`PipelineConfig::heavy`]; they differ only
//! in values, never in code path. The preparation and training stages see
//! the projections [`PipelineConfig::preparation`] and
//! [`PipelineConfig::training`].

use automl_learning::{
    BoostingParams, DEFAULT_SEED, DEFAULT_TEST_SIZE, ForestParams, LearningError, ModelKind,
    TrainingConfig,
};
use automl_processing::{
    DEFAULT_CLASSIFICATION_CARDINALITY, DEFAULT_COERCION_TOLERANCE, DEFAULT_DOWNLOAD_TIMEOUT_SECS,
    DEFAULT_HIGH_CARDINALITY_CEILING, DEFAULT_INTERACTION_PREFIX, DEFAULT_MIN_CLASS_COUNT,
    DEFAULT_ONE_HOT_THRESHOLD, DEFAULT_ROW_CAP_HEAVY, DEFAULT_ROW_CAP_LIGHT, NumericImputation,
    PreparationConfig, TargetPolicy,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timeout for posting the result record to a callback URL.
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 10;

/// Named preset of [`PipelineConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Small row cap, label encoding, random forest.
    #[default]
    Light,
    /// Large row cap, one-hot encoding, feature engineering, boosted trees.
    Heavy,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Light => "light",
            Profile::Heavy => "heavy",
        }
    }

    /// The preset this profile names.
    pub fn config(&self) -> PipelineConfig {
        match self {
            Profile::Light => PipelineConfig::light(),
            Profile::Heavy => PipelineConfig::heavy(),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Profile::Light),
            "heavy" => Ok(Profile::Heavy),
            other => Err(ConfigValidationError::UnknownProfile(other.to_string())),
        }
    }
}

/// Every setting of a pipeline run.
///
/// Missing fields in a JSON config file fall back to the light preset.
///
/// # Example
///
/// ```
/// use automl_trainer::{ModelKind, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .row_cap(1_000)
///     .model_kind(ModelKind::BoostedEnsemble)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.row_cap, 1_000);
/// assert_eq!(config.training().model, ModelKind::BoostedEnsemble);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of data rows read from the source.
    /// Default: 7500 (light), 50000 (heavy)
    pub row_cap: usize,

    /// Timeout for fetching a remote dataset, in seconds.
    pub download_timeout_secs: u64,

    /// Timeout for posting the result to a callback URL, in seconds.
    pub callback_timeout_secs: u64,

    /// Ensemble family to fit.
    /// Default: Forest (light), BoostedEnsemble (heavy)
    pub model_kind: ModelKind,

    /// How the target column is identified.
    pub target_policy: TargetPolicy,

    /// Categorical features with more distinct values are dropped.
    /// Default: None (light), Some(500) (heavy)
    pub high_cardinality_ceiling: Option<usize>,

    /// Statistic used to fill missing numeric values.
    /// Default: Median (light), Mean (heavy)
    pub numeric_imputation: NumericImputation,

    /// Categorical features with fewer distinct values are one-hot encoded;
    /// `None` label-encodes everything.
    /// Default: None (light), Some(10) (heavy)
    pub one_hot_threshold: Option<usize>,

    /// Add pairwise products of the leading numeric features.
    pub enable_interactions: bool,

    /// Number of leading numeric features used for interactions.
    pub interaction_prefix: usize,

    /// Standardize numeric features.
    pub enable_scaling: bool,

    /// Targets with fewer distinct values are classification targets.
    /// Default: 15
    pub classification_cardinality: usize,

    /// Try numeric coercion of a string target.
    pub enable_target_coercion: bool,

    /// Share of values allowed to fail coercion.
    /// Default: 0.05
    pub coercion_tolerance: f64,

    /// Drop classes with fewer than `min_class_count` rows.
    pub enable_rare_class_filter: bool,

    pub min_class_count: usize,

    /// Up-weight the minority class of a binary target.
    pub enable_imbalance_weighting: bool,

    /// Fraction of rows held out for evaluation.
    /// Default: 0.2
    pub test_size: f64,

    /// Seed for every random step.
    /// Default: 42
    pub seed: u64,

    /// Folds for an optional cross-validation score.
    pub cv_folds: Option<usize>,

    /// Random forest sizing.
    pub forest: ForestParams,

    /// Gradient boosting sizing.
    pub boosting: BoostingParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::light()
    }
}

impl PipelineConfig {
    /// The fast variant.
    pub fn light() -> Self {
        Self {
            row_cap: DEFAULT_ROW_CAP_LIGHT,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            callback_timeout_secs: DEFAULT_CALLBACK_TIMEOUT_SECS,
            model_kind: ModelKind::Forest,
            target_policy: TargetPolicy::LastColumn,
            high_cardinality_ceiling: None,
            numeric_imputation: NumericImputation::Median,
            one_hot_threshold: None,
            enable_interactions: false,
            interaction_prefix: DEFAULT_INTERACTION_PREFIX,
            enable_scaling: false,
            classification_cardinality: DEFAULT_CLASSIFICATION_CARDINALITY,
            enable_target_coercion: true,
            coercion_tolerance: DEFAULT_COERCION_TOLERANCE,
            enable_rare_class_filter: false,
            min_class_count: DEFAULT_MIN_CLASS_COUNT,
            enable_imbalance_weighting: false,
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
            cv_folds: None,
            forest: ForestParams::default(),
            boosting: BoostingParams::default(),
        }
    }

    /// The high-accuracy variant.
    pub fn heavy() -> Self {
        Self {
            row_cap: DEFAULT_ROW_CAP_HEAVY,
            model_kind: ModelKind::BoostedEnsemble,
            high_cardinality_ceiling: Some(DEFAULT_HIGH_CARDINALITY_CEILING),
            numeric_imputation: NumericImputation::Mean,
            one_hot_threshold: Some(DEFAULT_ONE_HOT_THRESHOLD),
            enable_interactions: true,
            enable_scaling: true,
            enable_target_coercion: false,
            enable_rare_class_filter: true,
            enable_imbalance_weighting: true,
            ..Self::light()
        }
    }

    /// Create a builder seeded with the light preset.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new(Profile::Light)
    }

    /// Settings of the loader-independent preparation stages.
    pub fn preparation(&self) -> PreparationConfig {
        PreparationConfig {
            target_policy: self.target_policy.clone(),
            high_cardinality_ceiling: self.high_cardinality_ceiling,
            numeric_imputation: self.numeric_imputation,
            one_hot_threshold: self.one_hot_threshold,
            enable_interactions: self.enable_interactions,
            interaction_prefix: self.interaction_prefix,
            enable_scaling: self.enable_scaling,
            classification_cardinality: self.classification_cardinality,
            enable_target_coercion: self.enable_target_coercion,
            coercion_tolerance: self.coercion_tolerance,
            enable_rare_class_filter: self.enable_rare_class_filter,
            min_class_count: self.min_class_count,
            enable_imbalance_weighting: self.enable_imbalance_weighting,
        }
    }

    /// Settings of the training stage.
    pub fn training(&self) -> TrainingConfig {
        TrainingConfig {
            model: self.model_kind,
            test_size: self.test_size,
            seed: self.seed,
            cv_folds: self.cv_folds,
            forest: self.forest.clone(),
            boosting: self.boosting.clone(),
        }
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.row_cap == 0 {
            return Err(ConfigValidationError::Zero("row_cap"));
        }
        if self.download_timeout_secs == 0 {
            return Err(ConfigValidationError::Zero("download_timeout_secs"));
        }
        if self.callback_timeout_secs == 0 {
            return Err(ConfigValidationError::Zero("callback_timeout_secs"));
        }
        self.preparation().validate()?;
        self.training().validate()?;
        Ok(())
    }
}

/// Builder for [`PipelineConfig`], starting from a preset.
#[derive(Debug, Clone)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new(Profile::Light)
    }
}

impl PipelineConfigBuilder {
    /// Start from the preset named by `profile`.
    pub fn new(profile: Profile) -> Self {
        Self {
            config: profile.config(),
        }
    }

    pub fn row_cap(mut self, rows: usize) -> Self {
        self.config.row_cap = rows;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn callback_timeout_secs(mut self, secs: u64) -> Self {
        self.config.callback_timeout_secs = secs;
        self
    }

    pub fn model_kind(mut self, kind: ModelKind) -> Self {
        self.config.model_kind = kind;
        self
    }

    /// Use the named column as target instead of the last one.
    pub fn target_column(mut self, name: impl Into<String>) -> Self {
        self.config.target_policy = TargetPolicy::Named(name.into());
        self
    }

    pub fn high_cardinality_ceiling(mut self, ceiling: Option<usize>) -> Self {
        self.config.high_cardinality_ceiling = ceiling;
        self
    }

    pub fn numeric_imputation(mut self, strategy: NumericImputation) -> Self {
        self.config.numeric_imputation = strategy;
        self
    }

    pub fn one_hot_threshold(mut self, threshold: Option<usize>) -> Self {
        self.config.one_hot_threshold = threshold;
        self
    }

    pub fn enable_interactions(mut self, enable: bool) -> Self {
        self.config.enable_interactions = enable;
        self
    }

    pub fn enable_scaling(mut self, enable: bool) -> Self {
        self.config.enable_scaling = enable;
        self
    }

    pub fn classification_cardinality(mut self, cardinality: usize) -> Self {
        self.config.classification_cardinality = cardinality;
        self
    }

    pub fn enable_target_coercion(mut self, enable: bool) -> Self {
        self.config.enable_target_coercion = enable;
        self
    }

    pub fn enable_rare_class_filter(mut self, enable: bool) -> Self {
        self.config.enable_rare_class_filter = enable;
        self
    }

    pub fn enable_imbalance_weighting(mut self, enable: bool) -> Self {
        self.config.enable_imbalance_weighting = enable;
        self
    }

    pub fn test_size(mut self, size: f64) -> Self {
        self.config.test_size = size;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Report a k-fold cross-validation score alongside the holdout metrics.
    pub fn cv_folds(mut self, folds: usize) -> Self {
        self.config.cv_folds = Some(folds);
        self
    }

    pub fn forest(mut self, params: ForestParams) -> Self {
        self.config.forest = params;
        self
    }

    pub fn boosting(mut self, params: BoostingParams) -> Self {
        self.config.boosting = params;
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{0}': must be greater than zero")]
    Zero(&'static str),

    #[error("Unknown profile '{0}' (expected 'light' or 'heavy')")]
    UnknownProfile(String),

    #[error(transparent)]
    Preparation(#[from] automl_processing::ConfigValidationError),

    #[error(transparent)]
    Training(#[from] LearningError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_preset() {
        let config = PipelineConfig::light();
        assert_eq!(config.row_cap, 7_500);
        assert_eq!(config.model_kind, ModelKind::Forest);
        assert_eq!(config.one_hot_threshold, None);
        assert!(!config.enable_interactions);
        assert!(!config.enable_scaling);
        assert!(!config.enable_rare_class_filter);
        assert!(config.validate().is_ok());
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_heavy_preset() {
        let config = PipelineConfig::heavy();
        assert_eq!(config.row_cap, 50_000);
        assert_eq!(config.model_kind, ModelKind::BoostedEnsemble);
        assert_eq!(config.one_hot_threshold, Some(10));
        assert_eq!(config.high_cardinality_ceiling, Some(500));
        assert!(config.enable_interactions);
        assert!(config.enable_scaling);
        assert!(config.enable_rare_class_filter);
        assert!(config.enable_imbalance_weighting);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_projections_match_stage_presets() {
        assert_eq!(
            PipelineConfig::light().preparation(),
            PreparationConfig::light()
        );
        assert_eq!(
            PipelineConfig::heavy().preparation(),
            PreparationConfig::heavy()
        );

        let training = PipelineConfig::heavy().training();
        assert_eq!(training.model, ModelKind::BoostedEnsemble);
        assert_eq!(training.test_size, 0.2);
        assert_eq!(training.seed, 42);
    }

    #[test]
    fn test_builder_overrides_preset() {
        let config = PipelineConfigBuilder::new(Profile::Heavy)
            .row_cap(100)
            .target_column("price")
            .enable_interactions(false)
            .cv_folds(3)
            .build()
            .unwrap();

        assert_eq!(config.row_cap, 100);
        assert_eq!(config.target_policy, TargetPolicy::Named("price".into()));
        assert!(!config.enable_interactions);
        assert_eq!(config.cv_folds, Some(3));
        assert_eq!(config.model_kind, ModelKind::BoostedEnsemble);
    }

    #[test]
    fn test_validation_errors() {
        let zero = PipelineConfig::builder().row_cap(0).build();
        assert!(matches!(zero, Err(ConfigValidationError::Zero("row_cap"))));

        let tolerance = PipelineConfig {
            coercion_tolerance: 2.0,
            ..PipelineConfig::light()
        };
        assert!(matches!(
            tolerance.validate(),
            Err(ConfigValidationError::Preparation(_))
        ));

        let split = PipelineConfig::builder().test_size(1.5).build();
        assert!(matches!(split, Err(ConfigValidationError::Training(_))));

        let target = PipelineConfig::builder().target_column("  ").build();
        assert!(target.is_err());
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!("Heavy".parse::<Profile>().unwrap(), Profile::Heavy);
        assert_eq!(" light ".parse::<Profile>().unwrap(), Profile::Light);
        assert!("medium".parse::<Profile>().is_err());
        assert_eq!(Profile::Heavy.config(), PipelineConfig::heavy());
    }

    #[test]
    fn test_config_serialization() {
        let config = PipelineConfig::heavy();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        // Omitted fields come from the light preset
        let partial: PipelineConfig =
            serde_json::from_str(r#"{"row_cap": 200, "model_kind": "boosted_ensemble"}"#).unwrap();
        assert_eq!(partial.row_cap, 200);
        assert_eq!(partial.model_kind, ModelKind::BoostedEnsemble);
        assert_eq!(partial.one_hot_threshold, None);
    }
}
