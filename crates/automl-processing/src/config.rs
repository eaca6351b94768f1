//! Configuration types for dataset preparation.
//!
//! Every heuristic threshold the preparation stages use is a named constant
//! here and an overridable field on [`PreparationConfig`]. The two presets,
//! [`PreparationConfig::light`] and [`PreparationConfig::heavy`], reproduce the
//! fast and the high-accuracy variants of the pipeline.

use serde::{Deserialize, Serialize};

/// Row cap of the fast variant.
pub const DEFAULT_ROW_CAP_LIGHT: usize = 7_500;

/// Row cap of the high-accuracy variant.
pub const DEFAULT_ROW_CAP_HEAVY: usize = 50_000;

/// Targets with fewer distinct values than this are treated as classification.
pub const DEFAULT_CLASSIFICATION_CARDINALITY: usize = 15;

/// Categorical features with more distinct values than this are dropped (heavy only).
pub const DEFAULT_HIGH_CARDINALITY_CEILING: usize = 500;

/// Maximum share of target values that may fail numeric coercion (light only).
pub const DEFAULT_COERCION_TOLERANCE: f64 = 0.05;

/// Categorical features with fewer distinct values than this are one-hot encoded (heavy only).
pub const DEFAULT_ONE_HOT_THRESHOLD: usize = 10;

/// Number of leading numeric columns that take part in pairwise interactions.
pub const DEFAULT_INTERACTION_PREFIX: usize = 4;

/// Classes with fewer rows than this are removed by the rare-class filter.
pub const DEFAULT_MIN_CLASS_COUNT: usize = 2;

/// Category used to fill missing categorical values.
pub const MISSING_CATEGORY: &str = "Missing";

/// How the target column is identified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "column", rename_all = "snake_case")]
pub enum TargetPolicy {
    /// The last column in source order.
    #[default]
    LastColumn,
    /// An explicitly named column.
    Named(String),
}

/// Strategy for imputing missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NumericImputation {
    /// Use the mean of non-null values
    Mean,
    /// Use the median of non-null values
    #[default]
    Median,
}

impl NumericImputation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
        }
    }
}

/// Configuration for stages 2-4 of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparationConfig {
    /// How the target column is chosen.
    /// Default: last column
    pub target_policy: TargetPolicy,

    /// Categorical features with more distinct values than this are dropped.
    /// `None` disables the ceiling.
    /// Default: None
    pub high_cardinality_ceiling: Option<usize>,

    /// Statistic used to fill missing numeric values.
    /// Default: Median
    pub numeric_imputation: NumericImputation,

    /// Categorical features with fewer distinct non-missing values than this
    /// are one-hot encoded, the rest are label encoded. Missing values still
    /// get their own indicator.
    /// `None` label-encodes every categorical feature.
    /// Default: None
    pub one_hot_threshold: Option<usize>,

    /// Whether to add pairwise products of the leading numeric columns.
    /// Default: false
    pub enable_interactions: bool,

    /// How many leading numeric columns take part in interactions.
    /// Default: 4
    pub interaction_prefix: usize,

    /// Whether to standardize numeric and interaction columns.
    /// Default: false
    pub enable_scaling: bool,

    /// Targets with fewer distinct values than this are classification targets.
    /// Default: 15
    pub classification_cardinality: usize,

    /// Whether a string target may be coerced to numbers.
    /// Default: true
    pub enable_target_coercion: bool,

    /// Maximum share of values that may fail coercion (0.0 - 1.0).
    /// Default: 0.05
    pub coercion_tolerance: f64,

    /// Whether to drop rows of classes with fewer than `min_class_count` rows.
    /// Default: false
    pub enable_rare_class_filter: bool,

    /// Minimum rows a class needs to survive the rare-class filter.
    /// Default: 2
    pub min_class_count: usize,

    /// Whether to compute the binary class-imbalance ratio.
    /// Default: false
    pub enable_imbalance_weighting: bool,
}

impl Default for PreparationConfig {
    fn default() -> Self {
        Self::light()
    }
}

impl PreparationConfig {
    /// Settings of the fast variant: label encoding, median imputation,
    /// string-target coercion, no feature engineering.
    pub fn light() -> Self {
        Self {
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
        }
    }

    /// Settings of the high-accuracy variant.
    pub fn heavy() -> Self {
        Self {
            target_policy: TargetPolicy::LastColumn,
            high_cardinality_ceiling: Some(DEFAULT_HIGH_CARDINALITY_CEILING),
            numeric_imputation: NumericImputation::Mean,
            one_hot_threshold: Some(DEFAULT_ONE_HOT_THRESHOLD),
            enable_interactions: true,
            interaction_prefix: DEFAULT_INTERACTION_PREFIX,
            enable_scaling: true,
            classification_cardinality: DEFAULT_CLASSIFICATION_CARDINALITY,
            enable_target_coercion: false,
            coercion_tolerance: DEFAULT_COERCION_TOLERANCE,
            enable_rare_class_filter: true,
            min_class_count: DEFAULT_MIN_CLASS_COUNT,
            enable_imbalance_weighting: true,
        }
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.coercion_tolerance) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "coercion_tolerance".to_string(),
                value: self.coercion_tolerance,
            });
        }

        if self.classification_cardinality < 2 {
            return Err(ConfigValidationError::TooSmall {
                field: "classification_cardinality".to_string(),
                value: self.classification_cardinality,
                minimum: 2,
            });
        }

        if self.enable_interactions && self.interaction_prefix < 2 {
            return Err(ConfigValidationError::TooSmall {
                field: "interaction_prefix".to_string(),
                value: self.interaction_prefix,
                minimum: 2,
            });
        }

        if self.min_class_count == 0 {
            return Err(ConfigValidationError::TooSmall {
                field: "min_class_count".to_string(),
                value: self.min_class_count,
                minimum: 1,
            });
        }

        if let TargetPolicy::Named(name) = &self.target_policy
            && name.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyTargetName);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid value for '{field}': {value} (must be at least {minimum})")]
    TooSmall {
        field: String,
        value: usize,
        minimum: usize,
    },

    #[error("Named target column must not be empty")]
    EmptyTargetName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_preset() {
        let config = PreparationConfig::light();
        assert_eq!(config.numeric_imputation, NumericImputation::Median);
        assert_eq!(config.one_hot_threshold, None);
        assert_eq!(config.high_cardinality_ceiling, None);
        assert!(config.enable_target_coercion);
        assert!(!config.enable_rare_class_filter);
        assert!(!config.enable_interactions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_heavy_preset() {
        let config = PreparationConfig::heavy();
        assert_eq!(config.numeric_imputation, NumericImputation::Mean);
        assert_eq!(config.one_hot_threshold, Some(10));
        assert_eq!(config.high_cardinality_ceiling, Some(500));
        assert!(!config.enable_target_coercion);
        assert!(config.enable_rare_class_filter);
        assert!(config.enable_scaling);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_tolerance() {
        let config = PreparationConfig {
            coercion_tolerance: 1.5,
            ..PreparationConfig::light()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_blank_target_name() {
        let config = PreparationConfig {
            target_policy: TargetPolicy::Named("  ".to_string()),
            ..PreparationConfig::light()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::EmptyTargetName)
        ));
    }

    #[test]
    fn test_target_policy_from_json() {
        let policy: TargetPolicy =
            serde_json::from_str(r#"{"kind": "named", "column": "price"}"#).unwrap();
        assert_eq!(policy, TargetPolicy::Named("price".to_string()));

        let policy: TargetPolicy = serde_json::from_str(r#"{"kind": "last_column"}"#).unwrap();
        assert_eq!(policy, TargetPolicy::LastColumn);
    }
}
