//! Stages 2-4 chained together.

use crate::config::PreparationConfig;
use crate::error::{ProcessingError, Result, ResultExt};
use crate::features::FeaturePreparer;
use crate::schema::SchemaAnalyzer;
use crate::target::ProblemTypeClassifier;
use crate::types::{PreparedFeatures, PreparedTarget, SchemaAnalysis};
use ndarray::Axis;
use polars::prelude::DataFrame;
use tracing::debug;

/// Everything the learner needs, with matrix rows aligned to target values.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub analysis: SchemaAnalysis,
    pub features: PreparedFeatures,
    pub target: PreparedTarget,
}

impl PreparedDataset {
    pub fn n_rows(&self) -> usize {
        self.features.n_rows()
    }
}

/// Run schema analysis, target classification and feature preparation.
pub fn prepare_dataset(df: DataFrame, config: &PreparationConfig) -> Result<PreparedDataset> {
    config
        .validate()
        .map_err(|e| ProcessingError::InvalidConfig(e.to_string()))?;

    let (df, analysis) = SchemaAnalyzer::analyze(df, config).context("Analyzing schema")?;
    debug!(
        target = %analysis.target,
        numeric = analysis.numeric_features.len(),
        categorical = analysis.categorical_features.len(),
        dropped = ?analysis.dropped_columns(),
        "Schema analyzed"
    );

    let target =
        ProblemTypeClassifier::classify(&df, &analysis, config).context("Classifying target")?;
    let mut features =
        FeaturePreparer::prepare(&df, &analysis, config).context("Preparing features")?;

    if let Some(kept) = &target.kept_rows {
        features.matrix = features.matrix.select(Axis(0), kept);
    }

    if features.n_rows() != target.len() {
        return Err(ProcessingError::Misaligned {
            features: features.n_rows(),
            target: target.len(),
        });
    }

    Ok(PreparedDataset {
        analysis,
        features,
        target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProblemType;
    use polars::prelude::*;

    #[test]
    fn test_rare_class_rows_removed_from_matrix() {
        let df = df![
            "x" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
            "y" => ["a", "a", "a", "b", "b", "b", "c"],
        ]
        .unwrap();

        let prepared = prepare_dataset(df, &PreparationConfig::heavy()).unwrap();
        assert_eq!(prepared.n_rows(), 6);
        assert_eq!(prepared.target.len(), 6);
        assert_eq!(prepared.target.problem_type, ProblemType::Classification);
        assert_eq!(prepared.target.classes, vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let df = df!["x" => [1.0, 2.0], "y" => [0i64, 1]].unwrap();
        let config = PreparationConfig {
            coercion_tolerance: -1.0,
            ..PreparationConfig::light()
        };
        let err = prepare_dataset(df, &config).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_matrix_matches_target_length() {
        let df = df![
            "a" => [Some(1.0), None, Some(3.0), Some(4.0)],
            "b" => [Some("u"), Some("v"), None, Some("u")],
            "y" => [Some(1i64), Some(0), Some(1), None],
        ]
        .unwrap();

        let prepared = prepare_dataset(df, &PreparationConfig::light()).unwrap();
        assert_eq!(prepared.n_rows(), 3);
        assert_eq!(prepared.target.len(), 3);
        assert!(prepared.features.matrix.iter().all(|v| !v.is_nan()));
    }
}
