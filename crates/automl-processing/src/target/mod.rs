//! Problem-type inference and target encoding.
//!
//! A target is a classification target when it holds strings, or when it
//! has fewer distinct values than `classification_cardinality`. Otherwise it
//! is a regression target and used as-is.
//!
//! With `enable_target_coercion` a string target is first parsed as numbers;
//! when few enough values fail to parse, the numeric version replaces it and
//! the decision is made on that instead.

mod classes;

use crate::config::PreparationConfig;
use crate::encoders::LabelEncoder;
use crate::error::{ProcessingError, Result};
use crate::types::{ColumnKind, PreparedTarget, ProblemType, SchemaAnalysis};
use crate::utils::{
    column_kind, format_numeric_label, median, numeric_values, parse_numeric_string,
    string_values,
};
use ndarray::Array1;
use polars::prelude::*;
use tracing::{debug, info};

/// Target values as they come out of the frame.
#[derive(Debug, Clone, PartialEq)]
enum RawTarget {
    Numeric { values: Vec<f64>, coerced: bool },
    Text(Vec<String>),
}

/// Decides the problem type and encodes the target column.
pub struct ProblemTypeClassifier;

impl ProblemTypeClassifier {
    pub fn classify(
        df: &DataFrame,
        analysis: &SchemaAnalysis,
        config: &PreparationConfig,
    ) -> Result<PreparedTarget> {
        let series = df.column(&analysis.target)?.as_materialized_series();
        let raw = Self::read_target(series, &analysis.target, config)?;

        let (codes, classes, coerced) = match raw {
            RawTarget::Numeric { values, coerced } => {
                // -0.0 and 0.0 are one class
                let values: Vec<f64> = values.into_iter().map(|v| v + 0.0).collect();
                let mut distinct = values.clone();
                distinct.sort_by(f64::total_cmp);
                distinct.dedup();

                if distinct.len() >= config.classification_cardinality {
                    debug!(
                        target = %analysis.target,
                        distinct = distinct.len(),
                        "Target treated as regression"
                    );
                    return Ok(PreparedTarget {
                        problem_type: ProblemType::Regression,
                        values: Array1::from(values),
                        classes: Vec::new(),
                        kept_rows: None,
                        removed_classes: Vec::new(),
                        imbalance_ratio: 1.0,
                        minority_class: None,
                        coerced,
                    });
                }

                let codes = values
                    .iter()
                    .map(|v| {
                        distinct
                            .binary_search_by(|d| d.total_cmp(v))
                            .unwrap_or_default()
                    })
                    .collect::<Vec<_>>();
                let classes = distinct.iter().map(|&v| format_numeric_label(v)).collect();
                (codes, classes, coerced)
            }
            RawTarget::Text(values) => {
                let encoder = LabelEncoder::fit(&values);
                let codes = encoder
                    .transform(&values)
                    .into_iter()
                    .map(Option::unwrap_or_default)
                    .collect();
                (codes, encoder.classes().to_vec(), false)
            }
        };

        Ok(Self::finish_classification(codes, classes, coerced, config))
    }

    fn finish_classification(
        mut codes: Vec<usize>,
        mut classes: Vec<String>,
        coerced: bool,
        config: &PreparationConfig,
    ) -> PreparedTarget {
        let mut kept_rows = None;
        let mut removed_classes = Vec::new();

        if config.enable_rare_class_filter
            && let Some(filtered) =
                classes::filter_rare_classes(&codes, &classes, config.min_class_count)
        {
            info!(
                removed = ?filtered.removed,
                rows_removed = codes.len() - filtered.kept_rows.len(),
                "Removed rare classes"
            );
            codes = filtered.codes;
            classes = filtered.classes;
            kept_rows = Some(filtered.kept_rows);
            removed_classes = filtered.removed;
        }

        let (imbalance_ratio, minority_class) = if config.enable_imbalance_weighting {
            classes::imbalance(&codes, classes.len())
        } else {
            (1.0, None)
        };

        PreparedTarget {
            problem_type: ProblemType::Classification,
            values: codes.iter().map(|&c| c as f64).collect(),
            classes,
            kept_rows,
            removed_classes,
            imbalance_ratio,
            minority_class,
            coerced,
        }
    }

    fn read_target(series: &Series, name: &str, config: &PreparationConfig) -> Result<RawTarget> {
        if column_kind(series.dtype()) == ColumnKind::Numeric {
            let values: Vec<f64> = numeric_values(series)?.into_iter().flatten().collect();
            if values.len() != series.len() {
                return Err(ProcessingError::EmptyTarget(name.to_string()));
            }
            return Ok(RawTarget::Numeric {
                values,
                coerced: false,
            });
        }

        let values: Vec<String> = string_values(series)?.into_iter().flatten().collect();
        if values.len() != series.len() {
            return Err(ProcessingError::EmptyTarget(name.to_string()));
        }

        if config.enable_target_coercion
            && let Some(numeric) = Self::coerce(&values, config.coercion_tolerance)
        {
            debug!(target = name, "Coerced string target to numbers");
            return Ok(RawTarget::Numeric {
                values: numeric,
                coerced: true,
            });
        }

        Ok(RawTarget::Text(values))
    }

    /// Parse `values` as numbers when the failure share is below `tolerance`.
    ///
    /// Values that fail to parse take the median of those that parsed.
    fn coerce(values: &[String], tolerance: f64) -> Option<Vec<f64>> {
        if values.is_empty() {
            return None;
        }
        let parsed: Vec<Option<f64>> = values.iter().map(|v| parse_numeric_string(v)).collect();
        let failures = parsed.iter().filter(|v| v.is_none()).count();
        if failures as f64 / values.len() as f64 >= tolerance {
            return None;
        }
        let fill = median(&parsed)?;
        Some(parsed.into_iter().map(|v| v.unwrap_or(fill)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaAnalyzer;

    fn classify(df: DataFrame, config: &PreparationConfig) -> PreparedTarget {
        let (df, analysis) = SchemaAnalyzer::analyze(df, config).unwrap();
        ProblemTypeClassifier::classify(&df, &analysis, config).unwrap()
    }

    #[test]
    fn test_low_cardinality_numeric_is_classification() {
        let df = df![
            "x" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            "y" => [10i64, 2, 10, 2, 7, 7],
        ]
        .unwrap();

        let target = classify(df, &PreparationConfig::light());
        assert_eq!(target.problem_type, ProblemType::Classification);
        assert_eq!(target.classes, vec!["2", "7", "10"]);
        assert_eq!(target.values.to_vec(), vec![2.0, 0.0, 2.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_many_distinct_values_is_regression() {
        let x: Vec<f64> = (0..40).map(|i| (i % 7) as f64).collect();
        let y: Vec<f64> = (0..40).map(|i| i as f64 * 1.5).collect();
        let df = df!["x" => x, "y" => y.clone()].unwrap();

        let target = classify(df, &PreparationConfig::light());
        assert_eq!(target.problem_type, ProblemType::Regression);
        assert_eq!(target.values.to_vec(), y);
        assert!(target.classes.is_empty());
    }

    #[test]
    fn test_signed_zeros_share_one_class() {
        let df = df![
            "x" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            "y" => [-0.0, 0.0, 1.0, -0.0, 0.0, 1.0],
        ]
        .unwrap();

        let target = classify(df, &PreparationConfig::light());
        assert_eq!(target.problem_type, ProblemType::Classification);
        assert_eq!(target.classes, vec!["0", "1"]);
        assert_eq!(target.values.to_vec(), vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_string_target_sorted_lexicographically() {
        let df = df![
            "x" => [1i64, 2, 3, 4],
            "y" => ["yes", "no", "maybe", "no"],
        ]
        .unwrap();

        let target = classify(df, &PreparationConfig::light());
        assert_eq!(target.classes, vec!["maybe", "no", "yes"]);
        assert_eq!(target.values.to_vec(), vec![2.0, 1.0, 0.0, 1.0]);
        assert!(!target.coerced);
    }

    #[test]
    fn test_light_coerces_numeric_strings() {
        let x: Vec<i64> = (0..40).map(|i| i % 5).collect();
        let mut y: Vec<String> = (0..40).map(|i| format!("{}.5", i)).collect();
        y[3] = "n.a.".to_string();
        let df = df!["x" => x, "y" => y].unwrap();

        let target = classify(df.clone(), &PreparationConfig::light());
        assert!(target.coerced);
        assert_eq!(target.problem_type, ProblemType::Regression);
        // the unparseable value takes the median of the rest
        assert_eq!(target.values[3], 20.5);

        let target = classify(df, &PreparationConfig::heavy());
        assert!(!target.coerced);
        assert_eq!(target.problem_type, ProblemType::Classification);
    }

    #[test]
    fn test_coercion_respects_tolerance() {
        let values: Vec<String> = ["1", "2", "x", "4"].iter().map(|s| s.to_string()).collect();
        assert!(ProblemTypeClassifier::coerce(&values, 0.05).is_none());
        assert_eq!(
            ProblemTypeClassifier::coerce(&values, 0.5),
            Some(vec![1.0, 2.0, 2.0, 4.0])
        );
    }

    #[test]
    fn test_heavy_rare_class_filter_and_imbalance() {
        let df = df![
            "x" => [1i64, 2, 3, 4, 5, 6, 7, 8],
            "y" => ["a", "a", "a", "a", "a", "a", "b", "c"],
        ]
        .unwrap();

        let mut config = PreparationConfig::heavy();
        let target = classify(df.clone(), &config);
        // "b" and "c" are singletons, so only "a" survives
        assert_eq!(target.classes, vec!["a"]);
        assert_eq!(target.kept_rows, Some(vec![0, 1, 2, 3, 4, 5]));
        assert_eq!(target.removed_classes, vec!["b", "c"]);

        config.enable_rare_class_filter = false;
        let target = classify(df, &config);
        assert_eq!(target.kept_rows, None);
        assert_eq!(target.n_classes(), 3);
        assert_eq!(target.imbalance_ratio, 1.0);
    }

    #[test]
    fn test_binary_imbalance_ratio() {
        let df = df![
            "x" => [1i64, 2, 3, 4, 5, 6, 7, 8],
            "y" => [0i64, 0, 0, 0, 0, 0, 1, 1],
        ]
        .unwrap();

        let target = classify(df.clone(), &PreparationConfig::heavy());
        assert_eq!(target.imbalance_ratio, 3.0);
        assert_eq!(target.minority_class, Some(1));

        let target = classify(df, &PreparationConfig::light());
        assert_eq!(target.imbalance_ratio, 1.0);
        assert_eq!(target.minority_class, None);
    }
}
