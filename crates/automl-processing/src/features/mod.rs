//! Feature preparation: imputation, encoding, interactions and scaling.
//!
//! Turns the pruned frame into a dense `f64` matrix. Column order is
//! numeric features, then interaction features, then encoded categorical
//! features, each group in source order.

mod interactions;
mod scaling;

pub use interactions::{InteractionPair, add_interactions, interaction_pairs};
pub use scaling::StandardScaler;

use crate::config::PreparationConfig;
use crate::encoders::{LabelEncoder, OneHotEncoder};
use crate::error::{Result, ResultExt};
use crate::imputers::StatisticalImputer;
use crate::types::{CategoricalEncoding, PreparedFeatures, SchemaAnalysis};
use crate::utils::{cardinality, unique_name};
use ndarray::Array2;
use polars::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Builds the numeric feature matrix from an analyzed frame.
pub struct FeaturePreparer;

impl FeaturePreparer {
    pub fn prepare(
        df: &DataFrame,
        analysis: &SchemaAnalysis,
        config: &PreparationConfig,
    ) -> Result<PreparedFeatures> {
        let feature_columns: Vec<String> = analysis
            .numeric_features
            .iter()
            .chain(&analysis.categorical_features)
            .cloned()
            .collect();
        let mut features = df.select(feature_columns)?;
        let n_rows = features.height();

        let interaction_names = if config.enable_interactions {
            add_interactions(
                &mut features,
                &analysis.numeric_features,
                config.interaction_prefix,
            )
            .context("Building interaction features")?
        } else {
            Vec::new()
        };
        if !interaction_names.is_empty() {
            debug!(count = interaction_names.len(), "Added interaction features");
        }

        let mut names = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();

        for name in analysis.numeric_features.iter().chain(&interaction_names) {
            StatisticalImputer::apply_numeric(&mut features, name, config.numeric_imputation)?;

            let mut values: Vec<f64> = features
                .column(name)?
                .as_materialized_series()
                .f64()?
                .into_no_null_iter()
                .collect();
            if config.enable_scaling {
                StandardScaler::fit(&values).transform(&mut values);
            }

            names.push(name.clone());
            columns.push(values);
        }

        let mut taken: HashSet<String> = features
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let mut encodings = Vec::with_capacity(analysis.categorical_features.len());
        for name in &analysis.categorical_features {
            let distinct = cardinality(features.column(name)?.as_materialized_series())?;
            StatisticalImputer::apply_missing_category(&mut features, name)?;

            let values: Vec<String> = features
                .column(name)?
                .as_materialized_series()
                .str()?
                .into_no_null_iter()
                .map(str::to_string)
                .collect();

            let one_hot = config
                .one_hot_threshold
                .is_some_and(|threshold| distinct < threshold);
            let encoding = if one_hot {
                Self::encode_one_hot(name, &values, &mut taken, &mut names, &mut columns)
            } else {
                Self::encode_label(name, &values, &mut names, &mut columns)
            };
            debug!(column = %name, ?encoding, "Encoded categorical feature");
            encodings.push((name.clone(), encoding));
        }

        let matrix = Array2::from_shape_fn((n_rows, columns.len()), |(i, j)| columns[j][i]);

        Ok(PreparedFeatures {
            names,
            matrix,
            encodings,
        })
    }

    /// Indicator columns named `<column>_<category>`, suffixed when the
    /// name is already taken.
    fn encode_one_hot(
        name: &str,
        values: &[String],
        taken: &mut HashSet<String>,
        names: &mut Vec<String>,
        columns: &mut Vec<Vec<f64>>,
    ) -> CategoricalEncoding {
        let one_hot = OneHotEncoder::fit(name, values);
        let reference = one_hot.reference().unwrap_or_default().to_string();
        let indicator_names = one_hot.feature_names();
        let indicators = indicator_names.len();
        for indicator in indicator_names {
            let indicator = unique_name(&indicator, taken);
            taken.insert(indicator.clone());
            names.push(indicator);
        }
        columns.extend(one_hot.transform(values));
        CategoricalEncoding::OneHot {
            reference,
            indicators,
        }
    }

    fn encode_label(
        name: &str,
        values: &[String],
        names: &mut Vec<String>,
        columns: &mut Vec<Vec<f64>>,
    ) -> CategoricalEncoding {
        let (encoder, encoded) = LabelEncoder::fit_transform(values);
        names.push(name.to_string());
        columns.push(encoded);
        CategoricalEncoding::Label {
            classes: encoder.classes().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaAnalyzer;
    use pretty_assertions::assert_eq;

    fn frame() -> DataFrame {
        df![
            "age" => [Some(20.0), None, Some(40.0), Some(60.0), Some(30.0), Some(50.0)],
            "income" => [Some(1.0), Some(2.0), Some(3.0), None, Some(5.0), Some(6.0)],
            "city" => [Some("b"), Some("a"), None, Some("c"), Some("a"), Some("b")],
            "label" => ["x", "y", "x", "y", "x", "y"],
        ]
        .unwrap()
    }

    fn prepare(config: &PreparationConfig) -> PreparedFeatures {
        let (df, analysis) = SchemaAnalyzer::analyze(frame(), config).unwrap();
        FeaturePreparer::prepare(&df, &analysis, config).unwrap()
    }

    #[test]
    fn test_light_label_encodes_and_imputes_median() {
        let prepared = prepare(&PreparationConfig::light());

        assert_eq!(prepared.names, vec!["age", "income", "city"]);
        assert_eq!(prepared.n_rows(), 6);
        // median of 20, 30, 40, 50, 60
        assert_eq!(prepared.matrix[[1, 0]], 40.0);
        // sorted categories: Missing, a, b, c
        assert_eq!(prepared.matrix[[2, 2]], 0.0);
        assert_eq!(prepared.matrix[[0, 2]], 2.0);
        assert_eq!(
            prepared.encodings,
            vec![("city".to_string(), CategoricalEncoding::Label { classes: 4 })]
        );
    }

    #[test]
    fn test_heavy_one_hot_interactions_and_scaling() {
        let prepared = prepare(&PreparationConfig::heavy());

        assert_eq!(
            prepared.names,
            vec!["age", "income", "inter_age_x_income", "city_a", "city_b", "city_c"]
        );
        assert!(matches!(
            &prepared.encodings[0].1,
            CategoricalEncoding::OneHot { reference, indicators: 3 } if reference == "Missing"
        ));

        // scaled columns are centered, dummies untouched
        for j in 0..3 {
            let mean = prepared.matrix.column(j).sum() / 6.0;
            assert!(mean.abs() < 1e-9, "column {j} mean {mean}");
        }
        assert_eq!(prepared.matrix[[1, 3]], 1.0);
        assert_eq!(prepared.matrix[[2, 3]], 0.0);
    }

    #[test]
    fn test_matrix_has_no_nan() {
        for config in [PreparationConfig::light(), PreparationConfig::heavy()] {
            let prepared = prepare(&config);
            assert!(prepared.matrix.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_high_cardinality_column_label_encoded_in_heavy() {
        let cities: Vec<String> = (0..12).map(|i| format!("c{}", i % 11)).collect();
        let labels: Vec<&str> = (0..12).map(|i| if i % 2 == 0 { "x" } else { "y" }).collect();
        let df = df![
            "city" => cities,
            "label" => labels,
        ]
        .unwrap();

        let config = PreparationConfig::heavy();
        let (df, analysis) = SchemaAnalyzer::analyze(df, &config).unwrap();
        let prepared = FeaturePreparer::prepare(&df, &analysis, &config).unwrap();
        assert_eq!(prepared.names, vec!["city"]);
        assert_eq!(prepared.encodings[0].1, CategoricalEncoding::Label { classes: 11 });
    }

    #[test]
    fn test_missing_values_do_not_count_toward_one_hot_threshold() {
        // nine real cities plus nulls, one short of the heavy threshold
        let cities: Vec<Option<String>> = (0..40)
            .map(|i| (i % 10 != 9).then(|| format!("c{}", i % 9)))
            .collect();
        let labels: Vec<&str> = (0..40).map(|i| if i % 2 == 0 { "x" } else { "y" }).collect();
        let df = df![
            "city" => cities,
            "label" => labels,
        ]
        .unwrap();

        let config = PreparationConfig::heavy();
        let (df, analysis) = SchemaAnalyzer::analyze(df, &config).unwrap();
        let prepared = FeaturePreparer::prepare(&df, &analysis, &config).unwrap();

        assert_eq!(
            prepared.encodings[0].1,
            CategoricalEncoding::OneHot {
                reference: "Missing".to_string(),
                indicators: 9,
            }
        );
        assert_eq!(prepared.names.len(), 9);
        assert_eq!(prepared.names[0], "city_c0");
    }

    #[test]
    fn test_one_hot_names_avoid_existing_columns() {
        let df = df![
            "city_b" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            "city" => ["a", "b", "a", "b", "a", "c"],
            "label" => ["x", "y", "x", "y", "x", "y"],
        ]
        .unwrap();

        let config = PreparationConfig::heavy();
        let (df, analysis) = SchemaAnalyzer::analyze(df, &config).unwrap();
        let prepared = FeaturePreparer::prepare(&df, &analysis, &config).unwrap();

        assert_eq!(prepared.names, vec!["city_b", "city_b_2", "city_c"]);
        let unique: HashSet<&String> = prepared.names.iter().collect();
        assert_eq!(unique.len(), prepared.names.len());
        // indicator for "b" sits after the numeric column
        assert_eq!(prepared.matrix[[1, 1]], 1.0);
        assert_eq!(prepared.matrix[[0, 1]], 0.0);
    }
}
