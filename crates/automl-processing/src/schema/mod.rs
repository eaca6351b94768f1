//! Schema analysis: target selection and column pruning.
//!
//! The analyzer picks the target column, removes rows whose target is
//! missing, describes every column once and drops the ones that carry no
//! usable signal. It is deterministic and never looks at values beyond
//! their dtype and distinct counts.

mod drop_policy;

use crate::config::{PreparationConfig, TargetPolicy};
use crate::error::{ProcessingError, Result};
use crate::types::{ColumnDescriptor, ColumnKind, ColumnRole, SchemaAnalysis};
use crate::utils::{cardinality, column_kind, numeric_values};
use polars::prelude::*;
use tracing::debug;

pub(crate) use drop_policy::drop_reason;

/// Decides target, feature and dropped columns of a loaded dataset.
pub struct SchemaAnalyzer;

impl SchemaAnalyzer {
    /// Analyze `df` and return the pruned frame together with its description.
    ///
    /// The returned frame holds the target plus the surviving feature
    /// columns, restricted to rows with a defined target.
    pub fn analyze(df: DataFrame, config: &PreparationConfig) -> Result<(DataFrame, SchemaAnalysis)> {
        let target = Self::resolve_target(&df, &config.target_policy)?;
        let rows_loaded = df.height();

        let df = Self::drop_missing_target_rows(df, &target)?;
        let rows_retained = df.height();
        if rows_retained == 0 {
            return Err(ProcessingError::EmptyTarget(target));
        }
        if rows_retained < rows_loaded {
            debug!(
                target = %target,
                dropped = rows_loaded - rows_retained,
                "Removed rows with missing target"
            );
        }

        let mut columns = Vec::with_capacity(df.width());
        let mut numeric_features = Vec::new();
        let mut categorical_features = Vec::new();

        for col in df.get_columns() {
            let series = col.as_materialized_series();
            let name = series.name().to_string();
            let kind = column_kind(series.dtype());
            let distinct = cardinality(series)?;

            let role = if name == target {
                ColumnRole::Target
            } else {
                match drop_reason(kind, distinct, rows_retained, config.high_cardinality_ceiling) {
                    Some(reason) => {
                        debug!(column = %name, cardinality = distinct, ?reason, "Dropping column");
                        ColumnRole::Dropped(reason)
                    }
                    None => {
                        match kind {
                            ColumnKind::Numeric => numeric_features.push(name.clone()),
                            ColumnKind::Categorical => categorical_features.push(name.clone()),
                        }
                        ColumnRole::Feature
                    }
                }
            };

            columns.push(ColumnDescriptor {
                name,
                kind,
                cardinality: distinct,
                null_count: series.null_count(),
                role,
            });
        }

        if numeric_features.is_empty() && categorical_features.is_empty() {
            return Err(ProcessingError::NoFeatures(target));
        }

        let keep: Vec<String> = columns
            .iter()
            .filter(|c| !matches!(c.role, ColumnRole::Dropped(_)))
            .map(|c| c.name.clone())
            .collect();
        let df = df.select(keep)?;

        let analysis = SchemaAnalysis {
            target,
            columns,
            numeric_features,
            categorical_features,
            rows_loaded,
            rows_retained,
        };

        Ok((df, analysis))
    }

    fn resolve_target(df: &DataFrame, policy: &TargetPolicy) -> Result<String> {
        match policy {
            TargetPolicy::LastColumn => df
                .get_column_names()
                .last()
                .map(|name| name.to_string())
                .ok_or_else(|| ProcessingError::Parse("dataset has no columns".to_string())),
            TargetPolicy::Named(name) => {
                if df.get_column_names().iter().any(|c| c.as_str() == name) {
                    Ok(name.clone())
                } else {
                    Err(ProcessingError::ColumnNotFound(name.clone()))
                }
            }
        }
    }

    fn drop_missing_target_rows(df: DataFrame, target: &str) -> Result<DataFrame> {
        let series = df.column(target)?.as_materialized_series();

        let present: Vec<bool> = if column_kind(series.dtype()) == ColumnKind::Numeric {
            numeric_values(series)?.iter().map(Option::is_some).collect()
        } else {
            series.is_not_null().into_iter().map(|v| v.unwrap_or(false)).collect()
        };

        if present.iter().all(|&p| p) {
            return Ok(df);
        }

        let mask = BooleanChunked::from_slice("mask".into(), &present);
        Ok(df.filter(&mask)?)
    }
}
