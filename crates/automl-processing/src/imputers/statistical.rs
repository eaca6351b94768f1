//! Statistical imputation methods.
//!
//! Numeric columns are filled with their mean or median, categorical
//! columns with a sentinel category.

use crate::config::{MISSING_CATEGORY, NumericImputation};
use crate::error::{ProcessingError, Result};
use crate::utils::{mean, median, numeric_values, string_values};
use polars::prelude::*;
use tracing::debug;

/// Fill value used when a numeric column has no present values at all.
pub const EMPTY_COLUMN_FILL: f64 = 0.0;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Replace missing values of a numeric column in place.
    ///
    /// The column is rewritten as `Float64` and the fill value is returned.
    pub fn apply_numeric(
        df: &mut DataFrame,
        col_name: &str,
        strategy: NumericImputation,
    ) -> Result<f64> {
        let values = {
            let series = df.column(col_name)?.as_materialized_series();
            numeric_values(series)?
        };

        let fill_value = Self::fill_value(&values, strategy);
        let missing = values.iter().filter(|v| v.is_none()).count();
        let filled: Vec<f64> = values
            .into_iter()
            .map(|v| v.unwrap_or(fill_value))
            .collect();

        if filled.iter().any(|v| !v.is_finite()) {
            return Err(ProcessingError::ImputationFailed {
                column: col_name.to_string(),
                reason: "column contains infinite values".to_string(),
            });
        }

        df.replace(col_name, Series::new(col_name.into(), filled))?;

        if missing > 0 {
            debug!(
                column = col_name,
                missing,
                fill_value,
                method = strategy.as_str(),
                "Imputed numeric column"
            );
        }

        Ok(fill_value)
    }

    /// Replace missing values of a categorical column with the sentinel category.
    ///
    /// The column is rewritten as `String` and the number of filled cells is returned.
    pub fn apply_missing_category(df: &mut DataFrame, col_name: &str) -> Result<usize> {
        let values = {
            let series = df.column(col_name)?.as_materialized_series();
            string_values(series)?
        };

        let missing = values.iter().filter(|v| v.is_none()).count();
        let filled: Vec<String> = values
            .into_iter()
            .map(|v| v.unwrap_or_else(|| MISSING_CATEGORY.to_string()))
            .collect();

        df.replace(col_name, Series::new(col_name.into(), filled))?;

        if missing > 0 {
            debug!(
                column = col_name,
                missing,
                "Added '{}' category indicator",
                MISSING_CATEGORY
            );
        }

        Ok(missing)
    }

    /// The statistic used to fill a numeric column.
    pub fn fill_value(values: &[Option<f64>], strategy: NumericImputation) -> f64 {
        let statistic = match strategy {
            NumericImputation::Mean => mean(values),
            NumericImputation::Median => median(values),
        };
        statistic.unwrap_or(EMPTY_COLUMN_FILL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_imputation() {
        let mut df = df![
            "age" => [Some(10i64), None, Some(30), Some(100)],
        ]
        .unwrap();

        let fill = StatisticalImputer::apply_numeric(&mut df, "age", NumericImputation::Median).unwrap();
        assert_eq!(fill, 30.0);

        let age = df.column("age").unwrap().as_materialized_series().clone();
        assert_eq!(age.null_count(), 0);
        assert_eq!(age.dtype(), &DataType::Float64);
        assert_eq!(age.f64().unwrap().get(1), Some(30.0));
    }

    #[test]
    fn test_mean_imputation() {
        let mut df = df![
            "x" => [Some(1.0), Some(2.0), None, Some(f64::NAN)],
        ]
        .unwrap();

        let fill = StatisticalImputer::apply_numeric(&mut df, "x", NumericImputation::Mean).unwrap();
        assert_eq!(fill, 1.5);

        let x = df.column("x").unwrap().as_materialized_series().clone();
        let values: Vec<f64> = x.f64().unwrap().into_no_null_iter().collect();
        assert_eq!(values, vec![1.0, 2.0, 1.5, 1.5]);
    }

    #[test]
    fn test_all_missing_numeric_column_gets_zero() {
        let mut df = df![
            "x" => [Option::<f64>::None, None],
        ]
        .unwrap();

        let fill = StatisticalImputer::apply_numeric(&mut df, "x", NumericImputation::Median).unwrap();
        assert_eq!(fill, EMPTY_COLUMN_FILL);
        assert_eq!(df.column("x").unwrap().null_count(), 0);
    }

    #[test]
    fn test_missing_category() {
        let mut df = df![
            "city" => [Some("paris"), None, Some("lyon"), None],
        ]
        .unwrap();

        let filled = StatisticalImputer::apply_missing_category(&mut df, "city").unwrap();
        assert_eq!(filled, 2);

        let city = df.column("city").unwrap().as_materialized_series().clone();
        assert_eq!(city.str().unwrap().get(1), Some(MISSING_CATEGORY));
        assert_eq!(city.null_count(), 0);
    }

    #[test]
    fn test_boolean_column_becomes_strings() {
        let mut df = df![
            "flag" => [Some(true), None, Some(false)],
        ]
        .unwrap();

        StatisticalImputer::apply_missing_category(&mut df, "flag").unwrap();
        let flag = df.column("flag").unwrap().as_materialized_series().clone();
        assert_eq!(flag.str().unwrap().get(0), Some("true"));
        assert_eq!(flag.str().unwrap().get(1), Some(MISSING_CATEGORY));
    }
}
