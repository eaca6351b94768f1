//! Shared utilities for the preparation stages.
//!
//! Helpers for classifying Polars dtypes and for pulling column values out
//! of a `Series` into plain vectors.

use crate::error::Result;
use crate::types::ColumnKind;
use polars::prelude::*;
use std::collections::HashSet;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Kind of a column as seen by the preparer.
///
/// Booleans, strings, categoricals and everything else non-numeric are
/// categorical.
pub fn column_kind(dtype: &DataType) -> ColumnKind {
    if is_numeric_dtype(dtype) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Try to parse a string as a numeric value (f64).
///
/// Surrounding whitespace is ignored; anything else that `f64::from_str`
/// rejects is a failure. Non-finite results count as failures.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Format a numeric class value the way it should appear as a label.
pub fn format_numeric_label(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// =============================================================================
// Series Extraction Utilities
// =============================================================================

/// Values of a numeric series as `f64`, missing values as `None`.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let casted = series.cast(&DataType::Float64)?;
    let values = casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Values of any series rendered as strings, missing values as `None`.
pub fn string_values(series: &Series) -> Result<Vec<Option<String>>> {
    let casted = series.cast(&DataType::String)?;
    let values = casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

/// Number of distinct non-missing values in a series.
pub fn cardinality(series: &Series) -> Result<usize> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return Ok(0);
    }
    if is_numeric_dtype(non_null.dtype()) {
        // NaN parsed from the payload is missing too
        let mut values: Vec<f64> = numeric_values(&non_null)?
            .into_iter()
            .flatten()
            .map(|v| v + 0.0)
            .collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        return Ok(values.len());
    }
    Ok(non_null.n_unique()?)
}

/// `base` itself, or `base_<n>` with the smallest `n >= 2` not in `taken`.
pub fn unique_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Median of the present values, `None` when nothing is present.
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(f64::total_cmp);
    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        Some((present[mid - 1] + present[mid]) / 2.0)
    } else {
        Some(present[mid])
    }
}

/// Mean of the present values, `None` when nothing is present.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
