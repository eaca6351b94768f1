//! Imputation module for handling missing values.
//!
//! Numeric columns take a mean or median fill; categorical columns gain an
//! explicit "Missing" category.

mod statistical;

pub use statistical::{EMPTY_COLUMN_FILL, StatisticalImputer};
