//! Custom error types for dataset loading and preparation.
//!
//! This module provides the error hierarchy for stages 1-4 of the training
//! pipeline using `thiserror`. Loader failures are kept distinct from
//! everything that happens after the data is in memory, because callers map
//! them onto different outcome categories.
//!
//! Errors are serializable so they can travel inside a result record.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for dataset processing.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// The dataset source could not be reached or answered with a non-success status.
    #[error("Download failed: {0}")]
    Download(String),

    /// The payload was fetched but is not a usable CSV table.
    #[error("Failed to parse dataset: {0}")]
    Parse(String),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// No row has a defined target value.
    #[error("Target column '{0}' has no non-missing values")]
    EmptyTarget(String),

    /// Every candidate feature column was pruned.
    #[error("No usable feature columns remain after pruning (target: '{0}')")]
    NoFeatures(String),

    /// Imputation failed.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    ImputationFailed { column: String, reason: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Feature matrix and target vector disagree on row count.
    #[error("Feature matrix has {features} rows but target has {target}")]
    Misaligned { features: usize, target: usize },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ProcessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for downstream handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Download(_) => "DOWNLOAD_FAILED",
            Self::Parse(_) => "PARSE_FAILED",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::EmptyTarget(_) => "EMPTY_TARGET",
            Self::NoFeatures(_) => "NO_FEATURES",
            Self::ImputationFailed { .. } => "IMPUTATION_FAILED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Misaligned { .. } => "MISALIGNED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error happened while fetching the dataset.
    pub fn is_download(&self) -> bool {
        match self {
            Self::Download(_) => true,
            Self::WithContext { source, .. } => source.is_download(),
            _ => false,
        }
    }

    /// Check if this error happened while parsing the fetched payload.
    pub fn is_parse(&self) -> bool {
        match self {
            Self::Parse(_) => true,
            Self::WithContext { source, .. } => source.is_parse(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ProcessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ProcessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ProcessingError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ProcessingError::Download("timeout".to_string()).error_code(),
            "DOWNLOAD_FAILED"
        );
        assert_eq!(
            ProcessingError::ColumnNotFound("test".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_stage_classification_sees_through_context() {
        let error = ProcessingError::Download("refused".to_string()).with_context("Fetching");
        assert!(error.is_download());
        assert!(!error.is_parse());

        let error = ProcessingError::Parse("bad row".to_string()).with_context("Reading");
        assert!(error.is_parse());
        assert!(!error.is_download());

        assert!(!ProcessingError::NoFeatures("y".to_string()).is_download());
    }

    #[test]
    fn test_every_variant_has_a_distinct_code() {
        let errors = [
            ProcessingError::Download("x".to_string()),
            ProcessingError::Parse("x".to_string()),
            ProcessingError::ColumnNotFound("x".to_string()),
            ProcessingError::EmptyTarget("x".to_string()),
            ProcessingError::NoFeatures("x".to_string()),
            ProcessingError::ImputationFailed {
                column: "x".to_string(),
                reason: "y".to_string(),
            },
            ProcessingError::InvalidConfig("x".to_string()),
            ProcessingError::Misaligned {
                features: 1,
                target: 2,
            },
            ProcessingError::Io(std::io::Error::other("x")),
            ProcessingError::Polars(polars::error::PolarsError::NoData("x".into())),
        ];
        let codes: std::collections::HashSet<&str> =
            errors.iter().map(ProcessingError::error_code).collect();
        assert_eq!(codes.len(), errors.len());
        assert_eq!(errors.iter().filter(|e| e.is_download()).count(), 1);
    }

    #[test]
    fn test_error_serialization() {
        let error = ProcessingError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context() {
        let error =
            ProcessingError::EmptyTarget("label".to_string()).with_context("During schema analysis");
        assert!(error.to_string().contains("During schema analysis"));
        assert_eq!(error.error_code(), "EMPTY_TARGET");
    }
}
