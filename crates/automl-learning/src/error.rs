//! Error types for the automl-learning crate.
//!
//! This module defines [`LearningError`], the error type returned by every
//! fallible operation in the crate: configuration validation, data
//! splitting, model fitting and evaluation.
//!
//! # Example
//!
//! ```no_run
//! use automl_learning::{LearningError, TrainingConfig};
//!
//! fn configure() -> Result<TrainingConfig, LearningError> {
//!     // Errors are propagated with ?
//!     let config = TrainingConfig::builder().test_size(0.25).build()?;
//!     Ok(config)
//! }
//! ```

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for automl-learning operations.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// without breaking downstream code.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum LearningError {
    /// Invalid configuration provided to the trainer.
    ///
    /// Check the message for the offending field and the accepted range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Feature matrix and target disagree, or the data holds non-finite values.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The data cannot be partitioned as requested.
    ///
    /// Common causes:
    /// - The target holds a single class
    /// - A class has only one member, so it cannot appear on both sides of a split
    /// - Too few rows for the requested test fraction or fold count
    #[error("Cannot split data: {0}")]
    InsufficientData(String),

    /// A model failed to fit.
    #[error("Training failed: {0}")]
    TrainingFailed(String),
}

impl LearningError {
    /// Get a stable error code for downstream handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::InsufficientData(_) => "INSUFFICIENT_DATA",
            Self::TrainingFailed(_) => "TRAINING_FAILED",
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for LearningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("LearningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for learning operations.
pub type Result<T> = std::result::Result<T, LearningError>;
