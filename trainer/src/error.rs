//! Error taxonomy of a pipeline run.
//!
//! Crate-level errors ([`ProcessingError`], [`LearningError`]) are folded
//! into [`PipelineError`] at the pipeline boundary. Loader failures keep
//! their category, everything else becomes a training failure. The message
//! of the underlying error is preserved verbatim.

use automl_learning::LearningError;
use automl_processing::ProcessingError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// Why a pipeline run did not complete.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The dataset source could not be fetched.
    #[error("{0}")]
    Download(String),

    /// The dataset was fetched but is not a usable CSV table.
    #[error("{0}")]
    Parse(String),

    /// Preparation, problem-type inference, fitting or evaluation failed.
    #[error("{0}")]
    Training(String),

    /// The result record could not be delivered to the callback URL.
    #[error("Callback delivery failed: {0}")]
    CallbackDelivery(String),
}

impl PipelineError {
    /// Get a stable error code for downstream handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Download(_) => "DOWNLOAD_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::Training(_) => "TRAINING_ERROR",
            Self::CallbackDelivery(_) => "CALLBACK_DELIVERY_ERROR",
        }
    }
}

impl From<ProcessingError> for PipelineError {
    fn from(err: ProcessingError) -> Self {
        if err.is_download() {
            Self::Download(err.to_string())
        } else if err.is_parse() {
            Self::Parse(err.to_string())
        } else {
            Self::Training(err.to_string())
        }
    }
}

impl From<LearningError> for PipelineError {
    fn from(err: LearningError) -> Self {
        Self::Training(err.to_string())
    }
}

impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// An inbound training request was rejected before the pipeline ran.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A required field is absent or blank after normalization.
    #[error("csvUrl and email are required (missing: {0})")]
    MissingField(&'static str),

    /// The payload is not a JSON object.
    #[error("Malformed request: {0}")]
    Malformed(String),
}

impl RequestError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::Malformed(_) => "MALFORMED_REQUEST",
        }
    }
}
