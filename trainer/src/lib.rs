//! automl-trainer: train a tree-ensemble model from a CSV and report its metrics.
//!
//! This crate ties the preparation stages of `automl-processing` and the
//! ensembles of `automl-learning` into one linear, stateless pipeline and
//! turns its outcome into a [`ResultRecord`].
//!
//! # Quick Start
//!
//! ```no_run
//! use automl_trainer::{HttpSource, NoopSink, Pipeline, PipelineConfig};
//!
//! let source = HttpSource::new("https://example.com/data.csv");
//! let record = Pipeline::new(PipelineConfig::light()).run(&source, "user@example.com", &NoopSink);
//!
//! println!("{}", record.message);
//! ```
//!
//! # Pipeline
//!
//! ```text
//! DatasetSource ─► load (row cap) ─► prepare_dataset ─► Trainer::fit_evaluate ─► ResultRecord ─► ResultSink
//! ```
//!
//! # Variants
//!
//! The fast and the high-accuracy variants are two [`PipelineConfig`]
//! presets, [`PipelineConfig::light`] and [`PipelineConfig::heavy`]. Any
//! field can be overridden through [`PipelineConfigBuilder`] or a JSON file.
//!
//! # Errors
//!
//! Failures are classified as [`PipelineError`] and reported inside an
//! `Error` record rather than returned. A failed callback delivery is
//! logged and otherwise ignored.

pub mod config;
pub mod delivery;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod request;

// Re-exports for convenient access
pub use config::{
    ConfigValidationError, DEFAULT_CALLBACK_TIMEOUT_SECS, PipelineConfig, PipelineConfigBuilder,
    Profile,
};
pub use delivery::{CallbackSink, NoopSink, ResultSink};
pub use error::{PipelineError, RequestError};
pub use pipeline::{Pipeline, TrainedRun};
pub use report::{ErrorInfo, ResultRecord, RunStatus, TrainingSummary};
pub use request::TrainRequest;

// Types from the stage crates that appear in this crate's API
pub use automl_learning::{Metrics, ModelKind};
pub use automl_processing::{
    BytesSource, DatasetSource, FileSource, HttpSource, ProblemType, TargetPolicy,
};
