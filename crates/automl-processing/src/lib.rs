//! Dataset loading and preparation for tree-ensemble training.
//!
//! This crate covers everything between a CSV location and a dense,
//! numeric training set:
//!
//! - **Loading**: bounded, quote-aware reading of remote or local CSV data
//! - **Schema analysis**: target selection, missing-target row removal and
//!   column pruning (identifiers, constants, high-cardinality categoricals)
//! - **Feature preparation**: statistical imputation, label or one-hot
//!   encoding, pairwise interactions and standard scaling
//! - **Problem-type inference**: classification vs regression, target
//!   encoding, rare-class filtering and the binary imbalance ratio
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use automl_processing::{DatasetSource, HttpSource, PreparationConfig, prepare_dataset};
//!
//! let config = PreparationConfig::heavy();
//! let df = HttpSource::new("https://example.com/data.csv").load(50_000)?;
//! let prepared = prepare_dataset(df, &config)?;
//!
//! println!("Problem type: {}", prepared.target.problem_type);
//! println!("Features: {:?}", prepared.features.names);
//! ```
//!
//! # Configuration
//!
//! Every threshold lives on [`PreparationConfig`]; the `light()` and
//! `heavy()` presets reproduce the two pipeline variants.

pub mod config;
pub mod encoders;
pub mod error;
pub mod features;
pub mod imputers;
pub mod loader;
pub mod prepare;
pub mod schema;
pub mod target;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    ConfigValidationError, DEFAULT_CLASSIFICATION_CARDINALITY, DEFAULT_COERCION_TOLERANCE,
    DEFAULT_HIGH_CARDINALITY_CEILING, DEFAULT_INTERACTION_PREFIX, DEFAULT_MIN_CLASS_COUNT,
    DEFAULT_ONE_HOT_THRESHOLD, DEFAULT_ROW_CAP_HEAVY, DEFAULT_ROW_CAP_LIGHT, MISSING_CATEGORY,
    NumericImputation, PreparationConfig, TargetPolicy,
};
pub use encoders::{LabelEncoder, OneHotEncoder};
pub use error::{ProcessingError, Result as ProcessingResult, ResultExt};
pub use features::{FeaturePreparer, StandardScaler};
pub use imputers::StatisticalImputer;
#[cfg(feature = "remote")]
pub use loader::HttpSource;
pub use loader::{BytesSource, DEFAULT_DOWNLOAD_TIMEOUT_SECS, DatasetSource, FileSource};
pub use prepare::{PreparedDataset, prepare_dataset};
pub use schema::SchemaAnalyzer;
pub use target::ProblemTypeClassifier;
pub use types::{
    CategoricalEncoding, ColumnDescriptor, ColumnKind, ColumnRole, DropReason, PreparedFeatures,
    PreparedTarget, ProblemType, SchemaAnalysis,
};
