use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Kind of a column as seen by the preparation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Why a column was removed from the feature set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Categorical column with one distinct value per row.
    Identifier,
    /// Categorical column above the configured cardinality ceiling.
    HighCardinality,
    /// At most one distinct value.
    Constant,
}

/// Role a column plays after schema analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "reason", rename_all = "snake_case")]
pub enum ColumnRole {
    Feature,
    Target,
    Dropped(DropReason),
}

/// Immutable description of one column of the loaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
    /// Distinct non-missing values, measured after target-row filtering.
    pub cardinality: usize,
    pub null_count: usize,
    pub role: ColumnRole,
}

/// Output of the schema analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaAnalysis {
    pub target: String,
    /// One descriptor per source column, in source order.
    pub columns: Vec<ColumnDescriptor>,
    /// Surviving numeric features, in source order.
    pub numeric_features: Vec<String>,
    /// Surviving categorical features, in source order.
    pub categorical_features: Vec<String>,
    pub rows_loaded: usize,
    /// Rows left after dropping those with a missing target.
    pub rows_retained: usize,
}

impl SchemaAnalysis {
    /// Names of the dropped columns, in source order.
    pub fn dropped_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| matches!(c.role, ColumnRole::Dropped(_)))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn feature_count(&self) -> usize {
        self.numeric_features.len() + self.categorical_features.len()
    }

    pub fn descriptor(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// How a categorical feature ended up in the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum CategoricalEncoding {
    Label { classes: usize },
    OneHot { reference: String, indicators: usize },
}

/// Fully numeric, missing-value-free feature matrix.
#[derive(Debug, Clone)]
pub struct PreparedFeatures {
    /// Column names of `matrix`, in order.
    pub names: Vec<String>,
    pub matrix: Array2<f64>,
    /// Encoding chosen per categorical source column.
    pub encodings: Vec<(String, CategoricalEncoding)>,
}

impl PreparedFeatures {
    pub fn n_rows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.matrix.ncols()
    }
}

/// The task decided by the problem-type classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    Classification,
    Regression,
}

impl ProblemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::Classification => "classification",
            ProblemType::Regression => "regression",
        }
    }
}

impl std::fmt::Display for ProblemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target vector plus everything decided about it.
#[derive(Debug, Clone)]
pub struct PreparedTarget {
    pub problem_type: ProblemType,
    /// Class indices for classification, raw values for regression.
    pub values: Array1<f64>,
    /// Ordered class labels; index `i` is encoded as `i as f64`.
    pub classes: Vec<String>,
    /// Rows of the feature matrix to keep, when the rare-class filter removed some.
    pub kept_rows: Option<Vec<usize>>,
    /// Classes removed by the rare-class filter.
    pub removed_classes: Vec<String>,
    /// Majority/minority count ratio for binary targets, 1.0 otherwise.
    pub imbalance_ratio: f64,
    /// Class index whose loss is scaled by `imbalance_ratio`.
    pub minority_class: Option<usize>,
    /// Whether a string target was converted to numbers.
    pub coerced: bool,
}

impl PreparedTarget {
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
