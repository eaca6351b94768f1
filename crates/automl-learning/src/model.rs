//! A fitted ensemble of either kind.
//!
//! [`TrainedModel`] hides which ensemble was fit so evaluation and
//! cross-validation can treat both the same way.

use crate::boosting::GradientBoostedTrees;
use crate::config::ModelKind;
use crate::error::Result;
use crate::forest::RandomForest;
use ndarray::{Array1, Array2, ArrayView2};

/// A fitted forest or boosted ensemble.
#[derive(Debug, Clone)]
pub enum TrainedModel {
    Forest(RandomForest),
    Boosted(GradientBoostedTrees),
}

impl TrainedModel {
    /// Which ensemble this is.
    #[must_use]
    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::Forest(_) => ModelKind::Forest,
            TrainedModel::Boosted(_) => ModelKind::BoostedEnsemble,
        }
    }

    /// Class indices (as `f64`) for classification, values for regression.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidData`](crate::LearningError::InvalidData)
    /// when `x` has a different number of columns than the training matrix.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedModel::Forest(forest) => forest.predict(x),
            TrainedModel::Boosted(boosted) => boosted.predict(x),
        }
    }

    /// Class probabilities for classification, one column of values for
    /// regression.
    ///
    /// # Errors
    ///
    /// Same as [`predict`](Self::predict).
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        match self {
            TrainedModel::Forest(forest) => forest.predict_proba(x),
            TrainedModel::Boosted(boosted) => boosted.predict_proba(x),
        }
    }

    /// Trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        match self {
            TrainedModel::Forest(forest) => forest.n_trees(),
            TrainedModel::Boosted(boosted) => boosted.n_trees(),
        }
    }

    /// Best boosting round, `None` for forests or without early stopping.
    #[must_use]
    pub fn best_iteration(&self) -> Option<usize> {
        match self {
            TrainedModel::Forest(_) => None,
            TrainedModel::Boosted(boosted) => boosted.best_iteration(),
        }
    }
}
