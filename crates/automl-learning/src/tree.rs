//! CART decision trees used by the random forest.
//!
//! Splits are found with an exact sweep over the sorted values of each
//! candidate feature. Classification trees minimize weighted Gini impurity
//! and store class probabilities in their leaves; regression trees minimize
//! the sum of squared errors and store the mean.

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

/// Minimum impurity decrease for a split to be accepted.
const MIN_IMPURITY_DECREASE: f64 = 1e-12;

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Criterion {
    /// Gini impurity (classification)
    Gini,
    /// Mean squared error (regression)
    Mse,
}

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with class probabilities or a single regression value
    Leaf { value: Vec<f64>, n_samples: usize },
    /// Internal node; rows with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Best split found for a node.
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    /// Sum of the children's size-weighted impurities.
    impurity: f64,
}

/// Decision tree model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth; `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Features examined per split; `None` examines all of them
    pub max_features: Option<usize>,
    criterion: Criterion,
    n_classes: usize,
}

impl DecisionTree {
    /// Create a classifier over classes `0..n_classes`.
    pub fn new_classifier(n_classes: usize) -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            criterion: Criterion::Gini,
            n_classes,
        }
    }

    /// Create a regressor.
    pub fn new_regressor() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            criterion: Criterion::Mse,
            n_classes: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set the number of features examined per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Fit on the rows listed in `samples`, which may repeat (bootstrap).
    ///
    /// Classification targets must hold class indices below `n_classes`.
    pub fn fit(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        samples: Vec<usize>,
        rng: &mut StdRng,
    ) {
        self.root = Some(self.build(x, y, samples, 0, rng));
    }

    /// Leaf value reached by `row`: class probabilities or `[mean]`.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> &[f64] {
        let mut node = match &self.root {
            Some(root) => root,
            None => return &[],
        };
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }

    /// Depth of the fitted tree, 0 for a single leaf.
    pub fn depth(&self) -> usize {
        fn depth_of(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
            }
        }
        self.root.as_ref().map_or(0, depth_of)
    }

    fn build(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        samples: Vec<usize>,
        depth: usize,
        rng: &mut StdRng,
    ) -> TreeNode {
        let n_samples = samples.len();
        let leaf = |samples: &[usize]| TreeNode::Leaf {
            value: self.leaf_value(y, samples),
            n_samples,
        };

        let depth_reached = self.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || n_samples < self.min_samples_split || self.is_pure(y, &samples) {
            return leaf(&samples);
        }

        let Some(split) = self.find_split(x, y, &samples, rng) else {
            return leaf(&samples);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&i| x[[i, split.feature_idx]] <= split.threshold);

        TreeNode::Split {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            left: Box::new(self.build(x, y, left, depth + 1, rng)),
            right: Box::new(self.build(x, y, right, depth + 1, rng)),
            n_samples,
        }
    }

    fn leaf_value(&self, y: ArrayView1<f64>, samples: &[usize]) -> Vec<f64> {
        let n = samples.len().max(1) as f64;
        match self.criterion {
            Criterion::Gini => {
                let mut counts = vec![0.0; self.n_classes];
                for &i in samples {
                    if let Some(count) = counts.get_mut(y[i] as usize) {
                        *count += 1.0;
                    }
                }
                counts.iter().map(|c| c / n).collect()
            }
            Criterion::Mse => vec![samples.iter().map(|&i| y[i]).sum::<f64>() / n],
        }
    }

    fn is_pure(&self, y: ArrayView1<f64>, samples: &[usize]) -> bool {
        match samples.first() {
            Some(&first) => samples.iter().all(|&i| y[i] == y[first]),
            None => true,
        }
    }

    /// Weighted impurity of the node itself.
    fn node_impurity(&self, y: ArrayView1<f64>, samples: &[usize]) -> f64 {
        match self.criterion {
            Criterion::Gini => {
                let mut counts = vec![0.0; self.n_classes];
                for &i in samples {
                    if let Some(count) = counts.get_mut(y[i] as usize) {
                        *count += 1.0;
                    }
                }
                weighted_gini(&counts, samples.len() as f64)
            }
            Criterion::Mse => {
                let (sum, sum_sq) = samples
                    .iter()
                    .fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
                sum_sq - sum * sum / samples.len() as f64
            }
        }
    }

    /// Visit features in random order; stop after `max_features` of them
    /// once a valid split exists.
    fn find_split(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        samples: &[usize],
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let n_features = x.ncols();
        let max_features = self.max_features.unwrap_or(n_features).clamp(1, n_features);
        let parent = self.node_impurity(y, samples);

        let mut best: Option<SplitCandidate> = None;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(samples.len());

        for (visited, feature_idx) in sample(rng, n_features, n_features).into_iter().enumerate() {
            if visited >= max_features && best.is_some() {
                break;
            }

            sorted.clear();
            sorted.extend(samples.iter().map(|&i| (x[[i, feature_idx]], i)));
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let candidate = match self.criterion {
                Criterion::Gini => self.sweep_gini(y, &sorted),
                Criterion::Mse => sweep_mse(y, &sorted),
            };

            if let Some((threshold, impurity)) = candidate
                && impurity < parent - MIN_IMPURITY_DECREASE
                && best.is_none_or(|b| impurity < b.impurity)
            {
                best = Some(SplitCandidate {
                    feature_idx,
                    threshold,
                    impurity,
                });
            }
        }

        best
    }

    fn sweep_gini(&self, y: ArrayView1<f64>, sorted: &[(f64, usize)]) -> Option<(f64, f64)> {
        let n = sorted.len();
        let mut total = vec![0.0; self.n_classes];
        for &(_, i) in sorted {
            if let Some(count) = total.get_mut(y[i] as usize) {
                *count += 1.0;
            }
        }

        let mut left = vec![0.0; self.n_classes];
        let mut right = total.clone();
        let mut best: Option<(f64, f64)> = None;

        for k in 0..n - 1 {
            let class = y[sorted[k].1] as usize;
            if class < self.n_classes {
                left[class] += 1.0;
                right[class] -= 1.0;
            }
            if sorted[k].0 == sorted[k + 1].0 {
                continue;
            }
            let n_left = (k + 1) as f64;
            let impurity = weighted_gini(&left, n_left) + weighted_gini(&right, n as f64 - n_left);
            if best.is_none_or(|(_, b)| impurity < b) {
                best = Some((midpoint(sorted[k].0, sorted[k + 1].0), impurity));
            }
        }
        best
    }
}

/// `n * gini` for the given class counts.
fn weighted_gini(counts: &[f64], n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    n - counts.iter().map(|c| c * c).sum::<f64>() / n
}

fn sweep_mse(y: ArrayView1<f64>, sorted: &[(f64, usize)]) -> Option<(f64, f64)> {
    let n = sorted.len();
    let (total, total_sq) = sorted
        .iter()
        .fold((0.0, 0.0), |(s, sq), &(_, i)| (s + y[i], sq + y[i] * y[i]));

    let mut left = 0.0;
    let mut left_sq = 0.0;
    let mut best: Option<(f64, f64)> = None;

    for k in 0..n - 1 {
        let value = y[sorted[k].1];
        left += value;
        left_sq += value * value;
        if sorted[k].0 == sorted[k + 1].0 {
            continue;
        }
        let n_left = (k + 1) as f64;
        let n_right = n as f64 - n_left;
        let right = total - left;
        let right_sq = total_sq - left_sq;
        let sse = (left_sq - left * left / n_left) + (right_sq - right * right / n_right);
        if best.is_none_or(|(_, b)| sse < b) {
            best = Some((midpoint(sorted[k].0, sorted[k + 1].0), sse));
        }
    }
    best
}

/// Threshold between two adjacent distinct values, never equal to the upper one.
fn midpoint(lower: f64, upper: f64) -> f64 {
    let mid = lower + (upper - lower) / 2.0;
    if mid < upper { mid } else { lower }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, array};
    use rand::SeedableRng;

    fn fit(tree: &mut DecisionTree, x: &Array2<f64>, y: &Array1<f64>) {
        let mut rng = StdRng::seed_from_u64(42);
        tree.fit(x.view(), y.view(), (0..x.nrows()).collect(), &mut rng);
    }

    #[test]
    fn test_classifier_separates_threshold() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut tree = DecisionTree::new_classifier(2);
        fit(&mut tree, &x, &y);

        assert_eq!(tree.predict_row(array![2.5].view()), &[1.0, 0.0]);
        assert_eq!(tree.predict_row(array![11.5].view()), &[0.0, 1.0]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_classifier_picks_informative_feature() {
        let x = array![
            [5.0, 0.0],
            [1.0, 0.0],
            [4.0, 1.0],
            [2.0, 1.0],
            [3.0, 0.0],
            [6.0, 1.0]
        ];
        let y = array![0.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        let mut tree = DecisionTree::new_classifier(2);
        fit(&mut tree, &x, &y);

        assert_eq!(tree.predict_row(array![100.0, 1.0].view()), &[0.0, 1.0]);
        assert_eq!(tree.predict_row(array![100.0, 0.0].view()), &[1.0, 0.0]);
    }

    #[test]
    fn test_regressor_leaf_means() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![1.0, 1.0, 5.0, 7.0];
        let mut tree = DecisionTree::new_regressor().with_max_depth(Some(1));
        fit(&mut tree, &x, &y);

        assert_eq!(tree.predict_row(array![0.5].view()), &[1.0]);
        assert_eq!(tree.predict_row(array![2.5].view()), &[6.0]);
    }

    #[test]
    fn test_max_depth_zero_is_single_leaf() {
        let x = array![[0.0], [1.0]];
        let y = array![0.0, 1.0];
        let mut tree = DecisionTree::new_classifier(2).with_max_depth(Some(0));
        fit(&mut tree, &x, &y);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict_row(array![0.0].view()), &[0.5, 0.5]);
    }

    #[test]
    fn test_min_samples_split_stops_growth() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 1.0, 0.0, 1.0];
        let mut tree = DecisionTree::new_classifier(2).with_min_samples_split(5);
        fit(&mut tree, &x, &y);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_constant_feature_yields_leaf() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = array![0.0, 1.0, 1.0];
        let mut tree = DecisionTree::new_classifier(2);
        fit(&mut tree, &x, &y);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(midpoint(1.0, 2.0), 1.5);
        let next = f64::from_bits(1.0f64.to_bits() + 1);
        assert_eq!(midpoint(1.0, next), 1.0);
    }
}
