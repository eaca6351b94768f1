//! Histogram-based regression trees fit to gradients.
//!
//! A node's histogram holds per-bin `(gradient_sum, hessian_sum)` pairs for
//! each sampled feature. Only the smaller child's histogram is accumulated
//! from rows; the sibling is the parent minus that child.

use super::binning::BinnedMatrix;
use ndarray::ArrayView1;

/// Smallest gain that counts as an improvement.
const MIN_SPLIT_GAIN: f64 = 1e-10;

/// Accumulated `(gradient_sum, hessian_sum)` of one bin.
type HistogramBin = (f64, f64);

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        weight: f64,
    },
    /// Rows with `x[feature] <= threshold` go to `left`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One fitted boosting tree, nodes stored in an arena (root at index 0).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoostedTree {
    nodes: Vec<Node>,
}

impl BoostedTree {
    pub(crate) fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { weight } => return *weight,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub(crate) fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }
}

/// Tree-shape and regularization settings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GrowerParams {
    pub max_depth: usize,
    pub lambda: f64,
    pub min_child_weight: f64,
    pub learning_rate: f64,
}

impl GrowerParams {
    /// `0.5 * [G_L²/(H_L+λ) + G_R²/(H_R+λ) - G²/(H+λ)]`
    fn gain(&self, left: HistogramBin, right: HistogramBin) -> f64 {
        let score = |(g, h): HistogramBin| g * g / (h + self.lambda);
        let parent = (left.0 + right.0, left.1 + right.1);
        0.5 * (score(left) + score(right) - score(parent))
    }

    /// Shrunk leaf weight `-G/(H+λ) * η`.
    fn leaf_weight(&self, (g, h): HistogramBin) -> f64 {
        let denominator = h + self.lambda;
        if denominator <= 0.0 {
            return 0.0;
        }
        -g / denominator * self.learning_rate
    }
}

/// Per-feature histograms of one node, indexed like the sampled features.
struct Histogram {
    features: Vec<Vec<HistogramBin>>,
}

impl Histogram {
    fn build(
        binned: &BinnedMatrix,
        features: &[usize],
        grad: &[f64],
        hess: &[f64],
        rows: &[usize],
    ) -> Self {
        let features = features
            .iter()
            .map(|&feature| {
                let bins = binned.feature_bins(feature);
                let mut histogram = vec![(0.0, 0.0); binned.mapper(feature).n_bins()];
                for &row in rows {
                    let slot = &mut histogram[bins[row] as usize];
                    slot.0 += grad[row];
                    slot.1 += hess[row];
                }
                histogram
            })
            .collect();
        Self { features }
    }

    /// Sibling histogram: `parent - child`.
    fn subtract(parent: &Histogram, child: &Histogram) -> Self {
        let features = parent
            .features
            .iter()
            .zip(&child.features)
            .map(|(p, c)| {
                p.iter()
                    .zip(c)
                    .map(|(&(pg, ph), &(cg, ch))| (pg - cg, ph - ch))
                    .collect()
            })
            .collect();
        Self { features }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitChoice {
    /// Position in the sampled feature list.
    position: usize,
    bin: usize,
    gain: f64,
}

/// Grows one [`BoostedTree`] from gradients and hessians.
pub(crate) struct TreeGrower<'a> {
    binned: &'a BinnedMatrix,
    params: GrowerParams,
}

impl<'a> TreeGrower<'a> {
    pub(crate) fn new(binned: &'a BinnedMatrix, params: GrowerParams) -> Self {
        Self { binned, params }
    }

    /// Fit a tree on `rows` using the columns listed in `features`.
    ///
    /// `grad` and `hess` are indexed by row and cover the whole matrix.
    pub(crate) fn grow(
        &self,
        grad: &[f64],
        hess: &[f64],
        rows: Vec<usize>,
        features: &[usize],
    ) -> BoostedTree {
        let mut nodes = Vec::new();
        let histogram = Histogram::build(self.binned, features, grad, hess, &rows);
        let totals = rows
            .iter()
            .fold((0.0, 0.0), |(g, h), &row| (g + grad[row], h + hess[row]));
        self.grow_node(&mut nodes, grad, hess, rows, features, histogram, totals, 0);
        BoostedTree { nodes }
    }

    #[allow(clippy::too_many_arguments)]
    fn grow_node(
        &self,
        nodes: &mut Vec<Node>,
        grad: &[f64],
        hess: &[f64],
        rows: Vec<usize>,
        features: &[usize],
        histogram: Histogram,
        totals: HistogramBin,
        depth: usize,
    ) -> usize {
        let index = nodes.len();
        nodes.push(Node::Leaf {
            weight: self.params.leaf_weight(totals),
        });

        if depth >= self.params.max_depth || rows.len() < 2 {
            return index;
        }
        let Some(choice) = self.best_split(&histogram, totals) else {
            return index;
        };

        let feature = features[choice.position];
        let feature_bins = self.binned.feature_bins(feature);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&row| feature_bins[row] as usize <= choice.bin);

        let left_totals = choice_totals(&histogram.features[choice.position], choice.bin);
        let right_totals = (totals.0 - left_totals.0, totals.1 - left_totals.1);

        let (left_hist, right_hist) = if left_rows.len() <= right_rows.len() {
            let small = Histogram::build(self.binned, features, grad, hess, &left_rows);
            let large = Histogram::subtract(&histogram, &small);
            (small, large)
        } else {
            let small = Histogram::build(self.binned, features, grad, hess, &right_rows);
            let large = Histogram::subtract(&histogram, &small);
            (large, small)
        };
        drop(histogram);

        let left = self.grow_node(
            nodes,
            grad,
            hess,
            left_rows,
            features,
            left_hist,
            left_totals,
            depth + 1,
        );
        let right = self.grow_node(
            nodes,
            grad,
            hess,
            right_rows,
            features,
            right_hist,
            right_totals,
            depth + 1,
        );

        nodes[index] = Node::Split {
            feature,
            threshold: self.binned.mapper(feature).threshold(choice.bin),
            left,
            right,
        };
        index
    }

    fn best_split(&self, histogram: &Histogram, totals: HistogramBin) -> Option<SplitChoice> {
        let mut best: Option<SplitChoice> = None;

        for (position, bins) in histogram.features.iter().enumerate() {
            let mut left = (0.0, 0.0);
            // The last bin cannot be a split point: nothing would go right
            for (bin, &(g, h)) in bins.iter().enumerate().take(bins.len().saturating_sub(1)) {
                left.0 += g;
                left.1 += h;
                let right = (totals.0 - left.0, totals.1 - left.1);
                if left.1 < self.params.min_child_weight || right.1 < self.params.min_child_weight {
                    continue;
                }
                let gain = self.params.gain(left, right);
                if gain > MIN_SPLIT_GAIN && best.is_none_or(|b| gain > b.gain) {
                    best = Some(SplitChoice {
                        position,
                        bin,
                        gain,
                    });
                }
            }
        }

        best
    }
}

/// Gradient and hessian sums of bins `0..=bin`.
fn choice_totals(bins: &[HistogramBin], bin: usize) -> HistogramBin {
    bins[..=bin]
        .iter()
        .fold((0.0, 0.0), |(g, h), &(bg, bh)| (g + bg, h + bh))
}
