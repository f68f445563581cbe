//! Second-order regression tree used as the boosting weak learner
//!
//! Splits are chosen on gradient/hessian histograms with L1/L2 regularized
//! leaf weights, the usual formulation for logistic gradient boosting.

use super::binning::BinnedMatrix;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Growth and regularization settings for one tree
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    /// Minimum hessian sum allowed in a child
    pub min_child_weight: f64,
    /// Minimum loss reduction required to keep a split
    pub gamma: f64,
    /// L1 regularization on leaf weights
    pub reg_alpha: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// Shrinkage folded into the stored leaf values
    pub learning_rate: f64,
}

/// Tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        /// Rows with `x[feature] <= threshold` go left
        threshold: f64,
        /// Loss reduction achieved by this split
        gain: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

/// Fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    root: TreeNode,
}

struct SplitCandidate {
    feature: usize,
    bin: usize,
    gain: f64,
}

/// Borrowed training state shared by the recursive builder
struct Builder<'a> {
    binned: &'a BinnedMatrix,
    grad: &'a [f64],
    hess: &'a [f64],
    features: &'a [usize],
    params: &'a TreeParams,
}

impl RegressionTree {
    /// Grow a tree on the given rows and candidate features
    pub fn fit(
        binned: &BinnedMatrix,
        grad: &[f64],
        hess: &[f64],
        rows: Vec<usize>,
        features: &[usize],
        params: &TreeParams,
    ) -> Self {
        let builder = Builder {
            binned,
            grad,
            hess,
            features,
            params,
        };
        Self {
            root: builder.build(rows, 0),
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Leaf value for one raw feature row
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Add each split's gain to its feature's slot
    pub fn accumulate_gain(&self, totals: &mut [f64]) {
        fn walk(node: &TreeNode, totals: &mut [f64]) {
            if let TreeNode::Split {
                feature,
                gain,
                left,
                right,
                ..
            } = node
            {
                totals[*feature] += gain;
                walk(left, totals);
                walk(right, totals);
            }
        }
        walk(&self.root, totals);
    }
}

impl Builder<'_> {
    fn build(&self, rows: Vec<usize>, depth: usize) -> TreeNode {
        let (g, h) = self.sums(&rows);

        if depth >= self.params.max_depth || rows.len() < 2 {
            return self.leaf(g, h);
        }

        match self.best_split(&rows, g, h) {
            Some(split) => {
                let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                    .into_iter()
                    .partition(|&r| self.binned.bin(r, split.feature) <= split.bin);

                TreeNode::Split {
                    feature: split.feature,
                    threshold: self.binned.threshold(split.feature, split.bin),
                    gain: split.gain,
                    left: Box::new(self.build(left_rows, depth + 1)),
                    right: Box::new(self.build(right_rows, depth + 1)),
                }
            }
            None => self.leaf(g, h),
        }
    }

    fn sums(&self, rows: &[usize]) -> (f64, f64) {
        rows.iter()
            .fold((0.0, 0.0), |(g, h), &r| (g + self.grad[r], h + self.hess[r]))
    }

    fn leaf(&self, g: f64, h: f64) -> TreeNode {
        TreeNode::Leaf {
            value: self.params.learning_rate * leaf_weight(g, h, self.params),
        }
    }

    fn best_split(&self, rows: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
        let params = self.params;
        let parent_score = structure_score(g, h, params);
        let mut best: Option<SplitCandidate> = None;

        for &feature in self.features {
            let n_bins = self.binned.n_bins(feature);
            if n_bins < 2 {
                continue;
            }

            let mut hist = vec![(0.0_f64, 0.0_f64); n_bins];
            for &r in rows {
                let slot = &mut hist[self.binned.bin(r, feature)];
                slot.0 += self.grad[r];
                slot.1 += self.hess[r];
            }

            let (mut gl, mut hl) = (0.0, 0.0);
            // The last bin can't be a left side: nothing would go right
            for (bin, &(bg, bh)) in hist.iter().enumerate().take(n_bins - 1) {
                gl += bg;
                hl += bh;
                let (gr, hr) = (g - gl, h - hl);
                if hl < params.min_child_weight {
                    continue;
                }
                if hr < params.min_child_weight {
                    break;
                }

                let loss_change =
                    0.5 * (structure_score(gl, hl, params) + structure_score(gr, hr, params) - parent_score);
                let gain = loss_change - params.gamma;
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate { feature, bin, gain });
                }
            }
        }

        best
    }
}

fn soft_threshold(g: f64, alpha: f64) -> f64 {
    if g > alpha {
        g - alpha
    } else if g < -alpha {
        g + alpha
    } else {
        0.0
    }
}

fn structure_score(g: f64, h: f64, params: &TreeParams) -> f64 {
    let denom = h + params.reg_lambda;
    if denom <= 0.0 {
        return 0.0;
    }
    soft_threshold(g, params.reg_alpha).powi(2) / denom
}

fn leaf_weight(g: f64, h: f64, params: &TreeParams) -> f64 {
    let denom = h + params.reg_lambda;
    if denom <= 0.0 {
        return 0.0;
    }
    -soft_threshold(g, params.reg_alpha) / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::binning::MAX_BINS;
    use ndarray::Array2;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: 3,
            min_child_weight: 1.0,
            gamma: 0.0,
            reg_alpha: 0.0,
            reg_lambda: 1.0,
            learning_rate: 1.0,
        }
    }

    #[test]
    fn test_tree_separates_step_function() {
        // Squared loss around zero: grad = -y, hess = 1
        let n = 40;
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        let y: Vec<f64> = (0..n).map(|i| if i < 20 { -1.0 } else { 1.0 }).collect();
        let grad: Vec<f64> = y.iter().map(|v| -v).collect();
        let hess = vec![1.0; n];

        let binned = BinnedMatrix::from_array(x.view(), MAX_BINS);
        let tree = RegressionTree::fit(&binned, &grad, &hess, (0..n).collect(), &[0], &params());

        match tree.root() {
            TreeNode::Split { feature, threshold, .. } => {
                assert_eq!(*feature, 0);
                assert_eq!(*threshold, 19.5);
            }
            TreeNode::Leaf { .. } => panic!("expected a split at the root"),
        }
        assert!(tree.predict_row(x.row(0)) < 0.0);
        assert!(tree.predict_row(x.row(n - 1)) > 0.0);
    }

    #[test]
    fn test_large_gamma_prevents_splits() {
        let n = 10;
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        let grad: Vec<f64> = (0..n).map(|i| if i < 5 { 1.0 } else { -1.0 }).collect();
        let hess = vec![1.0; n];
        let binned = BinnedMatrix::from_array(x.view(), MAX_BINS);

        let tree = RegressionTree::fit(
            &binned,
            &grad,
            &hess,
            (0..n).collect(),
            &[0],
            &TreeParams {
                gamma: 1e6,
                ..params()
            },
        );
        assert!(tree.root().is_leaf());
    }

    #[test]
    fn test_l1_shrinks_leaf_to_zero() {
        let p = TreeParams {
            reg_alpha: 10.0,
            ..params()
        };
        assert_eq!(leaf_weight(5.0, 3.0, &p), 0.0);
        assert!(leaf_weight(-20.0, 3.0, &p) > 0.0);
    }
}
