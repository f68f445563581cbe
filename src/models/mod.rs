//! Machine learning models module
//!
//! Provides the boosted tree classifier, its weak learner and the sigmoid
//! calibration wrapper that produces the persisted model.

mod binning;
mod calibration;
mod gbm;
mod tree;

#[cfg(test)]
pub(crate) mod test_support;

pub use binning::{BinnedMatrix, MAX_BINS};
pub use calibration::{CalibratedClassifier, CalibratedPair, PlattScaling};
pub use gbm::{sigmoid, GbmClassifier, GbmParams};
pub use tree::{RegressionTree, TreeNode, TreeParams};
