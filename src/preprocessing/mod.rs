//! Numeric preprocessing
//!
//! Median imputation followed by standard scaling, fitted on the training
//! split and persisted alongside the model.

mod imputer;
mod pipeline;
mod scaler;

pub use imputer::MedianImputer;
pub use pipeline::Preprocessor;
pub use scaler::StandardScaler;
