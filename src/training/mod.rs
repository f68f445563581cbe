//! End-to-end training pipeline
//!
//! Load, engineer, split, preprocess, search, calibrate, evaluate and persist.

mod pipeline;
mod report;

pub use pipeline::TrainingPipeline;
pub use report::TrainingReport;
