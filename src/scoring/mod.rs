//! Single-applicant scoring against a loaded artifact set

mod context;

pub use context::{Prediction, ScoringContext, DECISION_THRESHOLD};
