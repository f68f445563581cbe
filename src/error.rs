//! Error type shared by the library modules

use thiserror::Error;

/// Errors raised while training, persisting or scoring
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Missing required feature(s): {}", .0.join(", "))]
    MissingFeatures(Vec<String>),

    #[error("Unexpected field(s): {}", .0.join(", "))]
    UnexpectedFeatures(Vec<String>),

    #[error("Artifact schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Training failed: {0}")]
    TrainingFailed(String),

    #[error("Model not trained")]
    NotTrained,
}

impl ScoringError {
    /// Whether the error was caused by the caller's input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ScoringError::MissingFeatures(_)
                | ScoringError::UnexpectedFeatures(_)
                | ScoringError::InvalidData(_)
        )
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ScoringError>;
