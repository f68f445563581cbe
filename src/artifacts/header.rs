//! Artifact header and schema fingerprint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Version of the on-disk artifact layout
pub const FORMAT_VERSION: u32 = 1;

/// Metadata written in front of every JSON artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub format_version: u32,
    /// Identifier shared by all artifacts of one training run
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    /// SHA-256 of the ordered feature names
    pub schema_fingerprint: String,
    pub n_features: usize,
}

impl ArtifactHeader {
    pub fn new(run_id: &str, feature_names: &[String]) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            run_id: run_id.to_string(),
            created_at: Utc::now(),
            schema_fingerprint: schema_fingerprint(feature_names),
            n_features: feature_names.len(),
        }
    }
}

/// Run identifier derived from the current UTC time
pub fn new_run_id() -> String {
    Utc::now().format("%Y%m%dT%H%M%S%.6fZ").to_string()
}

/// Hex SHA-256 over the newline-joined feature names
pub fn schema_fingerprint(feature_names: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(feature_names.join("\n").as_bytes());
    hex::encode(hasher.finalize())
}
