//! Persisted training artifacts
//!
//! A training run writes three files into one directory:
//!
//! - `xgb_calibrated_model.json` - calibrated booster ensemble
//! - `preprocessor.json` - fitted imputer and scaler
//! - `feature_names.csv` - ordered feature list, header `0`
//!
//! The two JSON files carry a header with the run identifier and a schema
//! fingerprint so a directory mixing files from different runs is rejected
//! at load time.

mod header;
mod store;

pub use header::{new_run_id, schema_fingerprint, ArtifactHeader, FORMAT_VERSION};
pub use store::{
    ArtifactPaths, ArtifactStore, LoadedArtifacts, ModelArtifact, PreprocessorArtifact, FEATURE_NAMES_FILE,
    MODEL_FILE, PREPROCESSOR_FILE,
};
