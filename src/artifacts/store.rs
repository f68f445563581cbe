//! Reading and writing the artifact directory

use super::header::{schema_fingerprint, ArtifactHeader, FORMAT_VERSION};
use crate::error::{Result, ScoringError};
use crate::models::CalibratedClassifier;
use crate::preprocessing::Preprocessor;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const MODEL_FILE: &str = "xgb_calibrated_model.json";
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
pub const FEATURE_NAMES_FILE: &str = "feature_names.csv";

/// Header of the single-column feature list file
const FEATURE_NAMES_HEADER: &str = "0";

/// On-disk form of the calibrated model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub header: ArtifactHeader,
    pub model: CalibratedClassifier,
}

/// On-disk form of the preprocessor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessorArtifact {
    pub header: ArtifactHeader,
    pub preprocessor: Preprocessor,
}

/// Locations of a written artifact set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub preprocessor: PathBuf,
    pub feature_names: PathBuf,
}

/// Artifact set read back from disk and checked for consistency
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub run_id: String,
    pub model: CalibratedClassifier,
    pub preprocessor: Preprocessor,
    pub feature_names: Vec<String>,
}

/// Artifact directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: self.dir.join(MODEL_FILE),
            preprocessor: self.dir.join(PREPROCESSOR_FILE),
            feature_names: self.dir.join(FEATURE_NAMES_FILE),
        }
    }

    /// Write all three artifacts, replacing any previous run
    ///
    /// Each file is staged in the target directory and renamed into place, so
    /// a concurrent reader sees either the old or the new file, never a torn one.
    pub fn save(
        &self,
        run_id: &str,
        model: &CalibratedClassifier,
        preprocessor: &Preprocessor,
    ) -> Result<ArtifactPaths> {
        let feature_names = preprocessor.feature_names();
        if model.n_features() != feature_names.len() {
            return Err(ScoringError::SchemaMismatch(format!(
                "model expects {} features, preprocessor produces {}",
                model.n_features(),
                feature_names.len()
            )));
        }

        fs::create_dir_all(&self.dir)?;
        let paths = self.paths();

        let model_artifact = ModelArtifact {
            header: ArtifactHeader::new(run_id, feature_names),
            model: model.clone(),
        };
        write_atomic(&paths.model, |w| Ok(serde_json::to_writer(w, &model_artifact)?))?;
        info!("Saved model to {}", paths.model.display());

        let preprocessor_artifact = PreprocessorArtifact {
            header: ArtifactHeader::new(run_id, feature_names),
            preprocessor: preprocessor.clone(),
        };
        write_atomic(&paths.preprocessor, |w| {
            Ok(serde_json::to_writer_pretty(w, &preprocessor_artifact)?)
        })?;
        info!("Saved preprocessor to {}", paths.preprocessor.display());

        write_atomic(&paths.feature_names, |w| write_feature_names(w, feature_names))?;
        info!(
            "Saved {} feature names to {}",
            feature_names.len(),
            paths.feature_names.display()
        );

        Ok(paths)
    }

    /// Read the artifact set and verify all three files belong together
    pub fn load(&self) -> Result<LoadedArtifacts> {
        let paths = self.paths();

        let feature_names = read_feature_names(&paths.feature_names)?;
        let preprocessor: PreprocessorArtifact = read_json(&paths.preprocessor)?;
        let model: ModelArtifact = read_json(&paths.model)?;

        check_consistency(&feature_names, &model, &preprocessor)?;
        info!(
            "Loaded artifacts of run {} ({} features) from {}",
            model.header.run_id,
            feature_names.len(),
            self.dir.display()
        );

        Ok(LoadedArtifacts {
            run_id: model.header.run_id,
            model: model.model,
            preprocessor: preprocessor.preprocessor,
            feature_names,
        })
    }
}

fn check_consistency(
    feature_names: &[String],
    model: &ModelArtifact,
    preprocessor: &PreprocessorArtifact,
) -> Result<()> {
    let mismatch = |msg: String| Err(ScoringError::SchemaMismatch(msg));

    for header in [&model.header, &preprocessor.header] {
        if header.format_version != FORMAT_VERSION {
            return mismatch(format!(
                "unsupported artifact format version {} (expected {})",
                header.format_version, FORMAT_VERSION
            ));
        }
    }

    if model.header.run_id != preprocessor.header.run_id {
        return mismatch(format!(
            "model is from run {} but preprocessor is from run {}",
            model.header.run_id, preprocessor.header.run_id
        ));
    }

    let fingerprint = schema_fingerprint(feature_names);
    if model.header.schema_fingerprint != fingerprint || preprocessor.header.schema_fingerprint != fingerprint {
        return mismatch("feature list does not match the fingerprint stored with the model".to_string());
    }

    if preprocessor.preprocessor.feature_names() != feature_names {
        return mismatch(format!(
            "preprocessor was fitted on [{}], feature list is [{}]",
            preprocessor.preprocessor.feature_names().join(", "),
            feature_names.join(", ")
        ));
    }

    let n = feature_names.len();
    if model.header.n_features != n || preprocessor.header.n_features != n || model.model.n_features() != n {
        return mismatch(format!(
            "feature count disagrees: list {}, model {}, headers {} / {}",
            n,
            model.model.n_features(),
            model.header.n_features,
            preprocessor.header.n_features
        ));
    }

    preprocessor.preprocessor.validate()?;
    model.model.validate()?;
    debug!("Artifact consistency checks passed");
    Ok(())
}

/// Stage `write` into a temporary file next to `path`, then rename over it
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ScoringError::Io(e.error))?;
    Ok(())
}

fn write_feature_names<W: Write>(writer: W, names: &[String]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([FEATURE_NAMES_HEADER])?;
    for name in names {
        csv_writer.write_record([name])?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn read_feature_names(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut names = Vec::new();
    for record in reader.records() {
        let record = record?;
        match record.get(0) {
            Some(name) if !name.is_empty() => names.push(name.to_string()),
            _ => {
                return Err(ScoringError::InvalidData(format!(
                    "empty feature name in {}",
                    path.display()
                )))
            }
        }
    }

    if names.is_empty() {
        return Err(ScoringError::InvalidData(format!("no feature names in {}", path.display())));
    }
    Ok(names)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::fitted_fixture as fitted;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (model, preprocessor) = fitted();

        let paths = store.save("run-a", &model, &preprocessor).unwrap();
        assert!(paths.model.exists());
        assert!(paths.preprocessor.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.run_id, "run-a");
        assert_eq!(loaded.feature_names, preprocessor.feature_names());
        assert_eq!(loaded.preprocessor, preprocessor);
        assert_eq!(loaded.model, model);
    }

    #[test]
    fn test_feature_names_file_layout() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (model, preprocessor) = fitted();
        let paths = store.save("run-a", &model, &preprocessor).unwrap();

        let text = fs::read_to_string(paths.feature_names).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["0", "f0", "f1"]);
    }

    #[test]
    fn test_overwrite_replaces_previous_run() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (model, preprocessor) = fitted();

        store.save("run-a", &model, &preprocessor).unwrap();
        store.save("run-b", &model, &preprocessor).unwrap();
        assert_eq!(store.load().unwrap().run_id, "run-b");

        // Only the three artifacts remain, no staged leftovers
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn test_load_rejects_mixed_runs() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (model, preprocessor) = fitted();
        store.save("run-a", &model, &preprocessor).unwrap();

        let stale = dir.path().join("stale");
        let old = ArtifactStore::new(&stale);
        old.save("run-old", &model, &preprocessor).unwrap();
        fs::copy(stale.join(PREPROCESSOR_FILE), dir.path().join(PREPROCESSOR_FILE)).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, ScoringError::SchemaMismatch(_)));
    }

    #[test]
    fn test_load_rejects_edited_feature_list() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (model, preprocessor) = fitted();
        let paths = store.save("run-a", &model, &preprocessor).unwrap();

        fs::write(&paths.feature_names, "0\nf1\nf0\nf2\n").unwrap();
        assert!(matches!(store.load().unwrap_err(), ScoringError::SchemaMismatch(_)));
    }

    #[test]
    fn test_load_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("absent"));
        assert!(store.load().is_err());
    }
}
