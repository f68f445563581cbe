//! Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Training pipeline settings.
    pub training: TrainingConfig,
    /// Scoring service settings.
    pub server: ServerConfig,
}

/// Training pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Labeled input CSV.
    pub data_file: PathBuf,
    /// Directory the three artifacts are written to.
    pub out_dir: PathBuf,
    /// Seed for the split, CV shuffling, sampler and boosters.
    pub seed: u64,
    /// Fraction of rows held out for evaluation.
    pub test_size: f64,
    /// Hyperparameter search trials.
    pub n_trials: usize,
    /// Folds per trial when computing CV AUC.
    pub cv_folds: usize,
    /// Folds for the sigmoid calibrator.
    pub calibration_folds: usize,
    /// Random trials before TPE takes over.
    pub startup_trials: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("cs-training.csv"),
            out_dir: PathBuf::from("output_model"),
            seed: 42,
            test_size: 0.2,
            n_trials: 30,
            cv_folds: 4,
            calibration_folds: 3,
            startup_trials: 10,
        }
    }
}

impl TrainingConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.test_size > 0.0 && self.test_size < 1.0,
            "test_size must be in (0, 1), got {}",
            self.test_size
        );
        anyhow::ensure!(self.n_trials > 0, "n_trials must be at least 1");
        anyhow::ensure!(self.cv_folds >= 2, "cv_folds must be at least 2");
        anyhow::ensure!(self.calibration_folds >= 2, "calibration_folds must be at least 2");
        Ok(())
    }
}

/// Scoring service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
    /// Directory holding the trained artifacts.
    pub model_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            model_dir: PathBuf::from("output_model"),
        }
    }
}

impl Config {
    /// Create a new configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;

        Ok(())
    }
}

/// Load configuration from file or fall back to defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    if path.as_ref().exists() {
        Config::from_file(path)
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.training.n_trials, 30);
        assert_eq!(config.training.cv_folds, 4);
        assert_eq!(config.training.calibration_folds, 3);
        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert!(config.training.validate().is_ok());
    }

    #[test]
    fn test_config_from_file_fills_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[training]
data_file = "data/train.csv"
n_trials = 5

[server]
bind = "0.0.0.0:8080"
        "#
        )
        .unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();
        assert_eq!(config.training.data_file, PathBuf::from("data/train.csv"));
        assert_eq!(config.training.n_trials, 5);
        assert_eq!(config.training.cv_folds, 4);
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.server.model_dir, PathBuf::from("output_model"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.training.seed = 7;
        config.save_to_file(&path).unwrap();

        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config("/nonexistent/credit.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_rejects_bad_split() {
        let config = TrainingConfig {
            test_size: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
