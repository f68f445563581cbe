//! Immutable scoring context

use crate::artifacts::{ArtifactStore, LoadedArtifacts};
use crate::error::{Result, ScoringError};
use crate::models::CalibratedClassifier;
use crate::preprocessing::Preprocessor;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Probability at or above which an applicant is predicted to default
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Scoring outcome for one applicant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Calibrated probability of serious delinquency
    pub probability: f64,
    /// 1 when `probability >= 0.5`, else 0
    pub prediction: u8,
}

impl Prediction {
    pub fn from_probability(probability: f64) -> Self {
        let probability = probability.clamp(0.0, 1.0);
        Self {
            probability,
            prediction: u8::from(probability >= DECISION_THRESHOLD),
        }
    }
}

/// Everything needed to score a record, loaded once and never mutated
///
/// Shared between request handlers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    run_id: String,
    feature_names: Vec<String>,
    preprocessor: Preprocessor,
    model: CalibratedClassifier,
}

impl ScoringContext {
    /// Load and cross-check the artifacts in `dir`
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let artifacts = ArtifactStore::new(dir.as_ref()).load()?;
        Self::from_artifacts(artifacts)
    }

    pub fn from_artifacts(artifacts: LoadedArtifacts) -> Result<Self> {
        Self::new(
            artifacts.run_id,
            artifacts.feature_names,
            artifacts.preprocessor,
            artifacts.model,
        )
    }

    /// Build a context from in-memory parts
    pub fn new(
        run_id: impl Into<String>,
        feature_names: Vec<String>,
        preprocessor: Preprocessor,
        model: CalibratedClassifier,
    ) -> Result<Self> {
        if preprocessor.feature_names() != feature_names.as_slice() {
            return Err(ScoringError::SchemaMismatch(
                "preprocessor feature order differs from the feature list".to_string(),
            ));
        }
        if model.n_features() != feature_names.len() {
            return Err(ScoringError::SchemaMismatch(format!(
                "model expects {} features, feature list has {}",
                model.n_features(),
                feature_names.len()
            )));
        }

        Ok(Self {
            run_id: run_id.into(),
            feature_names,
            preprocessor,
            model,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Feature names in the order the model consumes them
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Score one applicant given as `feature name -> value`
    ///
    /// Every persisted feature must be present and no other key is accepted.
    /// NaN marks a missing value and is imputed; infinite values are rejected.
    pub fn score(&self, input: &HashMap<String, f64>) -> Result<Prediction> {
        let missing: Vec<String> = self
            .feature_names
            .iter()
            .filter(|name| !input.contains_key(*name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ScoringError::MissingFeatures(missing));
        }

        let known: HashSet<&str> = self.feature_names.iter().map(String::as_str).collect();
        let mut unexpected: Vec<String> = input
            .keys()
            .filter(|key| !known.contains(key.as_str()))
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            unexpected.sort();
            return Err(ScoringError::UnexpectedFeatures(unexpected));
        }

        let mut row = Vec::with_capacity(self.feature_names.len());
        for name in &self.feature_names {
            let value = input[name];
            if value.is_infinite() {
                return Err(ScoringError::InvalidData(format!(
                    "feature '{}' must be finite, got {}",
                    name, value
                )));
            }
            row.push(value);
        }

        let x = Array2::from_shape_vec((1, row.len()), row)
            .map_err(|e| ScoringError::InvalidData(e.to_string()))?;
        let processed = self.preprocessor.transform(x.view())?;
        let probability = self.model.predict_proba(processed.view())?[0];

        let prediction = Prediction::from_probability(probability);
        debug!(
            "Scored applicant: probability={:.4}, prediction={}",
            prediction.probability, prediction.prediction
        );
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::fitted_fixture;

    fn context() -> ScoringContext {
        let (model, preprocessor) = fitted_fixture();
        let names = preprocessor.feature_names().to_vec();
        ScoringContext::new("test-run", names, preprocessor, model).unwrap()
    }

    fn input(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(Prediction::from_probability(0.5).prediction, 1);
        assert_eq!(Prediction::from_probability(0.4999).prediction, 0);
    }

    #[test]
    fn test_score_returns_probability() {
        let ctx = context();
        let p = ctx.score(&input(&[("f0", 1.5), ("f1", 1.5)])).unwrap();
        assert!((0.0..=1.0).contains(&p.probability));
        assert_eq!(p.prediction, u8::from(p.probability >= 0.5));
    }

    #[test]
    fn test_score_separates_classes() {
        let ctx = context();
        let high = ctx.score(&input(&[("f0", 1.8), ("f1", 1.8)])).unwrap();
        let low = ctx.score(&input(&[("f0", -1.8), ("f1", -1.8)])).unwrap();
        assert!(high.probability > low.probability);
    }

    #[test]
    fn test_score_is_pure() {
        let ctx = context();
        let record = input(&[("f0", 0.2), ("f1", -0.4)]);
        assert_eq!(ctx.score(&record).unwrap(), ctx.score(&record).unwrap());
    }

    #[test]
    fn test_missing_feature_is_named() {
        let ctx = context();
        match ctx.score(&input(&[("f0", 1.0)])) {
            Err(ScoringError::MissingFeatures(names)) => assert_eq!(names, vec!["f1".to_string()]),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_field_is_rejected() {
        let ctx = context();
        let err = ctx
            .score(&input(&[("f0", 1.0), ("f1", 1.0), ("shoe_size", 42.0)]))
            .unwrap_err();
        assert!(matches!(err, ScoringError::UnexpectedFeatures(ref n) if n == &["shoe_size".to_string()]));
    }

    #[test]
    fn test_nan_is_imputed_and_infinity_rejected() {
        let ctx = context();
        assert!(ctx.score(&input(&[("f0", f64::NAN), ("f1", 0.0)])).is_ok());
        assert!(ctx.score(&input(&[("f0", f64::INFINITY), ("f1", 0.0)])).is_err());
    }

    #[test]
    fn test_new_rejects_reordered_names() {
        let (model, preprocessor) = fitted_fixture();
        let names = vec!["f1".to_string(), "f0".to_string()];
        assert!(ScoringContext::new("r", names, preprocessor, model).is_err());
    }
}
