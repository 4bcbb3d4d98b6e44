//! Trained artifact support
//!
//! The scoring pipeline only needs one capability from a trained model: given a
//! single canonical feature row, return the `[synthetic, human]` class
//! probabilities. [`ProbabilityModel`] is that seam.
//!
//! [`LogisticArtifact`] is the concrete artifact shipped with this crate: a
//! standard scaler plus logistic-regression coefficients, persisted as JSON.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{FEATURE_COUNT, FEATURE_NAMES};

/// Errors raised while loading or querying a trained artifact
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("dimension mismatch in {field}: expected {expected}, got {got}")]
    DimensionMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("feature order mismatch: expected {expected:?}, got {got:?}")]
    FeatureOrderMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    #[error("scaler scale at index {index} is zero or negative: {value}")]
    InvalidScale { index: usize, value: f64 },

    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("artifact JSON parse error: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("artifact IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Probability capability of a trained classifier.
///
/// Implementations must be immutable after construction; one instance is
/// shared by every request.
pub trait ProbabilityModel: fmt::Debug + Send + Sync {
    /// Class probabilities `[p_synthetic, p_human]` for one feature row
    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ModelError>;

    /// Short identifier of the model family (e.g. `"logistic"`)
    fn model_type(&self) -> &str;
}

/// Per-feature standardization fitted at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    fn transform(&self, index: usize, value: f64) -> f64 {
        (value - self.mean[index]) / self.scale[index]
    }
}

/// Training metadata carried alongside the artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub training_samples: Option<usize>,
    #[serde(default)]
    pub testing_samples: Option<usize>,
    #[serde(default)]
    pub trained_at: Option<String>,
}

/// Logistic-regression artifact: scaler, coefficients and intercept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticArtifact {
    #[serde(default = "default_model_type")]
    pub model_type: String,
    /// Must equal [`FEATURE_NAMES`]
    pub feature_names: Vec<String>,
    pub scaler: FeatureScaler,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub metadata: ArtifactMetadata,
}

fn default_model_type() -> String {
    "logistic".to_string()
}

impl LogisticArtifact {
    /// Load and validate an artifact from JSON
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let artifact: Self = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Load and validate an artifact from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Check that the artifact is structurally sound for the canonical feature set
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ModelError::FeatureOrderMismatch {
                expected: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
                got: self.feature_names.clone(),
            });
        }

        check_len("coefficients", &self.coefficients)?;
        check_len("scaler.mean", &self.scaler.mean)?;
        check_len("scaler.scale", &self.scaler.scale)?;

        check_finite("coefficients", &self.coefficients)?;
        check_finite("scaler.mean", &self.scaler.mean)?;
        check_finite("scaler.scale", &self.scaler.scale)?;
        if !self.intercept.is_finite() {
            return Err(ModelError::NonFinite("intercept"));
        }

        if let Some((index, &value)) = self
            .scaler
            .scale
            .iter()
            .enumerate()
            .find(|(_, s)| **s <= 0.0)
        {
            return Err(ModelError::InvalidScale { index, value });
        }

        Ok(())
    }

    /// Linear decision value for one row (scaled features · coefficients + intercept)
    fn decision(&self, row: &[f64]) -> f64 {
        row.iter()
            .enumerate()
            .map(|(i, value)| self.coefficients[i] * self.scaler.transform(i, *value))
            .sum::<f64>()
            + self.intercept
    }
}

impl ProbabilityModel for LogisticArtifact {
    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ModelError> {
        if row.len() != FEATURE_COUNT {
            return Err(ModelError::DimensionMismatch {
                field: "row",
                expected: FEATURE_COUNT,
                got: row.len(),
            });
        }

        let human = sigmoid(self.decision(row));
        if !human.is_finite() {
            return Err(ModelError::NonFinite("prediction"));
        }

        Ok([1.0 - human, human])
    }

    fn model_type(&self) -> &str {
        &self.model_type
    }
}

fn check_len(field: &'static str, values: &[f64]) -> Result<(), ModelError> {
    if values.len() != FEATURE_COUNT {
        return Err(ModelError::DimensionMismatch {
            field,
            expected: FEATURE_COUNT,
            got: values.len(),
        });
    }
    Ok(())
}

fn check_finite(field: &'static str, values: &[f64]) -> Result<(), ModelError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ModelError::NonFinite(field))
    }
}

/// Numerically stable logistic function
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../tests/fixtures/logistic_model.json");

    #[test]
    fn test_fixture_loads() {
        let artifact = LogisticArtifact::from_json(FIXTURE).unwrap();
        assert_eq!(artifact.model_type(), "logistic");
        assert_eq!(artifact.metadata.training_samples, Some(28));
    }

    #[test]
    fn test_sigmoid_properties() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(10.0) > 0.999);
        assert!(sigmoid(-10.0) < 0.001);
        assert!(sigmoid(1000.0).is_finite());
        assert!(sigmoid(-1000.0).is_finite());
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let artifact = LogisticArtifact::from_json(FIXTURE).unwrap();
        let [synthetic, human] = artifact
            .predict_proba(&[1.8, 0.5, 0.85, 0.6, 500.0, 15.0, 0.05])
            .unwrap();

        assert!((synthetic + human - 1.0).abs() < 1e-12);
        assert!(human > 0.9);
    }

    #[test]
    fn test_bot_like_row_scores_low() {
        let artifact = LogisticArtifact::from_json(FIXTURE).unwrap();
        let [_, human] = artifact
            .predict_proba(&[0.8, 0.05, 0.0, 0.1, 150.0, 2.0, 0.005])
            .unwrap();

        assert!(human < 0.1);
    }

    #[test]
    fn test_mean_row_scores_at_intercept() {
        let artifact = LogisticArtifact::from_json(FIXTURE).unwrap();
        let row = artifact.scaler.mean.clone();
        let [_, human] = artifact.predict_proba(&row).unwrap();

        assert!((human - sigmoid(artifact.intercept)).abs() < 1e-12);
    }

    #[test]
    fn test_row_dimension_mismatch() {
        let artifact = LogisticArtifact::from_json(FIXTURE).unwrap();
        let err = artifact.predict_proba(&[1.0, 2.0]).unwrap_err();

        assert!(matches!(
            err,
            ModelError::DimensionMismatch { expected: 7, got: 2, .. }
        ));
    }

    #[test]
    fn test_rejects_wrong_feature_order() {
        let mut value: serde_json::Value = serde_json::from_str(FIXTURE).unwrap();
        value["feature_names"].as_array_mut().unwrap().swap(0, 1);

        let err = LogisticArtifact::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, ModelError::FeatureOrderMismatch { .. }));
    }

    #[test]
    fn test_rejects_short_coefficients() {
        let mut value: serde_json::Value = serde_json::from_str(FIXTURE).unwrap();
        value["coefficients"].as_array_mut().unwrap().pop();

        let err = LogisticArtifact::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DimensionMismatch { field: "coefficients", expected: 7, got: 6 }
        ));
    }

    #[test]
    fn test_rejects_zero_scale() {
        let mut value: serde_json::Value = serde_json::from_str(FIXTURE).unwrap();
        value["scaler"]["scale"][4] = serde_json::json!(0.0);

        let err = LogisticArtifact::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidScale { index: 4, .. }));
    }

    #[test]
    fn test_invalid_json() {
        let err = LogisticArtifact::from_json("not json").unwrap_err();
        assert!(matches!(err, ModelError::ParseJson(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = LogisticArtifact::from_file(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }
}
