//! Verification pipeline orchestration
//!
//! This module provides the public API for verifying a session. It runs the
//! confidence estimator (with rule-based fallback), ranks the explainability
//! contributions, and assembles the result record.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::VerifierConfig;
use crate::error::VerifyError;
use crate::explain::ExplainabilityRanker;
use crate::model::{LogisticArtifact, ModelError, ProbabilityModel};
use crate::scoring::{ConfidenceStrategy, Estimate};
use crate::types::{
    ErrorResponse, FeatureMap, VerificationRequest, VerificationResponse, VerificationResult,
    VerifierStats, FEATURE_COUNT, FEATURE_NAMES,
};

/// Verify a request JSON with rule-based scoring (stateless, one-shot).
///
/// # Arguments
/// * `request_json` - `{"sessionId": ..., "features": {...}}`
///
/// # Returns
/// Verification result JSON string
///
/// # Example
/// ```ignore
/// let result_json = verify_json(request_json)?;
/// ```
pub fn verify_json(request_json: String) -> Result<String, VerifyError> {
    Verifier::rule_based().verify_json(&request_json)
}

/// Session verifier.
///
/// Holds the immutable artifact state chosen at construction. `verify` takes
/// `&self`, so one verifier can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct Verifier {
    strategy: ConfidenceStrategy,
    model_path: Option<PathBuf>,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::rule_based()
    }
}

impl Verifier {
    /// Create a verifier from an optional trained artifact
    pub fn new(artifact: Option<Arc<dyn ProbabilityModel>>) -> Self {
        let strategy = match artifact {
            Some(model) => ConfidenceStrategy::ModelBacked(model),
            None => ConfidenceStrategy::RuleBased,
        };
        Self {
            strategy,
            model_path: None,
        }
    }

    /// Create a verifier that always uses rule-based scoring
    pub fn rule_based() -> Self {
        Self::new(None)
    }

    /// Create a verifier backed by a trained artifact
    pub fn with_artifact(artifact: Arc<dyn ProbabilityModel>) -> Self {
        Self::new(Some(artifact))
    }

    /// Create a verifier from configuration, loading the artifact if present.
    ///
    /// A missing artifact selects rule-based mode unless `require_model` is set.
    /// An artifact that exists but fails to load is always an error.
    pub fn from_config(config: &VerifierConfig) -> Result<Self, VerifyError> {
        let path = &config.model_path;

        let strategy = if path.exists() {
            let artifact = LogisticArtifact::from_file(path)?;
            info!(
                path = %path.display(),
                model_type = %artifact.model_type,
                "trained artifact loaded"
            );
            ConfidenceStrategy::ModelBacked(Arc::new(artifact))
        } else if config.require_model {
            return Err(ModelError::NotFound(path.display().to_string()).into());
        } else {
            warn!(
                path = %path.display(),
                "trained artifact not found, operating in rule-based mode"
            );
            ConfidenceStrategy::RuleBased
        };

        Ok(Self {
            strategy,
            model_path: Some(path.clone()),
        })
    }

    /// Verify one session.
    ///
    /// Never fails: model errors degrade to rule-based scoring for this call.
    pub fn verify(
        &self,
        session_id: impl Into<String>,
        features: &FeatureMap,
    ) -> VerificationResult {
        let session_id = session_id.into();
        debug!(session_id = %session_id, feature_count = features.len(), "verification request");

        let estimate = self.estimate(&session_id, features);
        let feature_importance = ExplainabilityRanker::rank(features);

        debug!(
            session_id = %session_id,
            confidence = estimate.confidence,
            model_used = %estimate.model_used,
            "verification complete"
        );

        VerificationResult {
            session_id,
            confidence: estimate.confidence,
            feature_importance,
            features: features.clone(),
            timestamp: Utc::now(),
            model_used: estimate.model_used,
        }
    }

    /// Verify a parsed request, rejecting structurally incomplete ones
    pub fn verify_request(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationResult, VerifyError> {
        let session_id = request
            .session_id
            .ok_or_else(|| VerifyError::MissingField("sessionId".to_string()))?;
        let features = request
            .features
            .ok_or_else(|| VerifyError::MissingField("features".to_string()))?;

        Ok(self.verify(session_id, &features))
    }

    /// Verify a request JSON and return the result JSON
    pub fn verify_json(&self, request_json: &str) -> Result<String, VerifyError> {
        let request: VerificationRequest = serde_json::from_str(request_json)?;
        let result = self.verify_request(request)?;
        Ok(serde_json::to_string(&result)?)
    }

    /// Verify a request JSON, mapping request-level failures to an error record.
    ///
    /// The session id is recovered from the input when it is readable.
    pub fn respond(&self, request_json: &str) -> VerificationResponse {
        match serde_json::from_str::<VerificationRequest>(request_json) {
            Ok(request) => self.respond_request(request),
            Err(e) => failure(VerifyError::from(e), recover_session_id(request_json)),
        }
    }

    /// Verify a parsed request, mapping request-level failures to an error record
    pub fn respond_request(&self, request: VerificationRequest) -> VerificationResponse {
        let session_id = request.session_id.clone();
        match self.verify_request(request) {
            Ok(result) => VerificationResponse::Verified(result),
            Err(e) => failure(e, session_id),
        }
    }

    /// Whether a trained artifact is loaded
    pub fn model_loaded(&self) -> bool {
        self.strategy.is_model_backed()
    }

    /// Diagnostics for the surrounding service
    pub fn stats(&self) -> VerifierStats {
        VerifierStats {
            model_loaded: self.model_loaded(),
            model_type: self.strategy.model_type().map(str::to_string),
            feature_count: FEATURE_COUNT,
            features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            model_path: self
                .model_path
                .as_ref()
                .map(|p| p.display().to_string()),
        }
    }

    fn estimate(&self, session_id: &str, features: &FeatureMap) -> Estimate {
        match self.strategy.estimate(features) {
            Ok(estimate) => estimate,
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    error = %e,
                    "model prediction failed, falling back to rule-based scoring"
                );
                Estimate::rule_based(features)
            }
        }
    }
}

fn failure(error: VerifyError, session_id: Option<String>) -> VerificationResponse {
    warn!(error = %error, session_id = ?session_id, "verification request failed");
    VerificationResponse::Failed(ErrorResponse {
        error: error.to_string(),
        session_id,
    })
}

fn recover_session_id(request_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(request_json).ok()?;
    value.get("sessionId")?.as_str().map(str::to_string)
}
