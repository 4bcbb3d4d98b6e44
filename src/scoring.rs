//! Confidence estimation
//!
//! Two interchangeable strategies produce the probability that a session was
//! produced by a human:
//!
//! - **Model-backed**: builds and normalizes the canonical feature vector and
//!   asks a trained artifact for the human-class probability. May fail.
//! - **Rule-based**: additive adjustments over the raw features, clamped to
//!   `[0.2, 0.95]`. Never fails.
//!
//! The verifier picks the fallback when the model-backed strategy errors.

use std::fmt;
use std::sync::Arc;

use crate::features::FeatureVectorBuilder;
use crate::model::{ModelError, ProbabilityModel};
use crate::normalizer::UnitNormalizer;
use crate::types::{Feature, FeatureMap, ModelUsed};

/// Starting confidence for rule-based scoring
const RULE_BASELINE: f64 = 0.5;

/// Rule-based scores never leave this range
const RULE_MIN_CONFIDENCE: f64 = 0.2;
const RULE_MAX_CONFIDENCE: f64 = 0.95;

/// A confidence score together with the strategy that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub confidence: f64,
    pub model_used: ModelUsed,
}

impl Estimate {
    /// Rule-based estimate; always available
    pub fn rule_based(features: &FeatureMap) -> Self {
        Self {
            confidence: RuleBasedScorer::score(features),
            model_used: ModelUsed::RuleBased,
        }
    }
}

/// Confidence strategy selected at verifier construction
#[derive(Clone)]
pub enum ConfidenceStrategy {
    /// Trained artifact, with rule-based fallback on failure
    ModelBacked(Arc<dyn ProbabilityModel>),
    /// Deterministic rules only
    RuleBased,
}

impl fmt::Debug for ConfidenceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceStrategy::ModelBacked(model) => f
                .debug_tuple("ModelBacked")
                .field(&model.model_type())
                .finish(),
            ConfidenceStrategy::RuleBased => f.write_str("RuleBased"),
        }
    }
}

impl ConfidenceStrategy {
    /// Estimate confidence with this strategy alone.
    ///
    /// Model-backed failures are returned, not recovered; the caller decides
    /// whether to fall back.
    pub fn estimate(&self, features: &FeatureMap) -> Result<Estimate, ModelError> {
        match self {
            ConfidenceStrategy::ModelBacked(model) => Ok(Estimate {
                confidence: ModelScorer::score(model.as_ref(), features)?,
                model_used: ModelUsed::Ml,
            }),
            ConfidenceStrategy::RuleBased => Ok(Estimate::rule_based(features)),
        }
    }

    pub fn is_model_backed(&self) -> bool {
        matches!(self, ConfidenceStrategy::ModelBacked(_))
    }

    /// Model family of the loaded artifact, if any
    pub fn model_type(&self) -> Option<&str> {
        match self {
            ConfidenceStrategy::ModelBacked(model) => Some(model.model_type()),
            ConfidenceStrategy::RuleBased => None,
        }
    }
}

/// Scorer backed by a trained artifact
pub struct ModelScorer;

impl ModelScorer {
    /// Human-class probability for the normalized feature vector
    pub fn score(model: &dyn ProbabilityModel, features: &FeatureMap) -> Result<f64, ModelError> {
        let vector = UnitNormalizer::normalize(FeatureVectorBuilder::build(features));
        let [_, human] = model.predict_proba(vector.as_slice())?;

        if !human.is_finite() {
            return Err(ModelError::NonFinite("human-class probability"));
        }
        Ok(human)
    }
}

/// Deterministic fallback scorer
pub struct RuleBasedScorer;

impl RuleBasedScorer {
    /// Score raw features. Reaction time is read in milliseconds.
    pub fn score(features: &FeatureMap) -> f64 {
        let mut score = RULE_BASELINE;

        let reaction_time_sec = features.value(Feature::AvgReactionTime) / 1_000.0;
        if reaction_time_sec < 2.0 {
            score += 0.15;
        } else if reaction_time_sec > 5.0 {
            score -= 0.10;
        }

        // Humans are inconsistent
        if features.value(Feature::ReactionTimeVariance) > 100_000.0 {
            score += 0.15;
        } else {
            score -= 0.10;
        }

        if features.value(Feature::TaskAccuracy) > 0.6 {
            score += 0.10;
        } else {
            score -= 0.05;
        }

        if features.value(Feature::CursorDirectionChanges) > 5.0 {
            score += 0.10;
        }

        if features.value(Feature::SpeedVariance) > 0.01 {
            score += 0.10;
        }

        score.clamp(RULE_MIN_CONFIDENCE, RULE_MAX_CONFIDENCE)
    }
}
