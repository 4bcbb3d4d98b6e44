//! Core data types for LiveProof
//!
//! These types flow through the verification pipeline: the caller's raw
//! feature mapping, the fixed-order feature vector consumed by the trained
//! model, the explainability contributions, and the final result record.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of features in the canonical feature vector
pub const FEATURE_COUNT: usize = 7;

/// Canonical feature-name order shared by the vector builder and trained artifacts
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "avg_reaction_time",
    "reaction_time_variance",
    "task_accuracy",
    "hesitation_time",
    "cursor_path_length",
    "cursor_direction_changes",
    "speed_variance",
];

/// Behavioral features, in canonical vector order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Mean reaction time (seconds, or milliseconds from most producers)
    AvgReactionTime,
    /// Variance of reaction times
    ReactionTimeVariance,
    /// Fraction of tasks answered correctly (0-1)
    TaskAccuracy,
    /// Mean pause before acting
    HesitationTime,
    /// Total cursor travel
    CursorPathLength,
    /// Number of cursor direction reversals
    CursorDirectionChanges,
    /// Variance of cursor speed
    SpeedVariance,
}

impl Feature {
    /// All features in canonical order
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::AvgReactionTime,
        Feature::ReactionTimeVariance,
        Feature::TaskAccuracy,
        Feature::HesitationTime,
        Feature::CursorPathLength,
        Feature::CursorDirectionChanges,
        Feature::SpeedVariance,
    ];

    /// Slot of this feature in a [`FeatureVector`]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Wire name of this feature
    pub const fn name(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-supplied feature mapping.
///
/// Values are kept exactly as received so they can be echoed back in the
/// result. Readers treat missing or non-numeric values as `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMap(BTreeMap<String, Value>);

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a numeric feature value
    pub fn insert(&mut self, feature: Feature, value: f64) {
        self.0.insert(feature.name().to_string(), Value::from(value));
    }

    /// Numeric value of a feature, `0.0` when absent or not a number
    pub fn value(&self, feature: Feature) -> f64 {
        self.0
            .get(feature.name())
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// Raw value as received from the caller
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Feature, f64)> for FeatureMap {
    fn from_iter<I: IntoIterator<Item = (Feature, f64)>>(iter: I) -> Self {
        let mut map = FeatureMap::new();
        for (feature, value) in iter {
            map.insert(feature, value);
        }
        map
    }
}

/// Fixed-order numeric feature vector (see [`FEATURE_NAMES`])
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        self.0[feature.index()] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Which confidence strategy produced the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelUsed {
    #[serde(rename = "ML")]
    Ml,
    #[serde(rename = "Rule-based")]
    RuleBased,
}

impl fmt::Display for ModelUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelUsed::Ml => f.write_str("ML"),
            ModelUsed::RuleBased => f.write_str("Rule-based"),
        }
    }
}

/// A named, signed weight describing how much one signal argues for "human"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub name: String,
    pub weight: f64,
    pub positive: bool,
}

impl FeatureContribution {
    pub fn new(name: &str, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            weight,
            positive: weight >= 0.0,
        }
    }
}

/// Incoming verification request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    /// Opaque session identifier, passed through unchanged
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub features: Option<FeatureMap>,
}

/// Verification result returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub session_id: String,
    /// Estimated probability that the session was produced by a human
    pub confidence: f64,
    /// Contributions sorted by descending absolute weight
    pub feature_importance: Vec<FeatureContribution>,
    /// The caller's feature mapping, echoed unmodified
    pub features: FeatureMap,
    pub timestamp: DateTime<Utc>,
    pub model_used: ModelUsed,
}

/// Request-level error record returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub session_id: Option<String>,
}

/// Either a result or a request-level error, as sent back over a transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerificationResponse {
    Verified(VerificationResult),
    Failed(ErrorResponse),
}

impl VerificationResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, VerificationResponse::Verified(_))
    }
}

/// Read-only diagnostics about a verifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierStats {
    pub model_loaded: bool,
    pub model_type: Option<String>,
    pub feature_count: usize,
    pub features: Vec<String>,
    pub model_path: Option<String>,
}
