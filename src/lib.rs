//! LiveProof - Human presence verification from behavioral telemetry
//!
//! LiveProof scores a short session of behavioral features (reaction timing,
//! cursor dynamics, task accuracy) and returns the confidence that a human
//! produced it, together with a ranked explanation of the signals involved:
//! feature vector → unit normalization → confidence estimation (trained model
//! or rule-based fallback) → explainability ranking → result record.
//!
//! ## Modules
//!
//! - **Scoring**: model-backed and rule-based confidence strategies
//! - **Explain**: per-signal contributions, independent of the scoring path
//! - **Model**: the trained-artifact seam and the JSON logistic artifact

pub mod config;
pub mod error;
pub mod explain;
pub mod features;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod scoring;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::VerifierConfig;
pub use error::VerifyError;
pub use model::{LogisticArtifact, ModelError, ProbabilityModel};
pub use pipeline::{verify_json, Verifier};
pub use types::{
    ErrorResponse, Feature, FeatureContribution, FeatureMap, FeatureVector, ModelUsed,
    VerificationRequest, VerificationResponse, VerificationResult, VerifierStats, FEATURE_COUNT,
    FEATURE_NAMES,
};

/// LiveProof version
pub const LIVEPROOF_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name reported by diagnostics
pub const SERVICE_NAME: &str = "liveproof";
