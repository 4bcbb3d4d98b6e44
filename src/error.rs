//! Error types for LiveProof

use thiserror::Error;

use crate::model::ModelError;

/// Errors that can occur while handling a verification request.
///
/// These are the only failures visible outside the scoring pipeline. Model
/// inference failures never surface here; they degrade to rule-based scoring.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Trained artifact error: {0}")]
    ModelError(#[from] ModelError),
}
