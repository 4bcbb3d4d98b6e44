//! Verifier configuration

use std::env;
use std::path::PathBuf;

/// Default location of the trained artifact
pub const DEFAULT_MODEL_PATH: &str = "model.json";

/// Configuration for building a [`crate::Verifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Path to the trained artifact JSON
    pub model_path: PathBuf,

    /// Fail instead of falling back to rule-based mode when the artifact is missing
    pub require_model: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            require_model: false,
        }
    }
}

impl VerifierConfig {
    /// Load configuration from environment variables
    ///
    /// - `LIVEPROOF_MODEL_PATH`: artifact path (default `model.json`)
    /// - `LIVEPROOF_REQUIRE_MODEL`: `1` or `true` to require the artifact
    pub fn from_env() -> Self {
        Self {
            model_path: env::var("LIVEPROOF_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH)),

            require_model: env::var("LIVEPROOF_REQUIRE_MODEL")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_require_model(mut self, require: bool) -> Self {
        self.require_model = require;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
