//! Feature vector construction
//!
//! Maps the caller's unordered feature mapping onto the fixed-order vector
//! expected by trained artifacts.

use crate::types::{Feature, FeatureMap, FeatureVector};

/// Builder for canonical feature vectors
pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    /// Build a vector in canonical order, substituting `0.0` for missing features
    pub fn build(features: &FeatureMap) -> FeatureVector {
        let mut vector = FeatureVector::default();
        for feature in Feature::ALL {
            vector.set(feature, features.value(feature));
        }
        vector
    }
}
