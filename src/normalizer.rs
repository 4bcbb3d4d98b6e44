//! Unit normalization
//!
//! Producers report timing either in seconds or in milliseconds, and variance
//! in seconds² or milliseconds². There is no unit field on the wire, so the
//! unit is inferred from the order of magnitude. This is an approximation:
//! values near a threshold (e.g. a 101 ms reaction time vs a 99 s one) are
//! genuinely ambiguous.

use crate::types::{Feature, FeatureVector};

/// Reaction times above this are assumed to be milliseconds
const REACTION_TIME_MS_THRESHOLD: f64 = 100.0;

/// Reaction-time variances above this are assumed to be milliseconds²
const VARIANCE_MS2_THRESHOLD: f64 = 100_000.0;

/// Cursor path lengths above this are rescaled by 1000
const PATH_LENGTH_THRESHOLD: f64 = 1_000.0;

/// Normalizer for feature units
pub struct UnitNormalizer;

impl UnitNormalizer {
    /// Apply unit corrections. Each check is independent and strict (`>`).
    pub fn normalize(mut vector: FeatureVector) -> FeatureVector {
        // Reaction time and hesitation share a unit and are corrected together
        if vector.get(Feature::AvgReactionTime) > REACTION_TIME_MS_THRESHOLD {
            vector.set(
                Feature::AvgReactionTime,
                vector.get(Feature::AvgReactionTime) / 1_000.0,
            );
            vector.set(
                Feature::HesitationTime,
                vector.get(Feature::HesitationTime) / 1_000.0,
            );
        }

        if vector.get(Feature::ReactionTimeVariance) > VARIANCE_MS2_THRESHOLD {
            vector.set(
                Feature::ReactionTimeVariance,
                vector.get(Feature::ReactionTimeVariance) / 1_000_000.0,
            );
        }

        if vector.get(Feature::CursorPathLength) > PATH_LENGTH_THRESHOLD {
            vector.set(
                Feature::CursorPathLength,
                vector.get(Feature::CursorPathLength) / 1_000.0,
            );
        }

        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn vector(values: [f64; 7]) -> FeatureVector {
        FeatureVector(values)
    }

    #[test]
    fn test_milliseconds_rescaled() {
        let normalized =
            UnitNormalizer::normalize(vector([1800.0, 500_000.0, 0.85, 600.0, 5000.0, 15.0, 0.05]));

        assert_eq!(normalized.0, [1.8, 0.5, 0.85, 0.6, 5.0, 15.0, 0.05]);
    }

    #[test]
    fn test_hesitation_follows_reaction_time() {
        // Hesitation alone never triggers a rescale
        let untouched = UnitNormalizer::normalize(vector([1.2, 0.0, 0.0, 600.0, 0.0, 0.0, 0.0]));
        assert_eq!(untouched.get(Feature::HesitationTime), 600.0);

        let rescaled = UnitNormalizer::normalize(vector([150.0, 0.0, 0.0, 400.0, 0.0, 0.0, 0.0]));
        assert_eq!(rescaled.get(Feature::AvgReactionTime), 0.15);
        assert_eq!(rescaled.get(Feature::HesitationTime), 0.4);
    }

    #[test]
    fn test_checks_are_independent() {
        let normalized =
            UnitNormalizer::normalize(vector([1.5, 200_000.0, 0.9, 0.5, 400.0, 3.0, 0.01]));

        assert_eq!(normalized.get(Feature::AvgReactionTime), 1.5);
        assert_eq!(normalized.get(Feature::ReactionTimeVariance), 0.2);
        assert_eq!(normalized.get(Feature::CursorPathLength), 400.0);
    }

    #[test]
    fn test_exact_threshold_not_rescaled() {
        let at_threshold = vector([100.0, 100_000.0, 0.5, 300.0, 1_000.0, 4.0, 0.02]);
        assert_eq!(UnitNormalizer::normalize(at_threshold), at_threshold);
    }

    #[test]
    fn test_below_thresholds_unchanged() {
        let seconds = vector([0.8, 0.05, 0.0, 0.1, 150.0, 2.0, 0.005]);
        assert_eq!(UnitNormalizer::normalize(seconds), seconds);
    }

    proptest! {
        #[test]
        fn prop_below_all_thresholds_is_identity(
            rt in 0.0f64..=100.0,
            var in 0.0f64..=100_000.0,
            acc in 0.0f64..=1.0,
            hes in 0.0f64..1e6,
            path in 0.0f64..=1_000.0,
            dc in 0.0f64..1e6,
            sv in 0.0f64..1e6,
        ) {
            let input = vector([rt, var, acc, hes, path, dc, sv]);
            prop_assert_eq!(UnitNormalizer::normalize(input), input);
        }
    }
}
