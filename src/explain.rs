//! Explainability ranking
//!
//! Produces a signed, human-readable weight for each behavioral signal. The
//! ranking is re-derived from the raw feature mapping and is independent of the
//! confidence strategy that ran: it is advisory and is not a decomposition of
//! the actual score. Its thresholds deliberately differ from the rule-based
//! scorer's.

use crate::types::{Feature, FeatureContribution, FeatureMap};

/// Name of the derived cursor-shape signal
pub const CURSOR_ENTROPY: &str = "cursor_entropy";

/// Number of contributions produced per request
pub const CONTRIBUTION_COUNT: usize = 6;

/// Ranker for per-signal contributions
pub struct ExplainabilityRanker;

impl ExplainabilityRanker {
    /// Compute all contributions and sort them by descending absolute weight.
    ///
    /// The sort is stable, so equal magnitudes keep evaluation order.
    pub fn rank(features: &FeatureMap) -> Vec<FeatureContribution> {
        let mut contributions = vec![
            reaction_time(features),
            reaction_time_variance(features),
            task_accuracy(features),
            cursor_entropy(features),
            speed_variance(features),
            hesitation_time(features),
        ];

        contributions.sort_by(|a, b| b.weight.abs().total_cmp(&a.weight.abs()));
        contributions
    }
}

/// Fast reactions (under 2s) are typical of engaged humans
fn reaction_time(features: &FeatureMap) -> FeatureContribution {
    let seconds = features.value(Feature::AvgReactionTime) / 1_000.0;
    let weight = if seconds < 2.0 { 0.22 } else { -0.12 };
    FeatureContribution::new(Feature::AvgReactionTime.name(), weight)
}

/// Humans have variance
fn reaction_time_variance(features: &FeatureMap) -> FeatureContribution {
    let weight = if features.value(Feature::ReactionTimeVariance) > 100_000.0 {
        0.18
    } else {
        -0.15
    };
    FeatureContribution::new(Feature::ReactionTimeVariance.name(), weight)
}

fn task_accuracy(features: &FeatureMap) -> FeatureContribution {
    let weight = if features.value(Feature::TaskAccuracy) > 0.6 {
        0.15
    } else {
        -0.10
    };
    FeatureContribution::new(Feature::TaskAccuracy.name(), weight)
}

/// Derived from direction changes. Rare changes are still weak positive evidence.
fn cursor_entropy(features: &FeatureMap) -> FeatureContribution {
    let weight = if features.value(Feature::CursorDirectionChanges) > 5.0 {
        0.12
    } else {
        0.05
    };
    FeatureContribution::new(CURSOR_ENTROPY, weight)
}

fn speed_variance(features: &FeatureMap) -> FeatureContribution {
    let weight = if features.value(Feature::SpeedVariance) > 0.01 {
        0.14
    } else {
        -0.08
    };
    FeatureContribution::new(Feature::SpeedVariance.name(), weight)
}

/// Some hesitation is human; none at all is not
fn hesitation_time(features: &FeatureMap) -> FeatureContribution {
    let seconds = features.value(Feature::HesitationTime) / 1_000.0;
    let weight = if seconds > 0.2 && seconds < 1.5 {
        0.10
    } else if seconds < 0.2 {
        -0.06
    } else {
        0.03
    };
    FeatureContribution::new(Feature::HesitationTime.name(), weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn features(values: [f64; 7]) -> FeatureMap {
        Feature::ALL.into_iter().zip(values).collect()
    }

    fn ranked_pairs(features: &FeatureMap) -> Vec<(String, f64)> {
        ExplainabilityRanker::rank(features)
            .into_iter()
            .map(|c| (c.name, c.weight))
            .collect()
    }

    fn pairs(expected: &[(&str, f64)]) -> Vec<(String, f64)> {
        expected.iter().map(|(n, w)| (n.to_string(), *w)).collect()
    }

    #[test]
    fn test_human_like_ranking() {
        let sample = features([1800.0, 500_000.0, 0.85, 600.0, 500.0, 15.0, 0.05]);

        assert_eq!(
            ranked_pairs(&sample),
            pairs(&[
                ("avg_reaction_time", 0.22),
                ("reaction_time_variance", 0.18),
                ("task_accuracy", 0.15),
                ("speed_variance", 0.14),
                ("cursor_entropy", 0.12),
                ("hesitation_time", 0.10),
            ])
        );
        assert!(ExplainabilityRanker::rank(&sample).iter().all(|c| c.positive));
    }

    #[test]
    fn test_bot_like_ranking() {
        let sample = features([800.0, 50_000.0, 0.0, 100.0, 150.0, 2.0, 0.005]);

        assert_eq!(
            ranked_pairs(&sample),
            pairs(&[
                ("avg_reaction_time", 0.22),
                ("reaction_time_variance", -0.15),
                ("task_accuracy", -0.10),
                ("speed_variance", -0.08),
                ("hesitation_time", -0.06),
                ("cursor_entropy", 0.05),
            ])
        );
    }

    #[test]
    fn test_empty_mapping_ranking() {
        let ranked = ExplainabilityRanker::rank(&FeatureMap::new());

        assert_eq!(ranked.len(), CONTRIBUTION_COUNT);
        assert_eq!(ranked[0].name, "avg_reaction_time");
        assert!(ranked[0].positive);

        let cursor = ranked.iter().find(|c| c.name == CURSOR_ENTROPY).unwrap();
        assert_eq!(cursor.weight, 0.05);
        assert!(cursor.positive);
    }

    #[test]
    fn test_slow_reaction_negative() {
        let sample = features([2500.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let ranked = ExplainabilityRanker::rank(&sample);
        let reaction = ranked.iter().find(|c| c.name == "avg_reaction_time").unwrap();

        assert_eq!(reaction.weight, -0.12);
        assert!(!reaction.positive);
    }

    #[test]
    fn test_hesitation_branches() {
        let weight_for = |ms: f64| {
            let sample: FeatureMap = [(Feature::HesitationTime, ms)].into_iter().collect();
            hesitation_time(&sample).weight
        };

        assert_eq!(weight_for(100.0), -0.06);
        assert_eq!(weight_for(600.0), 0.10);
        assert_eq!(weight_for(1500.0), 0.03);
        assert_eq!(weight_for(4000.0), 0.03);
        // Exactly 0.2s is neither inside the window nor below it
        assert_eq!(weight_for(200.0), 0.03);
    }

    #[test]
    fn test_equal_weights_keep_evaluation_order() {
        // Slow reaction (-0.12) ties with high cursor entropy (+0.12)
        let sample = features([3000.0, 500_000.0, 0.9, 600.0, 0.0, 10.0, 0.05]);
        let names: Vec<String> = ExplainabilityRanker::rank(&sample)
            .into_iter()
            .map(|c| c.name)
            .collect();

        let reaction = names.iter().position(|n| n == "avg_reaction_time").unwrap();
        let cursor = names.iter().position(|n| n == CURSOR_ENTROPY).unwrap();
        assert_eq!(cursor, reaction + 1);
    }

    proptest! {
        #[test]
        fn prop_six_contributions_sorted(
            values in proptest::collection::vec(proptest::option::of(0.0f64..1e9), 7)
        ) {
            let sample: FeatureMap = Feature::ALL
                .into_iter()
                .zip(values)
                .filter_map(|(feature, value)| value.map(|v| (feature, v)))
                .collect();

            let ranked = ExplainabilityRanker::rank(&sample);
            prop_assert_eq!(ranked.len(), CONTRIBUTION_COUNT);
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].weight.abs() >= pair[1].weight.abs());
            }
            for contribution in &ranked {
                prop_assert_eq!(contribution.positive, contribution.weight >= 0.0);
            }
        }
    }
}
