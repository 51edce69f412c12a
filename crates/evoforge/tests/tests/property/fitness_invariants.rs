//! Property: a fitness total is always the weighted sum of its clamped
//! sub-scores, and weights are accepted only when they sum to 1.0.

use evoforge_types::{
    ConfigurationError, Dimension, FitnessScore, FitnessWeights, SubScores, WEIGHT_SUM_TOLERANCE,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_weights() -> impl Strategy<Value = FitnessWeights> {
    (0.01f64..1.0, 0.01f64..1.0, 0.01f64..1.0, 0.0f64..1.0).prop_map(|(p, s, m, t)| {
        let sum = p + s + m + t;
        FitnessWeights::new(p / sum, s / sum, m / sum, t / sum)
    })
}

/// Raw scores as evaluators might report them, including out-of-range values.
fn arb_raw_score() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => 0.0f64..=1.0,
        1 => -5.0f64..0.0,
        1 => 1.0f64..5.0,
    ]
}

fn arb_sub_scores() -> impl Strategy<Value = SubScores> {
    (arb_raw_score(), arb_raw_score(), arb_raw_score(), arb_raw_score()).prop_map(
        |(performance, security, maintainability, test_coverage)| SubScores {
            performance,
            security,
            maintainability,
            test_coverage,
        },
    )
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn total_is_weighted_sum_of_clamped_scores(
        scores in arb_sub_scores(),
        weights in arb_weights(),
    ) {
        prop_assert!(weights.validate().is_ok());
        let fitness = FitnessScore::new(scores, weights);

        let expected: f64 = Dimension::ALL
            .iter()
            .map(|d| weights.weight(*d) * scores.get(*d).clamp(0.0, 1.0))
            .sum();
        prop_assert!((fitness.total() - expected).abs() < 1e-12);
        prop_assert!((-1e-12..=1.0 + 1e-12).contains(&fitness.total()));
        for d in Dimension::ALL {
            prop_assert!((0.0..=1.0).contains(&fitness.get(d)));
        }
    }

    #[test]
    fn deserialized_total_is_recomputed(
        scores in arb_sub_scores(),
        weights in arb_weights(),
    ) {
        let fitness = FitnessScore::new(scores, weights);
        let mut json = serde_json::to_value(&fitness).unwrap();
        json["total"] = serde_json::json!(42.0);

        let back: FitnessScore = serde_json::from_value(json).unwrap();
        prop_assert!((back.total() - fitness.total()).abs() < 1e-12);
    }

    #[test]
    fn weights_off_by_more_than_tolerance_are_rejected(
        weights in arb_weights(),
        factor in prop_oneof![0.1f64..0.99, 1.01f64..3.0],
    ) {
        let scaled = FitnessWeights::new(
            weights.performance * factor,
            weights.security * factor,
            weights.maintainability * factor,
            weights.test_coverage * factor,
        );
        prop_assert!((scaled.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE);
        let rejected = matches!(scaled.validate(), Err(ConfigurationError::WeightSum(_)));
        prop_assert!(rejected);
    }

    #[test]
    fn negative_weight_is_rejected(weights in arb_weights(), value in -1.0f64..-0.001) {
        let mut bad = weights;
        bad.security = value;
        let rejected = matches!(
            bad.validate(),
            Err(ConfigurationError::InvalidWeight { dimension: Dimension::Security, .. })
        );
        prop_assert!(rejected);
    }
}
