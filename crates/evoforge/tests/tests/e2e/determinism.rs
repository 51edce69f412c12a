//! Fixed seed, fixed evaluators: identical runs. Invalid configuration is
//! rejected before any evaluator is called.

use std::sync::atomic::Ordering;

use evoforge_engine::OptimizationEngine;
use evoforge_evaluation::{EvaluatorSet, FixedEvaluator, FnEvaluator};
use evoforge_tests::{
    aggregate_preferring_performance, init_tracing, perfect_set, single_file, CountingEvaluator,
    MIXED,
};
use evoforge_types::{
    ConfigurationError, Dimension, EngineConfig, FitnessWeights, OptimizedResult,
    SelectionStrategy,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Smaller sources are easier to maintain.
fn size_sensitive_set() -> EvaluatorSet {
    perfect_set()
        .with_evaluator(aggregate_preferring_performance())
        .with_evaluator(FnEvaluator::new(Dimension::Maintainability, |v| {
            1.0 - (v.codebase().total_bytes() as f64 / 2_000.0).min(0.9)
        }))
}

async fn run(strategy: SelectionStrategy, seed: u64) -> OptimizedResult {
    let config = EngineConfig::quick()
        .with_max_generations(4)
        .with_convergence_threshold(1.0)
        .with_selection_strategy(strategy)
        .with_crossover_rate(0.5)
        .with_rng_seed(seed);
    OptimizationEngine::new(size_sensitive_set())
        .optimize(single_file(MIXED), config)
        .await
        .unwrap()
}

fn history_ids(result: &OptimizedResult) -> Vec<Vec<String>> {
    result
        .history
        .iter()
        .map(|g| g.member_ids.iter().map(|id| id.to_hex()).collect())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn same_seed_same_champion_and_history() {
    init_tracing();
    for strategy in [
        SelectionStrategy::Elitism,
        SelectionStrategy::Tournament { size: 3 },
        SelectionStrategy::RouletteWheel,
    ] {
        let a = run(strategy, 42).await;
        let b = run(strategy, 42).await;

        assert_eq!(a.best_variant.id(), b.best_variant.id(), "{strategy:?}");
        assert_eq!(a.generations_run, b.generations_run);
        assert_eq!(a.termination_reason, b.termination_reason);
        assert_eq!(history_ids(&a), history_ids(&b), "{strategy:?}");
        assert_ne!(a.run_id, b.run_id);
    }
}

#[tokio::test]
async fn weights_not_summing_to_one_are_rejected_without_evaluation() {
    init_tracing();
    let counting = CountingEvaluator::new(FixedEvaluator::new(Dimension::Performance, 1.0));
    let calls = counting.counter();
    let engine = OptimizationEngine::new(perfect_set().with_evaluator(counting));

    let config = EngineConfig::quick().with_weights(FitnessWeights::new(0.9, 1.1, 0.0, 0.0));
    let err = engine.optimize(single_file(MIXED), config).await.unwrap_err();

    assert!(matches!(err, ConfigurationError::WeightSum(sum) if (sum - 2.0).abs() < 1e-9));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn toml_configuration_drives_a_run() {
    init_tracing();
    let config = EngineConfig::from_toml_str(
        r#"
        population_size = 6
        max_generations = 2
        convergence_threshold = 1.0
        parent_count = 2
        offspring_per_parent = 2
        rng_seed = 5

        [selection_strategy]
        kind = "elitism"

        [evaluator_weights]
        performance = 0.25
        security = 0.25
        maintainability = 0.25
        test_coverage = 0.25
        "#,
    )
    .unwrap();

    let result = OptimizationEngine::new(size_sensitive_set())
        .optimize(single_file(MIXED), config)
        .await
        .unwrap();

    assert_eq!(result.generations_run, 2);
    assert!(result.history.iter().all(|g| g.member_ids.len() <= 6));
    assert_eq!(
        result.best_variant.fitness().unwrap().weights(),
        &FitnessWeights::balanced()
    );
}
