//! A codebase with a manually summed loop, scored by a performance evaluator
//! that prefers built-in aggregates, improves within a handful of
//! generations.

use evoforge_engine::OptimizationEngine;
use evoforge_evaluation::{Evaluator, FixedEvaluator};
use evoforge_tests::{
    aggregate_preferring_performance, init_tracing, loop_count, perfect_set, single_file,
    SUMMED_LOOP,
};
use evoforge_types::{CodeVariant, Dimension, EngineConfig};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn engine() -> OptimizationEngine {
    OptimizationEngine::new(perfect_set().with_evaluator(aggregate_preferring_performance()))
}

fn config() -> EngineConfig {
    EngineConfig::quick()
        .with_population_size(10)
        .with_max_generations(5)
        .with_convergence_threshold(1.0)
        .with_rng_seed(7)
}

async fn seed_performance() -> f64 {
    let seed = CodeVariant::seed(single_file(SUMMED_LOOP));
    aggregate_preferring_performance()
        .score(&seed, Duration::from_secs(1))
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn champion_beats_seed_on_performance() {
    init_tracing();
    let seed_perf = seed_performance().await;

    let result = engine().optimize(single_file(SUMMED_LOOP), config()).await.unwrap();

    let champion = result.best_variant.fitness().expect("champion is scored");
    assert!(
        champion.performance() > seed_perf,
        "performance {} did not beat seed {}",
        champion.performance(),
        seed_perf
    );
    assert!(result.generations_run <= 5);
    assert_eq!(loop_count(&result.best_variant), 0);
}

#[tokio::test]
async fn champion_total_is_at_least_seed_total() {
    init_tracing();
    let result = engine().optimize(single_file(SUMMED_LOOP), config()).await.unwrap();

    let seed_total = 0.4 * seed_performance().await + 0.6;
    let best = result.best_variant.total().unwrap();
    assert!(best >= seed_total - 1e-9, "best {best} < seed {seed_total}");
}

#[tokio::test]
async fn rewritten_source_uses_an_iterator_sum() {
    init_tracing();
    let result = engine().optimize(single_file(SUMMED_LOOP), config()).await.unwrap();

    let source = result.best_variant.codebase().get("src/lib.rs").unwrap();
    assert!(source.contains("sum"), "{source}");
    assert!(result.best_variant.lineage().is_some());
    assert!(result.stats.mutations_applied > 0);
}

#[tokio::test]
async fn no_improvement_possible_still_returns_scored_seed() {
    init_tracing();
    let engine = OptimizationEngine::new(
        perfect_set().with_evaluator(FixedEvaluator::new(Dimension::Performance, 0.5)),
    );
    let result = engine
        .optimize(single_file(SUMMED_LOOP), config().with_stagnation_limit(2))
        .await
        .unwrap();

    assert!(result.best_variant.is_scored());
    assert_eq!(result.best_variant.generation(), 0);
    assert!((result.best_total() - 0.8).abs() < 1e-9);
}
