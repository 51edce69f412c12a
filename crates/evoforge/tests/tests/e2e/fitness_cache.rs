//! Identical content is evaluated once per run, however it is reached.

use std::sync::atomic::Ordering;
use std::time::Duration;

use evoforge_engine::OptimizationEngine;
use evoforge_evaluation::{EvaluatorSet, FixedEvaluator};
use evoforge_store::VariantStore;
use evoforge_tests::{
    aggregate_preferring_performance, init_tracing, perfect_set, single_file, CountingEvaluator,
    MIXED,
};
use evoforge_types::{CodeVariant, Codebase, Dimension, EngineConfig};
use futures::future::join_all;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn two_files(first: (&str, &str), second: (&str, &str)) -> CodeVariant {
    CodeVariant::seed(Codebase::from_files([first, second]))
}

fn counted_set(counting: CountingEvaluator) -> EvaluatorSet {
    perfect_set().with_evaluator(counting)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn file_order_does_not_change_identity() {
    init_tracing();
    let a = two_files(("a.rs", "fn a() {}"), ("b.rs", "fn b() {}"));
    let b = two_files(("b.rs", "fn b() {}"), ("a.rs", "fn a() {}"));
    assert_eq!(a.id(), b.id());

    let counting = CountingEvaluator::new(FixedEvaluator::new(Dimension::Performance, 0.6));
    let set = counted_set(counting.clone());
    let store = VariantStore::new();

    let first = store.get_or_evaluate(a, &set).await.unwrap();
    let second = store.get_or_evaluate(b, &set).await.unwrap();

    assert_eq!(counting.calls(), 1);
    assert_eq!(first.fitness(), second.fitness());
    assert_eq!(store.evaluations(), 1);
    assert_eq!(store.cache_hits(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_one_evaluation() {
    init_tracing();
    let counting = CountingEvaluator::new(FixedEvaluator::new(Dimension::Performance, 0.6))
        .with_delay(Duration::from_millis(50));
    let set = counted_set(counting.clone());
    let store = VariantStore::new();

    let requests = (0..16).map(|_| {
        let variant = CodeVariant::seed(single_file(MIXED));
        store.get_or_evaluate(variant, &set)
    });
    let results = join_all(requests).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(counting.calls(), 1);
    assert_eq!(store.evaluations(), 1);
    assert_eq!(store.cache_hits(), 15);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn engine_calls_each_evaluator_once_per_distinct_variant() {
    init_tracing();
    let counting = CountingEvaluator::new(aggregate_preferring_performance());
    let calls = counting.counter();
    let engine = OptimizationEngine::new(counted_set(counting));

    let config = EngineConfig::quick()
        .with_max_generations(5)
        .with_convergence_threshold(1.0)
        .with_rng_seed(23);
    let result = engine.optimize(single_file(MIXED), config).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst) as u64, result.stats.evaluations);
    assert!(result.stats.evaluations >= 1);
    let hit_rate = result.stats.cache_hit_rate();
    assert!((0.0..=1.0).contains(&hit_rate));
}
