//! End-to-end scenarios for the evoforge optimizer.
//!
//! Each module drives `OptimizationEngine::optimize` (or the evaluation and
//! cache layers directly) with deterministic stub evaluators.

#[path = "e2e/summed_loop.rs"]
mod summed_loop;

#[path = "e2e/evaluator_timeout.rs"]
mod evaluator_timeout;

#[path = "e2e/invalid_mutations.rs"]
mod invalid_mutations;

#[path = "e2e/determinism.rs"]
mod determinism;

#[path = "e2e/fitness_cache.rs"]
mod fitness_cache;

#[path = "e2e/run_timeout.rs"]
mod run_timeout;

#[path = "e2e/champion.rs"]
mod champion;
