use serde::{Deserialize, Serialize};

use crate::fitness::Dimension;

/// Invalid engine configuration. The only failure `optimize()` reports to its
/// caller; always raised before any evaluation work starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum ConfigurationError {
    #[error("evaluator weights must sum to 1.0 (got {0:.6})")]
    WeightSum(f64),

    #[error("weight for {dimension} must be a finite non-negative number (got {value})")]
    InvalidWeight { dimension: Dimension, value: f64 },

    #[error("population size must be at least 1")]
    ZeroPopulation,

    #[error("convergence threshold must lie in [0, 1] (got {0})")]
    ConvergenceThreshold(f64),

    #[error("max_parallel_evaluations must be at least 1")]
    ZeroParallelism,

    #[error("parent count must be in 1..={population_size} (got {parent_count})")]
    ParentCount {
        parent_count: usize,
        population_size: usize,
    },

    #[error("offspring_per_parent must be at least 1")]
    ZeroOffspring,

    #[error("tournament size must be at least 1")]
    TournamentSize,

    #[error("stagnation limit must be at least 1")]
    ZeroStagnationLimit,

    #[error("{0} must be greater than zero")]
    ZeroDuration(String),

    #[error("crossover rate must lie in [0, 1] (got {0})")]
    CrossoverRate(f64),

    #[error("codebase contains no files")]
    EmptyCodebase,

    #[error("no evaluator registered for weighted dimension {0}")]
    MissingEvaluator(Dimension),

    #[error("seed codebase rejected by evaluators: {0}")]
    SeedRejected(String),

    #[error("configuration file error: {0}")]
    File(String),
}
