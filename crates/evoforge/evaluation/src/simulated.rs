//! In-process evaluators for tests and development.
//!
//! None of these execute the variant; they exist so the engine can be
//! exercised without wiring real analysis tools.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use evoforge_types::{CodeVariant, Dimension, FitnessWeights};

use crate::error::EvaluationError;
use crate::evaluator::Evaluator;
use crate::set::EvaluatorSet;

/// Returns the same score for every variant.
#[derive(Clone, Debug)]
pub struct FixedEvaluator {
    dimension: Dimension,
    score: f64,
}

impl FixedEvaluator {
    pub fn new(dimension: Dimension, score: f64) -> Self {
        Self { dimension, score }
    }

    /// All four dimensions with placeholder scores (performance 0.8,
    /// security 0.9, maintainability 0.75, coverage 0.85) and default weights.
    pub fn baseline_set() -> EvaluatorSet {
        EvaluatorSet::new()
            .with_weights(FitnessWeights::default())
            .with_evaluator(Self::new(Dimension::Performance, 0.8))
            .with_evaluator(Self::new(Dimension::Security, 0.9))
            .with_evaluator(Self::new(Dimension::Maintainability, 0.75))
            .with_evaluator(Self::new(Dimension::TestCoverage, 0.85))
    }
}

#[async_trait]
impl Evaluator for FixedEvaluator {
    fn dimension(&self) -> Dimension {
        self.dimension
    }

    fn name(&self) -> &str {
        "fixed"
    }

    async fn score(&self, _variant: &CodeVariant, _budget: Duration) -> Result<f64, EvaluationError> {
        Ok(self.score)
    }
}

/// Never returns. Always hits the sandbox budget.
#[derive(Clone, Debug)]
pub struct StallingEvaluator {
    dimension: Dimension,
}

impl StallingEvaluator {
    pub fn new(dimension: Dimension) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Evaluator for StallingEvaluator {
    fn dimension(&self) -> Dimension {
        self.dimension
    }

    fn name(&self) -> &str {
        "stalling"
    }

    async fn score(&self, _variant: &CodeVariant, _budget: Duration) -> Result<f64, EvaluationError> {
        std::future::pending().await
    }
}

/// Always fails with `CrashedOrUnparseable`.
#[derive(Clone, Debug)]
pub struct CrashingEvaluator {
    dimension: Dimension,
    reason: String,
}

impl CrashingEvaluator {
    pub fn new(dimension: Dimension, reason: impl Into<String>) -> Self {
        Self {
            dimension,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Evaluator for CrashingEvaluator {
    fn dimension(&self) -> Dimension {
        self.dimension
    }

    fn name(&self) -> &str {
        "crashing"
    }

    async fn score(&self, _variant: &CodeVariant, _budget: Duration) -> Result<f64, EvaluationError> {
        Err(EvaluationError::crashed(self.reason.clone()))
    }
}

type ScoreFn = dyn Fn(&CodeVariant) -> f64 + Send + Sync;

/// Scores with a synchronous closure over the variant.
#[derive(Clone)]
pub struct FnEvaluator {
    dimension: Dimension,
    name: String,
    f: Arc<ScoreFn>,
}

impl FnEvaluator {
    pub fn new(
        dimension: Dimension,
        f: impl Fn(&CodeVariant) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            dimension,
            name: format!("fn-{dimension}"),
            f: Arc::new(f),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl Evaluator for FnEvaluator {
    fn dimension(&self) -> Dimension {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn score(&self, variant: &CodeVariant, _budget: Duration) -> Result<f64, EvaluationError> {
        Ok((self.f)(variant))
    }
}
