use std::time::Duration;

use async_trait::async_trait;
use evoforge_types::{CodeVariant, Dimension};

use crate::error::EvaluationError;

/// Scores one quality dimension of a variant.
///
/// Implementations adapt an external tool (static analyser, benchmark
/// harness, coverage runner) and must return a score in `[0.0, 1.0]`, higher
/// is better. They are always invoked through an
/// [`ExecutionSandbox`](crate::ExecutionSandbox), which enforces `budget`;
/// an implementation may also honour it itself.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// The dimension this evaluator scores.
    fn dimension(&self) -> Dimension;

    /// Name used in logs.
    fn name(&self) -> &str;

    async fn score(&self, variant: &CodeVariant, budget: Duration) -> Result<f64, EvaluationError>;
}
