use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use evoforge_types::CodeVariant;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::EvaluationError;
use crate::evaluator::Evaluator;

/// Execution context for evaluator invocations.
///
/// The sandbox owns the budget: whatever the evaluator does, `run` returns
/// within `budget` (plus scheduling slack), and a failure inside one
/// invocation never reaches the caller as anything but an
/// [`EvaluationError`].
#[async_trait]
pub trait ExecutionSandbox: Send + Sync {
    async fn run(
        &self,
        evaluator: Arc<dyn Evaluator>,
        variant: Arc<CodeVariant>,
        budget: Duration,
    ) -> Result<f64, EvaluationError>;
}

/// Runs every invocation on its own OS thread with a private current-thread
/// runtime, and waits for the result on the caller's runtime.
///
/// - the wait is bounded by the budget (`Timeout`), even when the evaluator
///   blocks or spins without yielding;
/// - a panic in the evaluator becomes `CrashedOrUnparseable`;
/// - a non-finite score becomes `CrashedOrUnparseable`, a finite score outside
///   `[0, 1]` is clamped;
/// - once the caller stops waiting (timeout or dropped future) the
///   evaluator's future is dropped at its next await point. A synchronous
///   evaluator keeps its thread until it returns, and its result is
///   discarded.
///
/// CPU-time and memory ceilings need a separate process; evaluators that
/// execute variant code get them from
/// [`CommandEvaluator`](crate::CommandEvaluator).
#[derive(Clone, Debug, Default)]
pub struct ThreadSandbox;

type Reply = oneshot::Sender<Result<f64, EvaluationError>>;

/// Body of the evaluation thread.
fn score_isolated(
    evaluator: Arc<dyn Evaluator>,
    variant: Arc<CodeVariant>,
    budget: Duration,
    cancel: oneshot::Receiver<()>,
    reply: Reply,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = reply.send(Err(EvaluationError::crashed(format!(
                "building evaluator runtime: {e}"
            ))));
            return;
        }
    };

    runtime.block_on(async move {
        tokio::select! {
            result = evaluator.score(&variant, budget) => {
                if reply.send(result).is_err() {
                    debug!(evaluator = evaluator.name(), "Late result discarded");
                }
            }
            _ = cancel => {}
        }
    });
}

#[async_trait]
impl ExecutionSandbox for ThreadSandbox {
    async fn run(
        &self,
        evaluator: Arc<dyn Evaluator>,
        variant: Arc<CodeVariant>,
        budget: Duration,
    ) -> Result<f64, EvaluationError> {
        let name = evaluator.name().to_string();
        let dimension = evaluator.dimension();
        let variant_id = *variant.id();

        let (reply, result) = oneshot::channel();
        // Dropped on every return path, which cancels a still-pending evaluator.
        let (_cancel, cancelled) = oneshot::channel::<()>();
        std::thread::Builder::new()
            .name(format!("evoforge-eval-{dimension}"))
            .spawn(move || score_isolated(evaluator, variant, budget, cancelled, reply))
            .map_err(|e| EvaluationError::crashed(format!("spawning {name}: {e}")))?;

        let score = match tokio::time::timeout(budget, result).await {
            Err(_) => {
                warn!(
                    evaluator = %name,
                    %dimension,
                    variant = %variant_id,
                    budget_ms = budget.as_millis() as u64,
                    "Evaluator exceeded its budget"
                );
                return Err(EvaluationError::Timeout(budget.as_millis() as u64));
            }
            // The thread unwound before replying.
            Ok(Err(_)) => {
                return Err(EvaluationError::crashed(format!("{name} panicked")));
            }
            Ok(Ok(result)) => result?,
        };

        if !score.is_finite() {
            return Err(EvaluationError::crashed(format!(
                "{name} returned non-finite score {score}"
            )));
        }
        if !(0.0..=1.0).contains(&score) {
            warn!(
                evaluator = %name,
                %dimension,
                variant = %variant_id,
                score,
                "Score outside [0, 1], clamping"
            );
            return Ok(score.clamp(0.0, 1.0));
        }
        Ok(score)
    }
}
