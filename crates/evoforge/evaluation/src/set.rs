use std::sync::Arc;
use std::time::Duration;

use evoforge_types::{
    CodeVariant, ConfigurationError, Dimension, FitnessScore, FitnessWeights, SubScores,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EvaluationError;
use crate::evaluator::Evaluator;
use crate::sandbox::{ExecutionSandbox, ThreadSandbox};

/// Default per-evaluator budget.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(10);

/// Result of scoring one variant on every dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: FitnessScore,
    /// Dimensions that hit their budget and were scored 0.0.
    pub timed_out: Vec<Dimension>,
}

/// One evaluator per dimension plus the weights that combine them.
///
/// Cloning is cheap; evaluators and the sandbox are shared.
#[derive(Clone)]
pub struct EvaluatorSet {
    evaluators: Vec<Arc<dyn Evaluator>>,
    weights: FitnessWeights,
    budget: Duration,
    sandbox: Arc<dyn ExecutionSandbox>,
}

impl Default for EvaluatorSet {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluatorSet {
    /// Empty set with default weights, a 10 s budget and a [`ThreadSandbox`].
    pub fn new() -> Self {
        Self {
            evaluators: Vec::new(),
            weights: FitnessWeights::default(),
            budget: DEFAULT_BUDGET,
            sandbox: Arc::new(ThreadSandbox),
        }
    }

    /// Add an evaluator, replacing any existing one for the same dimension.
    pub fn with_evaluator(self, evaluator: impl Evaluator + 'static) -> Self {
        self.with_shared_evaluator(Arc::new(evaluator))
    }

    pub fn with_shared_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        let dimension = evaluator.dimension();
        self.evaluators.retain(|e| e.dimension() != dimension);
        self.evaluators.push(evaluator);
        self
    }

    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_sandbox(mut self, sandbox: impl ExecutionSandbox + 'static) -> Self {
        self.sandbox = Arc::new(sandbox);
        self
    }

    pub fn evaluator(&self, dimension: Dimension) -> Option<&Arc<dyn Evaluator>> {
        self.evaluators.iter().find(|e| e.dimension() == dimension)
    }

    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Every dimension with a positive weight must have an evaluator.
    pub fn ensure_complete(&self) -> Result<(), ConfigurationError> {
        for dimension in Dimension::ALL {
            if self.weights.weight(dimension) > 0.0 && self.evaluator(dimension).is_none() {
                return Err(ConfigurationError::MissingEvaluator(dimension));
            }
        }
        Ok(())
    }

    /// Score `variant` on all dimensions concurrently.
    ///
    /// A timed-out dimension scores 0.0 and is listed in
    /// [`Evaluation::timed_out`]; any `CrashedOrUnparseable` fails the whole
    /// evaluation. Dimensions without an evaluator score 0.0.
    pub async fn evaluate(&self, variant: &CodeVariant) -> Result<Evaluation, EvaluationError> {
        let shared = Arc::new(variant.clone());

        let runs = Dimension::ALL.into_iter().map(|dimension| {
            let shared = Arc::clone(&shared);
            async move {
                let outcome = match self.evaluator(dimension) {
                    Some(evaluator) => {
                        self.sandbox
                            .run(Arc::clone(evaluator), shared, self.budget)
                            .await
                    }
                    None => Ok(0.0),
                };
                (dimension, outcome)
            }
        });
        let outcomes = join_all(runs).await;

        let mut scores = SubScores::default();
        let mut timed_out = Vec::new();
        for (dimension, outcome) in outcomes {
            match outcome {
                Ok(score) => scores.set(dimension, score),
                Err(EvaluationError::Timeout(budget_ms)) => {
                    warn!(
                        variant = %variant.id(),
                        %dimension,
                        budget_ms,
                        "Dimension timed out, scoring 0.0"
                    );
                    timed_out.push(dimension);
                }
                Err(e) => {
                    debug!(variant = %variant.id(), %dimension, error = %e, "Evaluation failed");
                    return Err(e);
                }
            }
        }

        Ok(Evaluation {
            score: FitnessScore::new(scores, self.weights),
            timed_out,
        })
    }
}

impl std::fmt::Debug for EvaluatorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let evaluators: Vec<String> = self
            .evaluators
            .iter()
            .map(|e| format!("{}:{}", e.dimension(), e.name()))
            .collect();
        f.debug_struct("EvaluatorSet")
            .field("evaluators", &evaluators)
            .field("weights", &self.weights)
            .field("budget", &self.budget)
            .finish()
    }
}
