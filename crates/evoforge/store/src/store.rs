use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use evoforge_evaluation::{EvaluationError, EvaluatorSet};
use evoforge_types::{CodeVariant, Dimension, FitnessScore, VariantId};
use tokio::sync::OnceCell;
use tracing::debug;

/// What the evaluator set concluded about one piece of content.
#[derive(Clone, Debug, PartialEq)]
pub enum CachedOutcome {
    Scored {
        fitness: FitnessScore,
        timed_out: Vec<Dimension>,
    },
    /// `CrashedOrUnparseable`; cached so the same content is never retried.
    Rejected(EvaluationError),
}

/// Fitness cache keyed by content hash.
///
/// Lives for one optimization run and is unbounded. Each id maps to a
/// once-cell that doubles as the in-flight marker: concurrent callers for
/// the same uncached id wait on the first caller's evaluation instead of
/// starting their own. If that evaluation is cancelled the cell stays empty
/// and the next caller evaluates.
#[derive(Debug, Default)]
pub struct VariantStore {
    entries: DashMap<VariantId, Arc<OnceCell<CachedOutcome>>>,
    evaluations: AtomicU64,
    cache_hits: AtomicU64,
}

impl VariantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `variant` with its fitness populated, evaluating it only if
    /// no result for its content is cached.
    pub async fn get_or_evaluate(
        &self,
        variant: CodeVariant,
        evaluators: &EvaluatorSet,
    ) -> Result<CodeVariant, EvaluationError> {
        let id = *variant.id();
        // Clone the cell out so no map shard lock is held across the await.
        let cell = self.entries.entry(id).or_default().value().clone();

        let mut fresh = false;
        let outcome = cell
            .get_or_init(|| async {
                fresh = true;
                self.evaluations.fetch_add(1, Ordering::Relaxed);
                match evaluators.evaluate(&variant).await {
                    Ok(evaluation) => CachedOutcome::Scored {
                        fitness: evaluation.score,
                        timed_out: evaluation.timed_out,
                    },
                    Err(e) => CachedOutcome::Rejected(e),
                }
            })
            .await
            .clone();

        if !fresh {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(variant = %id, "Fitness cache hit");
        }

        match outcome {
            CachedOutcome::Scored { fitness, .. } => Ok(variant.with_fitness(fitness)),
            CachedOutcome::Rejected(e) => Err(e),
        }
    }

    pub fn outcome(&self, id: &VariantId) -> Option<CachedOutcome> {
        self.entries.get(id)?.value().get().cloned()
    }

    pub fn fitness(&self, id: &VariantId) -> Option<FitnessScore> {
        match self.outcome(id)? {
            CachedOutcome::Scored { fitness, .. } => Some(fitness),
            CachedOutcome::Rejected(_) => None,
        }
    }

    /// Dimensions that timed out when `id` was evaluated.
    pub fn timed_out(&self, id: &VariantId) -> Option<Vec<Dimension>> {
        match self.outcome(id)? {
            CachedOutcome::Scored { timed_out, .. } => Some(timed_out),
            CachedOutcome::Rejected(_) => None,
        }
    }

    /// Number of ids with a completed outcome.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluations started (including cancelled ones).
    pub fn evaluations(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }
}
