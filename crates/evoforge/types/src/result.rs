use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::codebase::VariantId;
use crate::fitness::Dimension;
use crate::variant::CodeVariant;

/// Why the generation loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    Converged,
    MaxGenerations,
    Timeout,
    NoImprovement,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Converged => write!(f, "converged"),
            TerminationReason::MaxGenerations => write!(f, "max generations reached"),
            TerminationReason::Timeout => write!(f, "timeout"),
            TerminationReason::NoImprovement => write!(f, "no improvement"),
        }
    }
}

/// Snapshot of one completed generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// 1-based generation number.
    pub generation: u32,
    /// Population members after evaluation, in rank order.
    pub member_ids: Vec<VariantId>,
    /// Best total within this generation's population.
    pub best_total: f64,
    /// Best-ever total after this generation.
    pub champion_total: f64,
    pub champion_id: VariantId,
}

/// Counters collected over one run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Evaluator-set invocations (cache misses).
    pub evaluations: u64,
    /// Lookups answered from the cache.
    pub cache_hits: u64,
    pub mutations_applied: u64,
    /// Mutations whose output failed to re-parse.
    pub mutations_rejected: u64,
    /// Mutations with no matching site.
    pub mutations_not_applicable: u64,
    pub crossovers: u64,
    /// Variants dropped because an evaluator crashed or could not parse them.
    pub variants_discarded: u64,
    /// Sub-scores recorded as 0.0 after an evaluator timeout.
    pub timed_out_scores: u64,
    /// Weighted dimensions that timed out for an entire population.
    pub dead_dimensions: Vec<Dimension>,
}

impl RunStats {
    pub fn started_now() -> Self {
        Self {
            started_at: Utc::now(),
            elapsed_ms: 0,
            evaluations: 0,
            cache_hits: 0,
            mutations_applied: 0,
            mutations_rejected: 0,
            mutations_not_applicable: 0,
            crossovers: 0,
            variants_discarded: 0,
            timed_out_scores: 0,
            dead_dimensions: Vec::new(),
        }
    }

    pub fn record_mutation_applied(&mut self) {
        self.mutations_applied += 1;
    }

    pub fn record_mutation_rejected(&mut self) {
        self.mutations_rejected += 1;
    }

    pub fn record_mutation_not_applicable(&mut self) {
        self.mutations_not_applicable += 1;
    }

    pub fn record_crossover(&mut self) {
        self.crossovers += 1;
    }

    pub fn record_discard(&mut self) {
        self.variants_discarded += 1;
    }

    pub fn record_timeouts(&mut self, count: usize) {
        self.timed_out_scores += count as u64;
    }

    /// Returns `true` the first time a dimension is reported.
    pub fn record_dead_dimension(&mut self, dimension: Dimension) -> bool {
        if self.dead_dimensions.contains(&dimension) {
            return false;
        }
        self.dead_dimensions.push(dimension);
        true
    }

    /// Share of attempted mutations that produced a child.
    pub fn mutation_success_rate(&self) -> f64 {
        let attempted =
            self.mutations_applied + self.mutations_rejected + self.mutations_not_applicable;
        if attempted == 0 {
            return 0.0;
        }
        self.mutations_applied as f64 / attempted as f64
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.evaluations + self.cache_hits;
        if lookups == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / lookups as f64
    }
}

/// Outcome of one `optimize()` call. Always carries a scored champion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizedResult {
    pub run_id: Uuid,
    pub best_variant: CodeVariant,
    pub generations_run: u32,
    pub termination_reason: TerminationReason,
    pub history: Vec<GenerationSummary>,
    pub stats: RunStats,
}

impl OptimizedResult {
    /// Champion total after each generation, oldest first.
    pub fn champion_totals(&self) -> Vec<f64> {
        self.history.iter().map(|g| g.champion_total).collect()
    }

    pub fn best_total(&self) -> f64 {
        self.best_variant.total().unwrap_or(0.0)
    }
}
