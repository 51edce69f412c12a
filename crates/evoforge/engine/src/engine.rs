use std::collections::HashSet;
use std::fmt;

use evoforge_evaluation::EvaluatorSet;
use evoforge_mutation::{MutationError, MutationKind, Mutator};
use evoforge_store::VariantStore;
use evoforge_types::{
    CodeVariant, Codebase, ConfigurationError, Dimension, EngineConfig, GenerationSummary,
    OptimizedResult, RunStats, TerminationReason, VariantId,
};
use futures::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::crossover::crossover;
use crate::population::Population;
use crate::selection::Selector;

/// Phase of the generation loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopPhase {
    Initializing,
    Evaluating,
    Selecting,
    Mutating,
    Terminated(TerminationReason),
}

impl fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopPhase::Initializing => write!(f, "initializing"),
            LoopPhase::Evaluating => write!(f, "evaluating"),
            LoopPhase::Selecting => write!(f, "selecting"),
            LoopPhase::Mutating => write!(f, "mutating"),
            LoopPhase::Terminated(reason) => write!(f, "terminated ({reason})"),
        }
    }
}

/// Evolutionary optimizer for codebases.
///
/// Holds the capabilities a run needs (evaluators and mutation providers);
/// all per-run state lives in a private `GenerationRun` created by
/// [`optimize`](Self::optimize), so one engine can serve any number of
/// sequential or concurrent runs.
#[derive(Clone, Debug)]
pub struct OptimizationEngine {
    evaluators: EvaluatorSet,
    mutator: Mutator,
}

impl OptimizationEngine {
    /// Engine with the default (Rust) mutator.
    pub fn new(evaluators: EvaluatorSet) -> Self {
        Self {
            evaluators,
            mutator: Mutator::default(),
        }
    }

    pub fn with_mutator(mut self, mutator: Mutator) -> Self {
        self.mutator = mutator;
        self
    }

    pub fn evaluators(&self) -> &EvaluatorSet {
        &self.evaluators
    }

    pub fn mutator(&self) -> &Mutator {
        &self.mutator
    }

    /// Search for a better version of `codebase`.
    ///
    /// Fails only with a [`ConfigurationError`], and only before the search
    /// starts: invalid configuration, an empty codebase, an evaluator missing
    /// for a weighted dimension, or a seed the evaluators reject. Every
    /// per-variant failure after that is absorbed by the search.
    pub async fn optimize(
        &self,
        codebase: Codebase,
        config: EngineConfig,
    ) -> Result<OptimizedResult, ConfigurationError> {
        config.validate()?;
        if codebase.is_empty() {
            return Err(ConfigurationError::EmptyCodebase);
        }
        let evaluators = self
            .evaluators
            .clone()
            .with_weights(config.evaluator_weights)
            .with_budget(config.evaluation_budget());
        evaluators.ensure_complete()?;

        let run = GenerationRun::start(config, evaluators, &self.mutator, codebase).await?;
        Ok(run.execute().await)
    }
}

/// State of one `optimize()` call.
struct GenerationRun<'a> {
    run_id: Uuid,
    config: EngineConfig,
    evaluators: EvaluatorSet,
    mutator: &'a Mutator,
    selector: Selector,
    store: VariantStore,
    rng: StdRng,
    stats: RunStats,
    started: Instant,
    deadline: Instant,
    phase: LoopPhase,
    champion: CodeVariant,
    working: Vec<CodeVariant>,
    history: Vec<GenerationSummary>,
    generations_run: u32,
    stagnant: u32,
    /// Ids whose evaluation outcome is already reflected in `stats`.
    accounted: HashSet<VariantId>,
}

impl<'a> GenerationRun<'a> {
    /// Evaluate the seed and build the initial working set.
    async fn start(
        config: EngineConfig,
        evaluators: EvaluatorSet,
        mutator: &'a Mutator,
        codebase: Codebase,
    ) -> Result<GenerationRun<'a>, ConfigurationError> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let deadline = started + config.timeout();
        let store = VariantStore::new();

        info!(
            %run_id,
            files = codebase.len(),
            population_size = config.population_size,
            max_generations = config.max_generations,
            strategy = ?config.selection_strategy,
            "Starting optimization run"
        );

        let seed = CodeVariant::seed(codebase);
        let seed = match tokio::time::timeout_at(
            deadline,
            store.get_or_evaluate(seed, &evaluators),
        )
        .await
        {
            Ok(Ok(scored)) => scored,
            Ok(Err(e)) => return Err(ConfigurationError::SeedRejected(e.to_string())),
            Err(_) => {
                return Err(ConfigurationError::SeedRejected(
                    "seed evaluation exceeded the run timeout".into(),
                ))
            }
        };

        let mut run = GenerationRun {
            run_id,
            selector: Selector::new(config.selection_strategy),
            rng: StdRng::seed_from_u64(config.rng_seed),
            config,
            evaluators,
            mutator,
            store,
            stats: RunStats::started_now(),
            started,
            deadline,
            phase: LoopPhase::Initializing,
            champion: seed.clone(),
            working: Vec::new(),
            history: Vec::new(),
            generations_run: 0,
            stagnant: 0,
            accounted: HashSet::new(),
        };
        run.account(&seed);
        run.working = run.seed_population(&seed);
        Ok(run)
    }

    async fn execute(mut self) -> OptimizedResult {
        let reason = loop {
            if let Some(reason) = self.termination() {
                break reason;
            }

            self.enter(LoopPhase::Evaluating);
            let Some(population) = self.evaluate().await else {
                break TerminationReason::Timeout;
            };
            self.observe(&population);
            if let Some(reason) = self.termination() {
                break reason;
            }

            self.enter(LoopPhase::Selecting);
            let parents = self.selector.select(
                &population,
                self.config.parent_count,
                Some(&self.champion),
                &mut self.rng,
            );

            self.enter(LoopPhase::Mutating);
            self.working = self.breed(&parents);
        };
        self.finish(reason)
    }

    fn enter(&mut self, phase: LoopPhase) {
        debug!(run_id = %self.run_id, from = %self.phase, to = %phase, "Phase transition");
        self.phase = phase;
    }

    /// First matching condition wins.
    fn termination(&self) -> Option<TerminationReason> {
        if self.generations_run >= self.config.max_generations {
            return Some(TerminationReason::MaxGenerations);
        }
        if self.champion.total().unwrap_or(0.0) >= self.config.convergence_threshold {
            return Some(TerminationReason::Converged);
        }
        if Instant::now() >= self.deadline {
            return Some(TerminationReason::Timeout);
        }
        if self.stagnant >= self.config.stagnation_limit {
            return Some(TerminationReason::NoImprovement);
        }
        None
    }

    /// The seed plus `population_size - 1` mutated copies. A failed mutation
    /// contributes another copy of the seed.
    fn seed_population(&mut self, seed: &CodeVariant) -> Vec<CodeVariant> {
        let slots = self.config.population_size.saturating_sub(1);
        let kinds = MutationKind::shuffled_cycle(&mut self.rng, slots);

        let mut working = Vec::with_capacity(self.config.population_size);
        working.push(seed.clone());
        for kind in kinds {
            let mutation_seed = self.rng.gen::<u64>();
            let variant = match self.mutator.mutate(seed, kind, mutation_seed, 0) {
                Ok(child) => {
                    self.stats.record_mutation_applied();
                    child
                }
                Err(e) => {
                    self.record_mutation_failure(&e);
                    seed.clone()
                }
            };
            working.push(variant);
        }
        working
    }

    /// Parents survive; each parent contributes `offspring_per_parent`
    /// children, each with a different mutation kind from a shuffled cycle.
    fn breed(&mut self, parents: &[CodeVariant]) -> Vec<CodeVariant> {
        let generation = self.generations_run;
        let rate = self.config.crossover_rate;
        let mut working = parents.to_vec();

        for parent in parents {
            let kinds = MutationKind::shuffled_cycle(&mut self.rng, self.config.offspring_per_parent);
            for kind in kinds {
                let mutation_seed = self.rng.gen::<u64>();

                let mut base = parent.clone();
                if rate > 0.0 && parents.len() > 1 && self.rng.gen_bool(rate) {
                    let mate = &parents[self.rng.gen_range(0..parents.len())];
                    if let Some(child) = crossover(parent, mate, &mut self.rng, generation) {
                        self.stats.record_crossover();
                        base = child;
                    }
                }

                let child = match self.mutator.mutate(&base, kind, mutation_seed, generation) {
                    Ok(child) => {
                        self.stats.record_mutation_applied();
                        child
                    }
                    Err(e) => {
                        self.record_mutation_failure(&e);
                        base
                    }
                };
                working.push(child);
            }
        }
        working
    }

    fn record_mutation_failure(&mut self, error: &MutationError) {
        match error {
            MutationError::SyntaxInvalid { .. } => {
                debug!(run_id = %self.run_id, %error, "Mutation rejected");
                self.stats.record_mutation_rejected();
            }
            MutationError::NotApplicable(_) => self.stats.record_mutation_not_applicable(),
        }
    }

    /// Score every unscored member of the working set with at most
    /// `max_parallel_evaluations` in flight. Returns `None` if the run
    /// deadline passes first; in-flight evaluations are dropped.
    async fn evaluate(&mut self) -> Option<Population> {
        let working = std::mem::take(&mut self.working);
        let store = &self.store;
        let evaluators = &self.evaluators;

        let jobs = working.into_iter().enumerate().map(|(index, variant)| async move {
            let id = *variant.id();
            let outcome = if variant.is_scored() {
                Ok(variant)
            } else {
                store.get_or_evaluate(variant, evaluators).await
            };
            (index, id, outcome)
        });
        let all = stream::iter(jobs)
            .buffer_unordered(self.config.max_parallel_evaluations)
            .collect::<Vec<_>>();

        let Ok(mut outcomes) = tokio::time::timeout_at(self.deadline, all).await else {
            warn!(run_id = %self.run_id, "Run timeout reached during evaluation, abandoning in-flight work");
            return None;
        };
        // Completion order is nondeterministic; restore working-set order.
        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut scored = Vec::with_capacity(outcomes.len());
        for (_, id, outcome) in outcomes {
            match outcome {
                Ok(variant) => {
                    self.account(&variant);
                    scored.push(variant);
                }
                Err(e) => {
                    if self.accounted.insert(id) {
                        warn!(run_id = %self.run_id, variant = %id, error = %e, "Variant discarded");
                        self.stats.record_discard();
                    }
                }
            }
        }
        Some(Population::from_scored(scored, self.config.population_size))
    }

    fn account(&mut self, variant: &CodeVariant) {
        if self.accounted.insert(*variant.id()) {
            let timeouts = self.store.timed_out(variant.id()).map_or(0, |d| d.len());
            self.stats.record_timeouts(timeouts);
        }
    }

    fn observe(&mut self, population: &Population) {
        self.generations_run += 1;
        let best_total = population.best().and_then(CodeVariant::total).unwrap_or(0.0);

        match population.best() {
            Some(best) if best.total() > self.champion.total() => {
                info!(
                    run_id = %self.run_id,
                    generation = self.generations_run,
                    champion = %best.id(),
                    total = best_total,
                    previous = self.champion.total().unwrap_or(0.0),
                    "New champion"
                );
                self.champion = best.clone();
                self.stagnant = 0;
            }
            _ => self.stagnant += 1,
        }

        self.check_dead_dimensions(population);

        let champion_total = self.champion.total().unwrap_or(0.0);
        debug!(
            run_id = %self.run_id,
            generation = self.generations_run,
            population = population.len(),
            best_total,
            champion_total,
            stagnant = self.stagnant,
            "Generation complete"
        );
        self.history.push(GenerationSummary {
            generation: self.generations_run,
            member_ids: population.ids(),
            best_total,
            champion_total,
            champion_id: *self.champion.id(),
        });
    }

    /// A weighted dimension that timed out for every member contributes
    /// nothing to selection. Reported once per run; weights are left as
    /// configured.
    fn check_dead_dimensions(&mut self, population: &Population) {
        if population.is_empty() {
            return;
        }
        for dimension in Dimension::ALL {
            if self.config.evaluator_weights.weight(dimension) <= 0.0 {
                continue;
            }
            let all_timed_out = population.members().iter().all(|v| {
                self.store
                    .timed_out(v.id())
                    .is_some_and(|dims| dims.contains(&dimension))
            });
            if all_timed_out && self.stats.record_dead_dimension(dimension) {
                warn!(
                    run_id = %self.run_id,
                    %dimension,
                    weight = self.config.evaluator_weights.weight(dimension),
                    generation = self.generations_run,
                    "Dimension timed out for the whole population; its weight is lost"
                );
            }
        }
    }

    fn finish(mut self, reason: TerminationReason) -> OptimizedResult {
        self.enter(LoopPhase::Terminated(reason));
        self.stats.evaluations = self.store.evaluations();
        self.stats.cache_hits = self.store.cache_hits();
        self.stats.elapsed_ms = self.started.elapsed().as_millis() as u64;

        info!(
            run_id = %self.run_id,
            %reason,
            generations = self.generations_run,
            champion = %self.champion.id(),
            total = self.champion.total().unwrap_or(0.0),
            evaluations = self.stats.evaluations,
            cache_hits = self.stats.cache_hits,
            elapsed_ms = self.stats.elapsed_ms,
            "Optimization finished"
        );

        OptimizedResult {
            run_id: self.run_id,
            best_variant: self.champion,
            generations_run: self.generations_run,
            termination_reason: reason,
            history: self.history,
            stats: self.stats,
        }
    }
}
