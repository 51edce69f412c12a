use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigurationError;
use crate::fitness::FitnessWeights;

/// Parent selection strategy, fixed for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Top-`count` by total fitness.
    Elitism,
    /// Best of `size` uniform draws (with replacement), repeated `count` times.
    Tournament { size: usize },
    /// Fitness-proportional draws without replacement.
    RouletteWheel,
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        SelectionStrategy::Tournament { size: 5 }
    }
}

/// Configuration for one `optimize()` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on population members kept between generations.
    pub population_size: usize,
    /// Generations to run before stopping with `MaxGenerations`.
    pub max_generations: u32,
    /// Champion total at or above which the run stops with `Converged`.
    pub convergence_threshold: f64,
    /// Consecutive generations without champion improvement before `NoImprovement`.
    pub stagnation_limit: u32,
    /// Wall-clock limit for the whole run (ms).
    pub timeout_ms: u64,
    /// Time box for one evaluator call (ms).
    pub evaluation_budget_ms: u64,
    /// Variants evaluated concurrently within a generation.
    pub max_parallel_evaluations: usize,
    pub selection_strategy: SelectionStrategy,
    pub evaluator_weights: FitnessWeights,
    /// Parents chosen per generation.
    pub parent_count: usize,
    /// Children produced from each parent per generation.
    pub offspring_per_parent: usize,
    /// Probability that a child starts from a file-level crossover of two parents.
    pub crossover_rate: f64,
    /// Master seed; fixes every random choice of the run.
    pub rng_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            max_generations: 50,
            convergence_threshold: 0.95,
            stagnation_limit: 10,
            timeout_ms: 300_000,
            evaluation_budget_ms: 10_000,
            max_parallel_evaluations: 4,
            selection_strategy: SelectionStrategy::default(),
            evaluator_weights: FitnessWeights::default(),
            parent_count: 5,
            offspring_per_parent: 3,
            crossover_rate: 0.2,
            rng_seed: 0,
        }
    }
}

impl EngineConfig {
    /// Small, fast configuration for interactive use and tests.
    pub fn quick() -> Self {
        Self {
            population_size: 10,
            max_generations: 5,
            stagnation_limit: 3,
            timeout_ms: 30_000,
            evaluation_budget_ms: 2_000,
            parent_count: 3,
            offspring_per_parent: 2,
            ..Self::default()
        }
    }

    /// Large population, long horizon.
    pub fn thorough() -> Self {
        Self {
            population_size: 64,
            max_generations: 200,
            convergence_threshold: 0.98,
            stagnation_limit: 25,
            timeout_ms: 1_800_000,
            evaluation_budget_ms: 30_000,
            max_parallel_evaluations: 8,
            parent_count: 16,
            offspring_per_parent: 4,
            ..Self::default()
        }
    }

    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    pub fn with_max_generations(mut self, generations: u32) -> Self {
        self.max_generations = generations;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn with_stagnation_limit(mut self, limit: u32) -> Self {
        self.stagnation_limit = limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_evaluation_budget(mut self, budget: Duration) -> Self {
        self.evaluation_budget_ms = budget.as_millis() as u64;
        self
    }

    pub fn with_max_parallel_evaluations(mut self, n: usize) -> Self {
        self.max_parallel_evaluations = n;
        self
    }

    pub fn with_selection_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.selection_strategy = strategy;
        self
    }

    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.evaluator_weights = weights;
        self
    }

    pub fn with_parent_count(mut self, count: usize) -> Self {
        self.parent_count = count;
        self
    }

    pub fn with_offspring_per_parent(mut self, count: usize) -> Self {
        self.offspring_per_parent = count;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn evaluation_budget(&self) -> Duration {
        Duration::from_millis(self.evaluation_budget_ms)
    }

    /// Check every field. Called by the engine before any work starts.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.evaluator_weights.validate()?;
        if self.population_size == 0 {
            return Err(ConfigurationError::ZeroPopulation);
        }
        if !(0.0..=1.0).contains(&self.convergence_threshold) {
            return Err(ConfigurationError::ConvergenceThreshold(
                self.convergence_threshold,
            ));
        }
        if self.max_parallel_evaluations == 0 {
            return Err(ConfigurationError::ZeroParallelism);
        }
        if self.parent_count == 0 || self.parent_count > self.population_size {
            return Err(ConfigurationError::ParentCount {
                parent_count: self.parent_count,
                population_size: self.population_size,
            });
        }
        if self.offspring_per_parent == 0 {
            return Err(ConfigurationError::ZeroOffspring);
        }
        if let SelectionStrategy::Tournament { size: 0 } = self.selection_strategy {
            return Err(ConfigurationError::TournamentSize);
        }
        if self.stagnation_limit == 0 {
            return Err(ConfigurationError::ZeroStagnationLimit);
        }
        if self.timeout_ms == 0 {
            return Err(ConfigurationError::ZeroDuration("timeout_ms".into()));
        }
        if self.evaluation_budget_ms == 0 {
            return Err(ConfigurationError::ZeroDuration(
                "evaluation_budget_ms".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(ConfigurationError::CrossoverRate(self.crossover_rate));
        }
        Ok(())
    }

    /// Parse a TOML document; missing keys take their default values.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigurationError> {
        let config: EngineConfig =
            toml::from_str(contents).map_err(|e| ConfigurationError::File(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::File(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }
}
