use serde::{Deserialize, Serialize};

use crate::codebase::{Codebase, VariantId};
use crate::fitness::FitnessScore;

/// One individual of the search population.
///
/// The `id` is always the content hash of `codebase`; it is computed on
/// construction and recomputed on deserialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "VariantRecord")]
pub struct CodeVariant {
    id: VariantId,
    codebase: Codebase,
    fitness: Option<FitnessScore>,
    generation: u32,
    lineage: Option<VariantId>,
}

#[derive(Deserialize)]
struct VariantRecord {
    codebase: Codebase,
    #[serde(default)]
    fitness: Option<FitnessScore>,
    #[serde(default)]
    generation: u32,
    #[serde(default)]
    lineage: Option<VariantId>,
}

impl From<VariantRecord> for CodeVariant {
    fn from(r: VariantRecord) -> Self {
        Self {
            id: r.codebase.content_id(),
            codebase: r.codebase,
            fitness: r.fitness,
            generation: r.generation,
            lineage: r.lineage,
        }
    }
}

impl CodeVariant {
    /// The unmutated input codebase, generation 0, no parent.
    pub fn seed(codebase: Codebase) -> Self {
        Self {
            id: codebase.content_id(),
            codebase,
            fitness: None,
            generation: 0,
            lineage: None,
        }
    }

    /// An unscored child of `parent` carrying `codebase`.
    pub fn child(parent: &CodeVariant, codebase: Codebase, generation: u32) -> Self {
        Self {
            id: codebase.content_id(),
            codebase,
            fitness: None,
            generation,
            lineage: Some(parent.id),
        }
    }

    pub fn with_fitness(mut self, fitness: FitnessScore) -> Self {
        self.fitness = Some(fitness);
        self
    }

    pub fn id(&self) -> &VariantId {
        &self.id
    }

    pub fn codebase(&self) -> &Codebase {
        &self.codebase
    }

    pub fn fitness(&self) -> Option<&FitnessScore> {
        self.fitness.as_ref()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn lineage(&self) -> Option<&VariantId> {
        self.lineage.as_ref()
    }

    pub fn is_scored(&self) -> bool {
        self.fitness.is_some()
    }

    /// Aggregate fitness, or `None` while unscored.
    pub fn total(&self) -> Option<f64> {
        self.fitness.as_ref().map(FitnessScore::total)
    }
}
