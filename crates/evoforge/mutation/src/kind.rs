use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural transformation applied by the mutation layer.
///
/// Closed set: every provider handles each kind in an exhaustive match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Collapse an equivalent control-flow idiom into a simpler form.
    RefactorSimplify,
    /// Remove unreferenced definitions and unreachable statements.
    DeadCodeElimination,
    /// Replace an unsafe call pattern with a guarded equivalent.
    SecurityHardening,
    /// Replace an inefficient pattern with a known-equivalent faster idiom.
    PerformanceSubstitution,
}

impl MutationKind {
    pub const ALL: [MutationKind; 4] = [
        MutationKind::RefactorSimplify,
        MutationKind::DeadCodeElimination,
        MutationKind::SecurityHardening,
        MutationKind::PerformanceSubstitution,
    ];

    /// `count` kinds drawn from a shuffled cycle of [`MutationKind::ALL`].
    ///
    /// The first four entries are always pairwise distinct.
    pub fn shuffled_cycle(rng: &mut dyn RngCore, count: usize) -> Vec<MutationKind> {
        let mut order = Self::ALL;
        order.shuffle(rng);
        order.iter().copied().cycle().take(count).collect()
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::RefactorSimplify => "refactor-simplify",
            MutationKind::DeadCodeElimination => "dead-code-elimination",
            MutationKind::SecurityHardening => "security-hardening",
            MutationKind::PerformanceSubstitution => "performance-substitution",
        };
        f.write_str(name)
    }
}
