use std::cmp::Ordering;
use std::collections::HashSet;

use evoforge_types::{CodeVariant, VariantId};

/// Total order used everywhere variants are ranked: total fitness
/// descending, then generation ascending (older first), then id.
/// Unscored variants rank last.
pub fn rank_order(a: &CodeVariant, b: &CodeVariant) -> Ordering {
    let ta = a.total().unwrap_or(f64::NEG_INFINITY);
    let tb = b.total().unwrap_or(f64::NEG_INFINITY);
    tb.total_cmp(&ta)
        .then_with(|| a.generation().cmp(&b.generation()))
        .then_with(|| a.id().cmp(b.id()))
}

/// Scored variants of one generation, best first.
///
/// Built fresh after every evaluation phase: members are unique by id, every
/// member carries a fitness, and the lowest-ranked variants beyond
/// `capacity` are dropped.
#[derive(Clone, Debug, Default)]
pub struct Population {
    members: Vec<CodeVariant>,
    capacity: usize,
}

impl Population {
    pub fn from_scored(variants: impl IntoIterator<Item = CodeVariant>, capacity: usize) -> Self {
        let mut members: Vec<CodeVariant> =
            variants.into_iter().filter(CodeVariant::is_scored).collect();
        members.sort_by(rank_order);

        let mut seen = HashSet::new();
        members.retain(|v| seen.insert(*v.id()));
        members.truncate(capacity);

        Self { members, capacity }
    }

    pub fn members(&self) -> &[CodeVariant] {
        &self.members
    }

    pub fn best(&self) -> Option<&CodeVariant> {
        self.members.first()
    }

    pub fn ids(&self) -> Vec<VariantId> {
        self.members.iter().map(|v| *v.id()).collect()
    }

    pub fn contains(&self, id: &VariantId) -> bool {
        self.members.iter().any(|v| v.id() == id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
