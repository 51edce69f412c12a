use evoforge_types::{CodeVariant, SelectionStrategy};
use rand::Rng;
use tracing::debug;

use crate::population::Population;

/// Chooses parents from a scored population.
#[derive(Clone, Copy, Debug)]
pub struct Selector {
    strategy: SelectionStrategy,
}

impl Selector {
    pub fn new(strategy: SelectionStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    /// Pick up to `count` parents.
    ///
    /// Whatever the strategy, `champion` is always among the returned
    /// parents: if the strategy did not pick it, it takes the last slot.
    pub fn select<R: Rng + ?Sized>(
        &self,
        population: &Population,
        count: usize,
        champion: Option<&CodeVariant>,
        rng: &mut R,
    ) -> Vec<CodeVariant> {
        let members = population.members();
        let mut picks = if members.is_empty() || count == 0 {
            Vec::new()
        } else {
            match self.strategy {
                SelectionStrategy::Elitism => members.iter().take(count).cloned().collect(),
                SelectionStrategy::Tournament { size } => tournament(members, count, size, rng),
                SelectionStrategy::RouletteWheel => roulette(members, count, rng),
            }
        };

        if let Some(champion) = champion {
            if !picks.iter().any(|p| p.id() == champion.id()) {
                if picks.len() < count.max(1) {
                    picks.push(champion.clone());
                } else if let Some(last) = picks.last_mut() {
                    *last = champion.clone();
                }
                debug!(champion = %champion.id(), "Champion carried into parents");
            }
        }
        picks
    }
}

/// `members` is in rank order, so the lowest sampled index is the winner.
fn tournament<R: Rng + ?Sized>(
    members: &[CodeVariant],
    count: usize,
    size: usize,
    rng: &mut R,
) -> Vec<CodeVariant> {
    let k = size.max(1);
    (0..count)
        .map(|_| {
            let winner = (0..k)
                .map(|_| rng.gen_range(0..members.len()))
                .min()
                .unwrap_or(0);
            members[winner].clone()
        })
        .collect()
}

/// Fitness-proportional sampling without replacement. Totals are shifted to
/// be non-negative; if every remaining weight is zero, draws are uniform.
fn roulette<R: Rng + ?Sized>(members: &[CodeVariant], count: usize, rng: &mut R) -> Vec<CodeVariant> {
    let totals: Vec<f64> = members.iter().map(|v| v.total().unwrap_or(0.0)).collect();
    let floor = totals.iter().copied().fold(f64::INFINITY, f64::min).min(0.0);
    let mut pool: Vec<(usize, f64)> = totals
        .iter()
        .enumerate()
        .map(|(i, t)| (i, t - floor))
        .collect();

    let mut picks = Vec::with_capacity(count.min(pool.len()));
    while picks.len() < count && !pool.is_empty() {
        let sum: f64 = pool.iter().map(|(_, w)| w).sum();
        let slot = if sum > 0.0 {
            let mut target = rng.gen::<f64>() * sum;
            let mut chosen = pool.len() - 1;
            for (slot, (_, w)) in pool.iter().enumerate() {
                if target < *w {
                    chosen = slot;
                    break;
                }
                target -= w;
            }
            chosen
        } else {
            rng.gen_range(0..pool.len())
        };
        let (index, _) = pool.remove(slot);
        picks.push(members[index].clone());
    }
    picks
}
