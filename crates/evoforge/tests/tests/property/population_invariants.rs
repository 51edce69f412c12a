//! Property: populations are ranked, unique and bounded, and selection
//! always carries the champion.

use std::collections::HashSet;

use evoforge_engine::{rank_order, Population, Selector};
use evoforge_types::{
    CodeVariant, Codebase, FitnessScore, FitnessWeights, SelectionStrategy, SubScores,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Small name space so duplicates are common. The total is derived from the
/// content so identical variants always score identically.
fn arb_scored() -> impl Strategy<Value = CodeVariant> {
    (0u8..12, 0u32..4).prop_map(|(name, generation)| {
        let seed = CodeVariant::seed(Codebase::from_files([(
            "src/lib.rs",
            format!("pub fn f{name}() {{}}"),
        )]));
        let variant = if generation == 0 {
            seed
        } else {
            CodeVariant::child(&seed, seed.codebase().clone(), generation)
        };
        let total = f64::from(name) / 12.0;
        variant.with_fitness(FitnessScore::new(
            SubScores::uniform(total),
            FitnessWeights::default(),
        ))
    })
}

fn arb_strategy() -> impl Strategy<Value = SelectionStrategy> {
    prop_oneof![
        Just(SelectionStrategy::Elitism),
        (1usize..8).prop_map(|size| SelectionStrategy::Tournament { size }),
        Just(SelectionStrategy::RouletteWheel),
    ]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn population_is_ranked_unique_and_bounded(
        variants in prop::collection::vec(arb_scored(), 0..30),
        capacity in 1usize..10,
    ) {
        let pop = Population::from_scored(variants.clone(), capacity);

        prop_assert!(pop.len() <= capacity);
        let distinct: HashSet<_> = variants.iter().map(|v| *v.id()).collect();
        prop_assert_eq!(pop.len(), distinct.len().min(capacity));

        let ids: HashSet<_> = pop.ids().into_iter().collect();
        prop_assert_eq!(ids.len(), pop.len());
        prop_assert!(pop
            .members()
            .windows(2)
            .all(|w| rank_order(&w[0], &w[1]).is_le()));
    }

    #[test]
    fn selection_always_includes_champion(
        variants in prop::collection::vec(arb_scored(), 1..20),
        strategy in arb_strategy(),
        count in 1usize..6,
        seed in any::<u64>(),
    ) {
        let pop = Population::from_scored(variants, 10);
        let champion = CodeVariant::seed(Codebase::from_files([("src/lib.rs", "pub fn best() {}")]))
            .with_fitness(FitnessScore::new(SubScores::uniform(1.0), FitnessWeights::default()));

        let picks = Selector::new(strategy).select(
            &pop,
            count,
            Some(&champion),
            &mut StdRng::seed_from_u64(seed),
        );

        prop_assert!(picks.iter().any(|p| p.id() == champion.id()));
        prop_assert!(picks.len() <= count.max(1));
        prop_assert!(picks.iter().all(CodeVariant::is_scored));
    }

    #[test]
    fn selection_is_reproducible(
        variants in prop::collection::vec(arb_scored(), 1..20),
        strategy in arb_strategy(),
        count in 1usize..6,
        seed in any::<u64>(),
    ) {
        let pop = Population::from_scored(variants, 10);
        let selector = Selector::new(strategy);
        let ids = |picks: Vec<CodeVariant>| picks.iter().map(|p| *p.id()).collect::<Vec<_>>();

        let a = ids(selector.select(&pop, count, None, &mut StdRng::seed_from_u64(seed)));
        let b = ids(selector.select(&pop, count, None, &mut StdRng::seed_from_u64(seed)));
        prop_assert_eq!(a, b);
    }
}
