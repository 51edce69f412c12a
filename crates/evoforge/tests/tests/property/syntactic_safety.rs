//! Property: a child produced by the Rust mutator always re-parses, touches
//! exactly one file, and records its parent.

use evoforge_mutation::{MutationError, MutationKind, Mutator};
use evoforge_types::{CodeVariant, Codebase};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// One item with at least one mutation site, named after `i` so items never
/// collide.
fn arb_item(i: usize) -> impl Strategy<Value = String> {
    (0u32..1_000, 0usize..10).prop_map(move |(n, template)| match template {
        0 => format!("fn helper_{i}() -> u32 {{ {n} }}"),
        1 => format!(
            "pub fn sum_{i}(xs: &[u32]) -> u32 {{ let mut acc = 0; for x in xs {{ acc += *x; }} acc }}"
        ),
        2 => format!(
            "pub fn product_{i}(xs: &[u64]) -> u64 {{ let mut acc: u64 = 1; for x in xs {{ acc = acc * *x; }} acc }}"
        ),
        3 => format!(
            "pub fn blank_{i}(s: &str) -> bool {{ if s.len() == 0 {{ true }} else {{ false }} }}"
        ),
        4 => format!(
            "pub fn read_{i}(m: &std::sync::Mutex<u32>) -> u32 {{ *m.lock().unwrap() + {n} }}"
        ),
        5 => format!(
            "pub fn parse_{i}(s: &str) -> Option<u32> {{ let v = s.parse::<u32>().ok().unwrap(); Some(v + {n}) }}"
        ),
        6 => format!(
            "pub fn spin_{i}(mut n: u32) -> u32 {{ loop {{ if n == 0 {{ break; }} n -= 1; }} n }}"
        ),
        7 => format!(
            "pub fn early_{i}() -> u32 {{ return {n}; let _unreachable = 1; }}"
        ),
        8 => format!(
            "pub fn load_{i}(s: &str) -> Result<u32, Box<dyn std::error::Error>> {{ Ok(s.trim().parse::<u32>().unwrap() + {n}) }}"
        ),
        _ => format!(
            "pub fn flag_{i}(b: bool) -> bool {{ if false {{ return !b; }} b == true }}"
        ),
    })
}

fn arb_source() -> impl Strategy<Value = String> {
    (1usize..6).prop_flat_map(|count| {
        (0..count)
            .map(arb_item)
            .collect::<Vec<_>>()
            .prop_map(|items| items.join("\n\n"))
    })
}

fn arb_kind() -> impl Strategy<Value = MutationKind> {
    prop_oneof![
        Just(MutationKind::RefactorSimplify),
        Just(MutationKind::DeadCodeElimination),
        Just(MutationKind::SecurityHardening),
        Just(MutationKind::PerformanceSubstitution),
    ]
}

fn arb_variant() -> impl Strategy<Value = CodeVariant> {
    (arb_source(), arb_source()).prop_map(|(lib, util)| {
        CodeVariant::seed(Codebase::from_files([
            ("src/lib.rs", lib),
            ("src/util.rs", util),
            ("README.md", "# notes\n\nnot rust @@".to_string()),
        ]))
    })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn children_always_reparse(
        parent in arb_variant(),
        kind in arb_kind(),
        seed in any::<u64>(),
    ) {
        let mutator = Mutator::default();
        prop_assume!(mutator.invalid_files(parent.codebase()).is_empty());

        match mutator.mutate(&parent, kind, seed, 1) {
            Ok(child) => {
                prop_assert!(mutator.invalid_files(child.codebase()).is_empty());
                prop_assert_ne!(child.id(), parent.id());
                prop_assert_eq!(child.lineage(), Some(parent.id()));
                prop_assert_eq!(child.generation(), 1);

                let changed = parent
                    .codebase()
                    .files()
                    .filter(|(path, source)| child.codebase().get(path) != Some(*source))
                    .count();
                prop_assert_eq!(changed, 1);
                prop_assert_eq!(child.codebase().get("README.md"), parent.codebase().get("README.md"));
            }
            Err(MutationError::NotApplicable(k)) => prop_assert_eq!(k, kind),
            Err(e @ MutationError::SyntaxInvalid { .. }) => {
                prop_assert!(false, "Rust provider emitted invalid source: {}", e);
            }
        }
    }

    #[test]
    fn mutation_is_a_function_of_its_seed(
        parent in arb_variant(),
        kind in arb_kind(),
        seed in any::<u64>(),
    ) {
        let mutator = Mutator::default();
        let a = mutator.mutate(&parent, kind, seed, 2).ok().map(|v| *v.id());
        let b = mutator.mutate(&parent, kind, seed, 2).ok().map(|v| *v.id());
        prop_assert_eq!(a, b);
    }
}
