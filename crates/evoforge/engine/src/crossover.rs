use std::collections::BTreeSet;

use evoforge_types::{CodeVariant, Codebase};
use rand::Rng;

/// Uniform file-level crossover.
///
/// Each path present in both parents is taken whole from one of them with
/// equal probability; paths present in only one parent are kept. Files are
/// never split, so a child is syntactically valid whenever its parents are.
///
/// Returns `None` when the child would be identical to either parent. The
/// child's lineage points at `primary`.
pub fn crossover<R: Rng + ?Sized>(
    primary: &CodeVariant,
    mate: &CodeVariant,
    rng: &mut R,
    generation: u32,
) -> Option<CodeVariant> {
    let a = primary.codebase();
    let b = mate.codebase();
    let paths: BTreeSet<&str> = a.paths().chain(b.paths()).collect();

    let files = paths.into_iter().filter_map(|path| match (a.get(path), b.get(path)) {
        (Some(x), Some(y)) => Some((path, if rng.gen_bool(0.5) { x } else { y })),
        (Some(x), None) => Some((path, x)),
        (None, Some(y)) => Some((path, y)),
        (None, None) => None,
    });
    let codebase = Codebase::from_files(files);

    if &codebase == a || &codebase == b {
        return None;
    }
    Some(CodeVariant::child(primary, codebase, generation))
}
