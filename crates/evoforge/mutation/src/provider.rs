use std::collections::HashSet;

use crate::error::SyntaxError;
use crate::kind::MutationKind;

/// Language front-end for the mutation layer: parses one source file into a
/// tree that can be transformed and re-emitted.
pub trait MutationProvider: Send + Sync {
    /// Short language name used in logs.
    fn language(&self) -> &str;

    /// Whether this provider is responsible for the file at `path`.
    fn handles(&self, path: &str) -> bool;

    /// Parse `source`; fails if the text is not syntactically valid.
    fn parse(&self, source: &str) -> Result<Box<dyn SyntaxTree>, SyntaxError>;
}

/// A parsed source file.
///
/// Trees are built and consumed within one [`Mutator::mutate`] call and need
/// not be `Send`.
///
/// [`Mutator::mutate`]: crate::Mutator::mutate
pub trait SyntaxTree {
    /// Number of places where `kind` could be applied.
    fn candidate_sites(&self, kind: MutationKind) -> usize;

    /// Rewrite the `site`-th candidate for `kind`. Returns `false` if there is
    /// no such site.
    fn apply(&mut self, kind: MutationKind, site: usize) -> bool;

    /// Render the tree back to source text.
    fn emit(&self) -> String;

    /// Identifiers this file refers to.
    fn references(&self) -> HashSet<String> {
        HashSet::new()
    }

    /// Identifiers referred to by other files of the same codebase. Anything
    /// named here must not be treated as unused.
    fn add_external_references(&mut self, _names: &HashSet<String>) {}
}
