use std::collections::HashSet;
use std::sync::Arc;

use evoforge_types::{CodeVariant, Codebase};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{MutationError, SyntaxError};
use crate::kind::MutationKind;
use crate::provider::{MutationProvider, SyntaxTree};
use crate::rust::RustProvider;

/// Applies one structural mutation to one file of a variant.
///
/// Files that no provider handles, or that fail to parse, are carried into
/// the child unchanged. Every mutated file is re-parsed before the child is
/// returned, so a child never contains a file that a provider rejects but
/// its parent accepted.
#[derive(Clone)]
pub struct Mutator {
    providers: Vec<Arc<dyn MutationProvider>>,
}

struct Candidate<'a> {
    path: &'a str,
    provider: &'a dyn MutationProvider,
    tree: Box<dyn SyntaxTree>,
    sites: usize,
}

impl Mutator {
    /// A mutator with no providers. Every mutation is `NotApplicable` until
    /// one is registered.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Register a provider. Earlier registrations win when several handle
    /// the same path.
    pub fn with_provider(mut self, provider: impl MutationProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn provider_for(&self, path: &str) -> Option<&dyn MutationProvider> {
        self.providers
            .iter()
            .find(|p| p.handles(path))
            .map(|p| p.as_ref())
    }

    /// Produce a child of `variant` by applying `kind` at one site chosen
    /// with an rng seeded from `seed`.
    pub fn mutate(
        &self,
        variant: &CodeVariant,
        kind: MutationKind,
        seed: u64,
        generation: u32,
    ) -> Result<CodeVariant, MutationError> {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut parsed = Vec::new();
        for (path, source) in variant.codebase().files() {
            let Some(provider) = self.provider_for(path) else {
                continue;
            };
            match provider.parse(source) {
                Ok(tree) => parsed.push((path, provider, tree)),
                Err(e) => debug!(path, error = %e, "Skipping unparsable file"),
            }
        }

        // A definition used only from another file is still in use.
        if kind == MutationKind::DeadCodeElimination && parsed.len() > 1 {
            let references: HashSet<String> = parsed
                .iter()
                .flat_map(|(_, _, tree)| tree.references())
                .collect();
            for (_, _, tree) in &mut parsed {
                tree.add_external_references(&references);
            }
        }

        let mut candidates = Vec::new();
        for (path, provider, tree) in parsed {
            let sites = tree.candidate_sites(kind);
            if sites > 0 {
                candidates.push(Candidate {
                    path,
                    provider,
                    tree,
                    sites,
                });
            }
        }
        if candidates.is_empty() {
            return Err(MutationError::NotApplicable(kind));
        }

        let pick = rng.gen_range(0..candidates.len());
        let Candidate {
            path,
            provider,
            mut tree,
            sites,
        } = candidates.swap_remove(pick);
        let site = rng.gen_range(0..sites);

        if !tree.apply(kind, site) {
            return Err(MutationError::NotApplicable(kind));
        }
        let emitted = tree.emit();

        if let Err(e) = provider.parse(&emitted) {
            return Err(MutationError::SyntaxInvalid {
                path: path.to_string(),
                reason: e.message,
            });
        }
        if variant.codebase().get(path) == Some(emitted.as_str()) {
            return Err(MutationError::NotApplicable(kind));
        }

        debug!(
            parent = %variant.id(),
            %kind,
            path,
            site,
            language = provider.language(),
            "Mutation applied"
        );
        let codebase = variant.codebase().with_file(path, emitted);
        Ok(CodeVariant::child(variant, codebase, generation))
    }

    /// Files a registered provider handles but cannot parse.
    pub fn invalid_files(&self, codebase: &Codebase) -> Vec<(String, SyntaxError)> {
        codebase
            .files()
            .filter_map(|(path, source)| {
                let provider = self.provider_for(path)?;
                provider.parse(source).err().map(|e| (path.to_string(), e))
            })
            .collect()
    }
}

impl Default for Mutator {
    /// Rust support only.
    fn default() -> Self {
        Self::new().with_provider(RustProvider::new())
    }
}

impl std::fmt::Debug for Mutator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let languages: Vec<&str> = self.providers.iter().map(|p| p.language()).collect();
        f.debug_struct("Mutator")
            .field("providers", &languages)
            .finish()
    }
}
