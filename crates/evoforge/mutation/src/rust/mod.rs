//! Rust front-end built on `syn`.
//!
//! Each mutation kind is a `VisitMut` pass driven by a [`SiteCursor`]: a
//! counting pass reports how many candidate sites exist, a targeting pass
//! rewrites exactly one of them. Both passes traverse the tree in the same
//! order, so a site index is stable for a given source text.
//!
//! Emission goes through `prettyplease`. Layout is normalised and ordinary
//! comments are lost; doc comments survive as `///` lines.

mod dead_code;
mod hardening;
mod perf;
mod simplify;

use std::collections::HashSet;

use syn::visit_mut::VisitMut;

use crate::error::SyntaxError;
use crate::kind::MutationKind;
use crate::provider::{MutationProvider, SyntaxTree};

/// Provider for `.rs` files.
#[derive(Clone, Debug, Default)]
pub struct RustProvider;

impl RustProvider {
    pub fn new() -> Self {
        Self
    }
}

impl MutationProvider for RustProvider {
    fn language(&self) -> &str {
        "rust"
    }

    fn handles(&self, path: &str) -> bool {
        path.ends_with(".rs")
    }

    fn parse(&self, source: &str) -> Result<Box<dyn SyntaxTree>, SyntaxError> {
        let file = syn::parse_file(source).map_err(|e| SyntaxError::new(e.to_string()))?;
        Ok(Box::new(RustTree {
            file,
            external: HashSet::new(),
        }))
    }
}

/// A parsed Rust source file.
pub struct RustTree {
    file: syn::File,
    /// Names referenced from sibling files.
    external: HashSet<String>,
}

impl RustTree {
    fn run(&mut self, kind: MutationKind, cursor: SiteCursor) -> SiteCursor {
        match kind {
            MutationKind::RefactorSimplify => {
                let mut pass = simplify::Simplify::new(cursor);
                pass.visit_file_mut(&mut self.file);
                pass.cursor
            }
            MutationKind::DeadCodeElimination => {
                let mut referenced = dead_code::referenced_names(&self.file);
                referenced.extend(self.external.iter().cloned());
                let mut pass = dead_code::DeadCode::new(referenced, cursor);
                pass.visit_file_mut(&mut self.file);
                pass.cursor
            }
            MutationKind::SecurityHardening => {
                let mut pass = hardening::Harden::new(cursor);
                pass.visit_file_mut(&mut self.file);
                pass.cursor
            }
            MutationKind::PerformanceSubstitution => {
                let mut pass = perf::Substitute::new(cursor);
                pass.visit_file_mut(&mut self.file);
                pass.cursor
            }
        }
    }
}

impl SyntaxTree for RustTree {
    fn candidate_sites(&self, kind: MutationKind) -> usize {
        // Counting never rewrites, but the passes share one `VisitMut`
        // implementation, so count on a scratch copy.
        let mut scratch = RustTree {
            file: self.file.clone(),
            external: self.external.clone(),
        };
        scratch.run(kind, SiteCursor::counting()).seen
    }

    fn apply(&mut self, kind: MutationKind, site: usize) -> bool {
        self.run(kind, SiteCursor::targeting(site)).applied
    }

    fn emit(&self) -> String {
        prettyplease::unparse(&self.file)
    }

    fn references(&self) -> HashSet<String> {
        dead_code::referenced_names(&self.file)
    }

    fn add_external_references(&mut self, names: &HashSet<String>) {
        self.external.extend(names.iter().cloned());
    }
}

/// Tracks candidate sites during a pass.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SiteCursor {
    target: Option<usize>,
    seen: usize,
    applied: bool,
}

impl SiteCursor {
    pub(crate) fn counting() -> Self {
        Self {
            target: None,
            seen: 0,
            applied: false,
        }
    }

    pub(crate) fn targeting(site: usize) -> Self {
        Self {
            target: Some(site),
            seen: 0,
            applied: false,
        }
    }

    /// Register a candidate site. Returns `true` if it is the one to rewrite.
    pub(crate) fn hit(&mut self) -> bool {
        let index = self.seen;
        self.seen += 1;
        if self.target == Some(index) && !self.applied {
            self.applied = true;
            return true;
        }
        false
    }
}

/// Plain identifier of a path expression such as `acc`.
pub(crate) fn path_ident(expr: &syn::Expr) -> Option<&syn::Ident> {
    match expr {
        syn::Expr::Path(p) if p.qself.is_none() => p.path.get_ident(),
        _ => None,
    }
}

/// Whether `expr` is an integer or float literal with the given digits.
pub(crate) fn is_numeric_literal(expr: &syn::Expr, digits: &str) -> bool {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(i),
            ..
        }) => i.base10_digits() == digits,
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Float(f),
            ..
        }) => f
            .base10_digits()
            .parse::<f64>()
            .ok()
            .zip(digits.parse::<f64>().ok())
            .map(|(a, b)| a == b)
            .unwrap_or(false),
        _ => false,
    }
}

/// Boolean literal value, if `expr` is one.
pub(crate) fn bool_literal(expr: &syn::Expr) -> Option<bool> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Bool(b),
            ..
        }) => Some(b.value),
        _ => None,
    }
}

/// Wrap `expr` in parentheses unless it can already be used as a method
/// receiver as-is.
pub(crate) fn as_receiver(expr: &syn::Expr) -> syn::Expr {
    match expr {
        syn::Expr::Path(_)
        | syn::Expr::MethodCall(_)
        | syn::Expr::Call(_)
        | syn::Expr::Field(_)
        | syn::Expr::Index(_)
        | syn::Expr::Paren(_)
        | syn::Expr::Macro(_)
        | syn::Expr::Array(_)
        | syn::Expr::Tuple(_) => expr.clone(),
        other => syn::parse_quote!((#other)),
    }
}

/// `!(expr)`, or the inner expression if `expr` is already a negation.
pub(crate) fn negate(expr: &syn::Expr) -> syn::Expr {
    match expr {
        syn::Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Not(_),
            expr: inner,
            ..
        }) => (**inner).clone(),
        other => syn::parse_quote!(!(#other)),
    }
}
