//! Dead-code elimination.
//!
//! Candidate sites, in traversal order:
//! - `if false { .. }` statements without an `else`
//! - statements following a `return`, `break` or `continue` in the same block
//! - private free functions whose name is never referenced anywhere in the
//!   codebase (paths, method calls, macro bodies or `use` trees). References
//!   from sibling files reach the pass through
//!   [`SyntaxTree::add_external_references`](crate::SyntaxTree::add_external_references).

use std::collections::HashSet;

use proc_macro2::{TokenStream, TokenTree};
use syn::visit::{self, Visit};
use syn::visit_mut::{self, VisitMut};

use super::{bool_literal, SiteCursor};

pub(crate) struct DeadCode {
    pub(crate) cursor: SiteCursor,
    referenced: HashSet<String>,
}

impl DeadCode {
    pub(crate) fn new(referenced: HashSet<String>, cursor: SiteCursor) -> Self {
        Self { cursor, referenced }
    }

    fn is_dead_fn(&self, item: &syn::Item) -> bool {
        let syn::Item::Fn(f) = item else {
            return false;
        };
        let name = f.sig.ident.to_string();
        matches!(f.vis, syn::Visibility::Inherited)
            && f.attrs.iter().all(|a| a.path().is_ident("doc"))
            && name != "main"
            && !self.referenced.contains(&name)
    }

    fn prune_items(&mut self, items: &mut Vec<syn::Item>) {
        let mut i = 0;
        while i < items.len() {
            if self.is_dead_fn(&items[i]) && self.cursor.hit() {
                items.remove(i);
                continue;
            }
            i += 1;
        }
    }
}

impl VisitMut for DeadCode {
    fn visit_file_mut(&mut self, file: &mut syn::File) {
        visit_mut::visit_file_mut(self, file);
        self.prune_items(&mut file.items);
    }

    fn visit_item_mod_mut(&mut self, module: &mut syn::ItemMod) {
        visit_mut::visit_item_mod_mut(self, module);
        if let Some((_, items)) = module.content.as_mut() {
            self.prune_items(items);
        }
    }

    fn visit_block_mut(&mut self, block: &mut syn::Block) {
        visit_mut::visit_block_mut(self, block);

        let mut i = 0;
        while i < block.stmts.len() {
            if is_if_false(&block.stmts[i]) && self.cursor.hit() {
                block.stmts.remove(i);
                continue;
            }
            i += 1;
        }

        if let Some(k) = block.stmts.iter().position(diverges) {
            let tail = &block.stmts[k + 1..];
            let has_item = tail.iter().any(|s| matches!(s, syn::Stmt::Item(_)));
            if !tail.is_empty() && !has_item && self.cursor.hit() {
                block.stmts.truncate(k + 1);
            }
        }
    }
}

fn is_if_false(stmt: &syn::Stmt) -> bool {
    match stmt {
        syn::Stmt::Expr(syn::Expr::If(i), _) => {
            i.else_branch.is_none() && bool_literal(&i.cond) == Some(false)
        }
        _ => false,
    }
}

fn diverges(stmt: &syn::Stmt) -> bool {
    matches!(
        stmt,
        syn::Stmt::Expr(
            syn::Expr::Return(_) | syn::Expr::Break(_) | syn::Expr::Continue(_),
            _
        )
    )
}

/// Every identifier in `file` that could name a free function.
pub(crate) fn referenced_names(file: &syn::File) -> HashSet<String> {
    let mut names = ReferencedNames::default();
    names.visit_file(file);
    names.0
}

#[derive(Default)]
struct ReferencedNames(HashSet<String>);

impl ReferencedNames {
    fn tokens(&mut self, tokens: TokenStream) {
        for tt in tokens {
            match tt {
                TokenTree::Ident(ident) => {
                    self.0.insert(ident.to_string());
                }
                TokenTree::Group(group) => self.tokens(group.stream()),
                _ => {}
            }
        }
    }
}

impl<'ast> Visit<'ast> for ReferencedNames {
    fn visit_path(&mut self, path: &'ast syn::Path) {
        for segment in &path.segments {
            self.0.insert(segment.ident.to_string());
        }
        visit::visit_path(self, path);
    }

    fn visit_expr_method_call(&mut self, call: &'ast syn::ExprMethodCall) {
        self.0.insert(call.method.to_string());
        visit::visit_expr_method_call(self, call);
    }

    fn visit_macro(&mut self, mac: &'ast syn::Macro) {
        self.tokens(mac.tokens.clone());
        visit::visit_macro(self, mac);
    }

    fn visit_use_name(&mut self, name: &'ast syn::UseName) {
        self.0.insert(name.ident.to_string());
    }

    fn visit_use_rename(&mut self, rename: &'ast syn::UseRename) {
        self.0.insert(rename.ident.to_string());
        visit::visit_use_rename(self, rename);
    }
}
