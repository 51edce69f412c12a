//! Performance substitution: replace hand-rolled iteration with iterator
//! adaptors.
//!
//! - `let mut acc = 0; for x in it { acc += x; }` becomes
//!   `let mut acc = it.into_iter().sum();` (and the `1` / `*=` form becomes
//!   `product()`)
//! - `.collect::<C>().len()` becomes `.count()`

use quote::format_ident;
use syn::visit::{self, Visit};
use syn::visit_mut::{self, VisitMut};

use super::{as_receiver, is_numeric_literal, path_ident, SiteCursor};

pub(crate) struct Substitute {
    pub(crate) cursor: SiteCursor,
}

impl Substitute {
    pub(crate) fn new(cursor: SiteCursor) -> Self {
        Self { cursor }
    }
}

impl VisitMut for Substitute {
    fn visit_expr_mut(&mut self, expr: &mut syn::Expr) {
        visit_mut::visit_expr_mut(self, expr);

        if let Some(r) = collect_len(expr) {
            if self.cursor.hit() {
                *expr = r;
            }
        }
    }

    fn visit_block_mut(&mut self, block: &mut syn::Block) {
        visit_mut::visit_block_mut(self, block);

        let mut i = 0;
        while i + 1 < block.stmts.len() {
            if let Some(folded) = fold_candidate(&block.stmts[i], &block.stmts[i + 1]) {
                if self.cursor.hit() {
                    if let syn::Stmt::Local(local) = &mut block.stmts[i] {
                        if let Some(init) = local.init.as_mut() {
                            *init.expr = folded;
                        }
                    }
                    block.stmts.remove(i + 1);
                }
            }
            i += 1;
        }
    }
}

fn collect_len(expr: &syn::Expr) -> Option<syn::Expr> {
    let syn::Expr::MethodCall(len) = expr else {
        return None;
    };
    if len.method != "len" || !len.args.is_empty() {
        return None;
    }
    let syn::Expr::MethodCall(collect) = &*len.receiver else {
        return None;
    };
    if collect.method != "collect" || !collect.args.is_empty() {
        return None;
    }
    let iter = &collect.receiver;
    Some(syn::parse_quote!(#iter.count()))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Fold {
    Sum,
    Product,
}

fn accumulator(pat: &syn::Pat) -> Option<(&syn::Ident, Option<&syn::Type>)> {
    match pat {
        syn::Pat::Ident(p) if p.mutability.is_some() && p.by_ref.is_none() && p.subpat.is_none() => {
            Some((&p.ident, None))
        }
        syn::Pat::Type(t) => match accumulator(&t.pat)? {
            (ident, None) => Some((ident, Some(&*t.ty))),
            _ => None,
        },
        _ => None,
    }
}

/// `item` or `*item`.
fn is_item(expr: &syn::Expr, item: &syn::Ident) -> bool {
    match expr {
        syn::Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Deref(_),
            expr,
            ..
        }) => path_ident(expr) == Some(item),
        other => path_ident(other) == Some(item),
    }
}

fn accumulates(body: &syn::Expr, acc: &syn::Ident, item: &syn::Ident, fold: Fold) -> bool {
    match body {
        syn::Expr::Binary(b) => {
            let op_matches = match fold {
                Fold::Sum => matches!(b.op, syn::BinOp::AddAssign(_)),
                Fold::Product => matches!(b.op, syn::BinOp::MulAssign(_)),
            };
            op_matches && path_ident(&b.left) == Some(acc) && is_item(&b.right, item)
        }
        syn::Expr::Assign(a) => {
            if path_ident(&a.left) != Some(acc) {
                return false;
            }
            let syn::Expr::Binary(rhs) = &*a.right else {
                return false;
            };
            let op_matches = match fold {
                Fold::Sum => matches!(rhs.op, syn::BinOp::Add(_)),
                Fold::Product => matches!(rhs.op, syn::BinOp::Mul(_)),
            };
            op_matches && path_ident(&rhs.left) == Some(acc) && is_item(&rhs.right, item)
        }
        _ => false,
    }
}

struct Mentions<'a> {
    ident: &'a syn::Ident,
    found: bool,
}

impl<'ast> Visit<'ast> for Mentions<'_> {
    fn visit_ident(&mut self, ident: &'ast syn::Ident) {
        if ident == self.ident {
            self.found = true;
        }
    }

    fn visit_macro(&mut self, mac: &'ast syn::Macro) {
        // Macro bodies are opaque token streams; assume the worst.
        self.found = true;
        visit::visit_macro(self, mac);
    }
}

fn mentions(expr: &syn::Expr, ident: &syn::Ident) -> bool {
    let mut v = Mentions {
        ident,
        found: false,
    };
    v.visit_expr(expr);
    v.found
}

fn fold_candidate(first: &syn::Stmt, second: &syn::Stmt) -> Option<syn::Expr> {
    let syn::Stmt::Local(local) = first else {
        return None;
    };
    let (acc, ty) = accumulator(&local.pat)?;
    let init = local.init.as_ref()?;
    if init.diverge.is_some() {
        return None;
    }
    let fold = if is_numeric_literal(&init.expr, "0") {
        Fold::Sum
    } else if is_numeric_literal(&init.expr, "1") {
        Fold::Product
    } else {
        return None;
    };

    let syn::Stmt::Expr(syn::Expr::ForLoop(for_loop), _) = second else {
        return None;
    };
    if for_loop.label.is_some() || !for_loop.attrs.is_empty() {
        return None;
    }
    let syn::Pat::Ident(item) = &*for_loop.pat else {
        return None;
    };
    if item.subpat.is_some() || item.by_ref.is_some() {
        return None;
    }
    let [syn::Stmt::Expr(body, _)] = for_loop.body.stmts.as_slice() else {
        return None;
    };
    if !accumulates(body, acc, &item.ident, fold) || mentions(&for_loop.expr, acc) {
        return None;
    }

    let iter = as_receiver(&for_loop.expr);
    let method = match fold {
        Fold::Sum => format_ident!("sum"),
        Fold::Product => format_ident!("product"),
    };
    Some(match ty {
        Some(ty) => syn::parse_quote!(#iter.into_iter().#method::<#ty>()),
        None => syn::parse_quote!(#iter.into_iter().#method()),
    })
}
