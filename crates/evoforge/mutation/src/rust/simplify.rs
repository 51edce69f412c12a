//! Refactor-simplify: collapse equivalent control-flow and comparison idioms.
//!
//! - `if c { true } else { false }` becomes `c` (and the reversed form `!(c)`)
//! - `x == true` becomes `x`, `x == false` becomes `!(x)`
//! - `loop { if c { break; } rest }` becomes `while !(c) { rest }`
//! - `x.len() == 0` becomes `x.is_empty()`

use syn::visit::{self, Visit};
use syn::visit_mut::{self, VisitMut};

use super::{as_receiver, bool_literal, is_numeric_literal, negate, SiteCursor};

pub(crate) struct Simplify {
    pub(crate) cursor: SiteCursor,
}

impl Simplify {
    pub(crate) fn new(cursor: SiteCursor) -> Self {
        Self { cursor }
    }
}

impl VisitMut for Simplify {
    fn visit_expr_mut(&mut self, expr: &mut syn::Expr) {
        visit_mut::visit_expr_mut(self, expr);

        let replacement = match &*expr {
            syn::Expr::If(i) => bool_if(i),
            syn::Expr::Binary(b) => bool_comparison(b).or_else(|| empty_check(b)),
            syn::Expr::Loop(l) => loop_to_while(l),
            _ => None,
        };
        if let Some(r) = replacement {
            if self.cursor.hit() {
                *expr = r;
            }
        }
    }
}

fn single_bool(block: &syn::Block) -> Option<bool> {
    match block.stmts.as_slice() {
        [syn::Stmt::Expr(e, None)] => bool_literal(e),
        _ => None,
    }
}

fn bool_if(i: &syn::ExprIf) -> Option<syn::Expr> {
    let then_value = single_bool(&i.then_branch)?;
    let else_value = match i.else_branch.as_ref() {
        Some((_, e)) => match &**e {
            syn::Expr::Block(b) if b.attrs.is_empty() && b.label.is_none() => {
                single_bool(&b.block)?
            }
            _ => return None,
        },
        None => return None,
    };
    match (then_value, else_value) {
        (true, false) => Some(as_receiver(&i.cond)),
        (false, true) => Some(negate(&i.cond)),
        _ => None,
    }
}

fn bool_comparison(b: &syn::ExprBinary) -> Option<syn::Expr> {
    if !matches!(b.op, syn::BinOp::Eq(_)) {
        return None;
    }
    match bool_literal(&b.right)? {
        true => Some(as_receiver(&b.left)),
        false => Some(negate(&b.left)),
    }
}

fn empty_check(b: &syn::ExprBinary) -> Option<syn::Expr> {
    if !matches!(b.op, syn::BinOp::Eq(_)) || !is_numeric_literal(&b.right, "0") {
        return None;
    }
    match &*b.left {
        syn::Expr::MethodCall(m) if m.method == "len" && m.args.is_empty() && m.turbofish.is_none() => {
            let receiver = &m.receiver;
            Some(syn::parse_quote!(#receiver.is_empty()))
        }
        _ => None,
    }
}

fn is_bare_break(block: &syn::Block) -> bool {
    match block.stmts.as_slice() {
        [syn::Stmt::Expr(syn::Expr::Break(b), _)] => b.label.is_none() && b.expr.is_none(),
        _ => false,
    }
}

/// Finds `break value`; `while` cannot yield one.
#[derive(Default)]
struct ValuedBreak(bool);

impl<'ast> Visit<'ast> for ValuedBreak {
    fn visit_expr_break(&mut self, b: &'ast syn::ExprBreak) {
        if b.expr.is_some() {
            self.0 = true;
        }
        visit::visit_expr_break(self, b);
    }
}

fn loop_to_while(l: &syn::ExprLoop) -> Option<syn::Expr> {
    let (first, rest) = l.body.stmts.split_first()?;
    let cond = match first {
        syn::Stmt::Expr(syn::Expr::If(i), _)
            if i.else_branch.is_none() && is_bare_break(&i.then_branch) =>
        {
            &i.cond
        }
        _ => return None,
    };

    let mut finder = ValuedBreak::default();
    for stmt in rest {
        finder.visit_stmt(stmt);
    }
    if finder.0 {
        return None;
    }

    Some(syn::Expr::While(syn::ExprWhile {
        attrs: l.attrs.clone(),
        label: l.label.clone(),
        while_token: Default::default(),
        cond: Box::new(negate(cond)),
        body: syn::Block {
            brace_token: l.body.brace_token,
            stmts: rest.to_vec(),
        },
    }))
}
