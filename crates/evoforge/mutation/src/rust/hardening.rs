//! Security hardening: remove panicking calls where a guarded form exists.
//!
//! - `m.lock().unwrap()` (also `read()` / `write()`) recovers the guard from a
//!   poisoned lock instead of panicking
//! - `.unwrap()` becomes `?` when the receiver's carrier evidently converts
//!   into the enclosing function's: an `Option`-producing call (`.ok()`,
//!   `.get(..)`, `.first()` ...) inside a fn returning `Option`, or a
//!   `Result`-producing call (`.parse()`, `fs::read_to_string(..)` ...)
//!   inside a fn whose error type absorbs any error (`Box<dyn Error>`,
//!   `anyhow`/`eyre`)

use syn::visit_mut::{self, VisitMut};

use super::SiteCursor;

const LOCK_METHODS: [&str; 3] = ["lock", "read", "write"];

/// Calls that return an `Option`.
const OPTION_PRODUCERS: &[&str] = &[
    "ok", "err", "get", "get_mut", "first", "last", "first_mut", "last_mut", "next",
    "next_back", "pop", "find", "position", "checked_add", "checked_sub",
    "checked_mul", "checked_div", "strip_prefix", "strip_suffix", "split_once", "to_digit",
];

/// Calls that return a `Result` with a concrete `std::error::Error` type.
const RESULT_PRODUCERS: &[&str] = &[
    "parse", "from_str", "from_utf8", "try_from", "try_into", "read_to_string",
    "read_to_end", "read_line", "write_all", "flush", "open", "create", "metadata",
    "read_dir", "canonicalize", "create_dir_all", "remove_file", "rename", "copy",
];

/// The `?` carrier a function returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Carrier {
    /// `?` is unavailable or its error conversion cannot be proven.
    None,
    Option,
    /// A `Result` whose error type converts from any `std::error::Error`.
    AnyError,
}

pub(crate) struct Harden {
    pub(crate) cursor: SiteCursor,
    /// One entry per enclosing fn or closure.
    carriers: Vec<Carrier>,
}

impl Harden {
    pub(crate) fn new(cursor: SiteCursor) -> Self {
        Self {
            cursor,
            carriers: Vec::new(),
        }
    }

    fn carrier(&self) -> Carrier {
        self.carriers.last().copied().unwrap_or(Carrier::None)
    }

    fn enter(&mut self, sig: &syn::Signature) {
        self.carriers.push(returned_carrier(sig));
    }
}

fn returned_carrier(sig: &syn::Signature) -> Carrier {
    let syn::ReturnType::Type(_, ty) = &sig.output else {
        return Carrier::None;
    };
    let syn::Type::Path(path) = &**ty else {
        return Carrier::None;
    };
    let segments = &path.path.segments;
    let Some(last) = segments.last() else {
        return Carrier::None;
    };

    if last.ident == "Option" {
        return Carrier::Option;
    }
    if last.ident != "Result" {
        return Carrier::None;
    }
    if segments
        .iter()
        .any(|seg| seg.ident == "anyhow" || seg.ident == "eyre")
    {
        return Carrier::AnyError;
    }
    let syn::PathArguments::AngleBracketed(args) = &last.arguments else {
        return Carrier::None;
    };
    match args.args.iter().nth(1) {
        Some(syn::GenericArgument::Type(error)) if absorbs_any_error(error) => Carrier::AnyError,
        _ => Carrier::None,
    }
}

/// `Box<dyn Error ..>`, `anyhow::Error` or `eyre::Report`.
fn absorbs_any_error(ty: &syn::Type) -> bool {
    let syn::Type::Path(path) = ty else {
        return false;
    };
    let segments = &path.path.segments;
    let Some(last) = segments.last() else {
        return false;
    };
    if last.ident == "Box" {
        let syn::PathArguments::AngleBracketed(args) = &last.arguments else {
            return false;
        };
        return args.args.iter().any(|arg| {
            matches!(
                arg,
                syn::GenericArgument::Type(syn::Type::TraitObject(object))
                    if object.bounds.iter().any(|bound| matches!(
                        bound,
                        syn::TypeParamBound::Trait(t)
                            if t.path.segments.last().is_some_and(|s| s.ident == "Error")
                    ))
            )
        });
    }
    segments
        .iter()
        .any(|seg| seg.ident == "anyhow" || seg.ident == "eyre")
}

/// Name of the method or function whose result `expr` is.
fn producer(expr: &syn::Expr) -> Option<String> {
    match expr {
        syn::Expr::MethodCall(call) => Some(call.method.to_string()),
        syn::Expr::Call(call) => match &*call.func {
            syn::Expr::Path(p) => p.path.segments.last().map(|s| s.ident.to_string()),
            _ => None,
        },
        _ => None,
    }
}

fn fits_carrier(receiver: &syn::Expr, carrier: Carrier) -> bool {
    let Some(name) = producer(receiver) else {
        return false;
    };
    match carrier {
        Carrier::None => false,
        Carrier::Option => OPTION_PRODUCERS.contains(&name.as_str()),
        Carrier::AnyError => RESULT_PRODUCERS.contains(&name.as_str()),
    }
}

impl VisitMut for Harden {
    fn visit_item_fn_mut(&mut self, f: &mut syn::ItemFn) {
        self.enter(&f.sig);
        visit_mut::visit_item_fn_mut(self, f);
        self.carriers.pop();
    }

    fn visit_impl_item_fn_mut(&mut self, f: &mut syn::ImplItemFn) {
        self.enter(&f.sig);
        visit_mut::visit_impl_item_fn_mut(self, f);
        self.carriers.pop();
    }

    fn visit_trait_item_fn_mut(&mut self, f: &mut syn::TraitItemFn) {
        self.enter(&f.sig);
        visit_mut::visit_trait_item_fn_mut(self, f);
        self.carriers.pop();
    }

    fn visit_expr_closure_mut(&mut self, c: &mut syn::ExprClosure) {
        self.carriers.push(Carrier::None);
        visit_mut::visit_expr_closure_mut(self, c);
        self.carriers.pop();
    }

    fn visit_expr_async_mut(&mut self, a: &mut syn::ExprAsync) {
        self.carriers.push(Carrier::None);
        visit_mut::visit_expr_async_mut(self, a);
        self.carriers.pop();
    }

    fn visit_expr_mut(&mut self, expr: &mut syn::Expr) {
        visit_mut::visit_expr_mut(self, expr);

        let replacement = match &*expr {
            syn::Expr::MethodCall(call) if call.method == "unwrap" && call.args.is_empty() => {
                let receiver = &call.receiver;
                if is_lock_call(receiver) {
                    Some(syn::parse_quote!(
                        #receiver.unwrap_or_else(|poisoned| poisoned.into_inner())
                    ))
                } else if fits_carrier(receiver, self.carrier()) {
                    Some(syn::parse_quote!(#receiver?))
                } else {
                    None
                }
            }
            _ => None,
        };
        if let Some(r) = replacement {
            if self.cursor.hit() {
                *expr = r;
            }
        }
    }
}

fn is_lock_call(expr: &syn::Expr) -> bool {
    match expr {
        syn::Expr::MethodCall(call) => {
            call.args.is_empty() && LOCK_METHODS.iter().any(|m| call.method == m)
        }
        _ => false,
    }
}
