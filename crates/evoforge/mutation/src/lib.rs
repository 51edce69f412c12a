#![deny(unsafe_code)]
//! # evoforge-mutation
//!
//! Syntax-tree mutation layer. A [`Mutator`] parses a variant's files through
//! registered [`MutationProvider`]s, applies one [`MutationKind`] at one
//! candidate site, re-emits the file and re-parses it before handing back a
//! child variant.
//!
//! Rust sources are supported out of the box via [`RustProvider`]; other
//! languages plug in by implementing the provider traits.

pub mod error;
pub mod kind;
pub mod mutator;
pub mod provider;
pub mod rust;

pub use error::{MutationError, SyntaxError};
pub use kind::MutationKind;
pub use mutator::Mutator;
pub use provider::{MutationProvider, SyntaxTree};
pub use rust::{RustProvider, RustTree};
