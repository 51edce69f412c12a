#![deny(unsafe_code)]
//! # evoforge-store
//!
//! Content-addressed fitness cache for one optimization run. Identical
//! variants share an id and are evaluated at most once, even when several
//! workers ask for the same new id at the same time.

pub mod store;

pub use store::{CachedOutcome, VariantStore};
