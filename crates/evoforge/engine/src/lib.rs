#![deny(unsafe_code)]
//! # evoforge-engine
//!
//! Generation loop of the evoforge optimizer.
//!
//! [`OptimizationEngine::optimize`] seeds a population from the input
//! codebase, then repeats evaluate → select → mutate until a termination
//! condition holds, returning the best variant ever observed:
//!
//! - evaluation runs on a bounded pool through the shared
//!   [`VariantStore`](evoforge_store::VariantStore), so identical content is
//!   scored once;
//! - selection always carries the running champion, so the best-known total
//!   never regresses;
//! - all randomness derives from `EngineConfig::rng_seed`, so a run is
//!   reproducible for fixed evaluators.

pub mod crossover;
pub mod engine;
pub mod population;
pub mod selection;

pub use crossover::crossover;
pub use engine::{LoopPhase, OptimizationEngine};
pub use population::{rank_order, Population};
pub use selection::Selector;
