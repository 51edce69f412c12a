#![deny(unsafe_code)]
//! # evoforge-types
//!
//! Shared data model for the evoforge code-optimization engine: content-addressed
//! codebases and variants, weighted fitness scores, engine configuration and
//! run results.
//!
//! Invariants enforced here:
//! - a variant's id is always the content hash of its codebase;
//! - a fitness total is always recomputed from its sub-scores and weights;
//! - evaluator weights sum to 1.0 before a configuration is accepted.

pub mod codebase;
pub mod config;
pub mod error;
pub mod fitness;
pub mod result;
pub mod variant;

pub use codebase::{Codebase, VariantId, VariantIdError};
pub use config::{EngineConfig, SelectionStrategy};
pub use error::ConfigurationError;
pub use fitness::{Dimension, FitnessScore, FitnessWeights, SubScores, WEIGHT_SUM_TOLERANCE};
pub use result::{GenerationSummary, OptimizedResult, RunStats, TerminationReason};
pub use variant::CodeVariant;
