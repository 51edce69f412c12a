#![deny(unsafe_code)]
//! # evoforge-evaluation
//!
//! Evaluator set for the evoforge engine. Each quality dimension is scored by
//! an independent [`Evaluator`]; an [`EvaluatorSet`] runs all of them
//! concurrently against one variant, each inside an [`ExecutionSandbox`]
//! that enforces the per-evaluator budget, and combines the results into a
//! weighted [`FitnessScore`](evoforge_types::FitnessScore).
//!
//! Timeouts degrade to a 0.0 sub-score; crashes discard the variant.

pub mod command;
pub mod error;
pub mod evaluator;
pub mod sandbox;
pub mod set;
pub mod simulated;

pub use command::{CommandEvaluator, ResourceLimits};
pub use error::EvaluationError;
pub use evaluator::Evaluator;
pub use sandbox::{ExecutionSandbox, ThreadSandbox};
pub use set::{Evaluation, EvaluatorSet, DEFAULT_BUDGET};
pub use simulated::{CrashingEvaluator, FixedEvaluator, FnEvaluator, StallingEvaluator};
