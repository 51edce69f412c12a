//! Shared fixtures for the evoforge end-to-end and property suites.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use evoforge_evaluation::{EvaluationError, Evaluator, EvaluatorSet, FixedEvaluator, FnEvaluator};
use evoforge_mutation::{MutationKind, MutationProvider, RustProvider, SyntaxError, SyntaxTree};
use evoforge_types::{CodeVariant, Codebase, Dimension};

/// A manually summed loop, the canonical target of performance substitution.
pub const SUMMED_LOOP: &str = r#"
/// Sum of all values.
pub fn total(values: &[u64]) -> u64 {
    let mut result = 0;
    for v in values {
        result += *v;
    }
    result
}
"#;

/// Code with a site for every mutation kind.
pub const MIXED: &str = r#"
use std::sync::Mutex;

fn unused_helper() -> u32 {
    7
}

pub fn is_blank(s: &str) -> bool {
    if s.trim().len() == 0 { true } else { false }
}

pub fn bump(counter: &Mutex<u32>) {
    *counter.lock().unwrap() += 1;
}

pub fn product(values: &[u32]) -> u32 {
    let mut acc = 1;
    for v in values {
        acc *= *v;
    }
    acc
}
"#;

/// Install a fmt subscriber that writes through the test harness. Honours
/// `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn single_file(source: &str) -> Codebase {
    Codebase::from_files([("src/lib.rs", source)])
}

/// Number of explicit `for` loops across all files.
pub fn loop_count(variant: &CodeVariant) -> usize {
    variant
        .codebase()
        .files()
        .map(|(_, source)| source.matches("for ").count())
        .sum()
}

/// Performance stub: built-in aggregate idioms beat manual loops.
pub fn aggregate_preferring_performance() -> FnEvaluator {
    FnEvaluator::new(Dimension::Performance, |variant| {
        let loops = loop_count(variant) as f64;
        (0.9 - 0.3 * loops).max(0.1)
    })
    .with_name("aggregate-preferring")
}

/// Every dimension scores 1.0 except where overridden by `with_evaluator`.
pub fn perfect_set() -> EvaluatorSet {
    Dimension::ALL
        .into_iter()
        .fold(EvaluatorSet::new(), |set, dimension| {
            set.with_evaluator(FixedEvaluator::new(dimension, 1.0))
        })
}

/// Wraps an evaluator and counts how often it is invoked.
#[derive(Clone)]
pub struct CountingEvaluator {
    inner: Arc<dyn Evaluator>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl CountingEvaluator {
    pub fn new(inner: impl Evaluator + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Sleep for `delay` before delegating.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared call counter; stays valid after the evaluator is moved into a set.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Evaluator for CountingEvaluator {
    fn dimension(&self) -> Dimension {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn score(&self, variant: &CodeVariant, budget: Duration) -> Result<f64, EvaluationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.score(variant, budget).await
    }
}

/// Parses Rust like [`RustProvider`] but always emits invalid source, so
/// every mutation it takes part in is rejected.
#[derive(Clone, Debug, Default)]
pub struct InvalidOutputProvider {
    inner: RustProvider,
}

struct InvalidOutputTree(Box<dyn SyntaxTree>);

impl MutationProvider for InvalidOutputProvider {
    fn language(&self) -> &str {
        "rust-broken"
    }

    fn handles(&self, path: &str) -> bool {
        self.inner.handles(path)
    }

    fn parse(&self, source: &str) -> Result<Box<dyn SyntaxTree>, SyntaxError> {
        Ok(Box::new(InvalidOutputTree(self.inner.parse(source)?)))
    }
}

impl SyntaxTree for InvalidOutputTree {
    fn candidate_sites(&self, _kind: MutationKind) -> usize {
        1
    }

    fn apply(&mut self, _kind: MutationKind, _site: usize) -> bool {
        true
    }

    fn emit(&self) -> String {
        format!("{} fn (", self.0.emit())
    }
}
