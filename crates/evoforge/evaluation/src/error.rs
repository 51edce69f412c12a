use serde::{Deserialize, Serialize};

/// Failure of a single evaluator invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum EvaluationError {
    /// The evaluator exceeded its budget. The dimension scores 0.0 and the
    /// variant stays in the run.
    #[error("evaluation timed out after {0} ms")]
    Timeout(u64),

    /// The evaluator crashed, or the variant could not be analysed at all.
    /// The variant is discarded.
    #[error("evaluation crashed or variant unparseable: {0}")]
    CrashedOrUnparseable(String),
}

impl EvaluationError {
    pub fn crashed(reason: impl Into<String>) -> Self {
        Self::CrashedOrUnparseable(reason.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
