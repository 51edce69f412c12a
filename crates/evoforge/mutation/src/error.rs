use serde::{Deserialize, Serialize};

use crate::kind::MutationKind;

/// Source text that does not parse under its language grammar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("syntax error: {message}")]
pub struct SyntaxError {
    pub message: String,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors from the mutation layer. Both variants are recovered by the caller
/// by keeping the unmutated parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum MutationError {
    /// The transformed file failed to re-parse; the mutation is rejected.
    #[error("mutation produced invalid syntax in {path}: {reason}")]
    SyntaxInvalid { path: String, reason: String },

    /// No parsable file offered a site for this kind.
    #[error("no site for {0} mutation")]
    NotApplicable(MutationKind),
}
