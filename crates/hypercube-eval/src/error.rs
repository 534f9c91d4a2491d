//! Evaluation errors
//!
//! All fatal conditions carry enough context (offending expression shape,
//! current member assignment) to reproduce the failure. "Not yet
//! available" is deliberately absent here: it is a transient value
//! sentinel, not an error (see `hypercube_types::CellValue`).

use hypercube_model::{HierarchyId, ModelError};
use hypercube_types::TypeError;
use thiserror::Error;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur during expression evaluation
#[derive(Debug, Error, Clone)]
pub enum EvalError {
    /// A runtime value was incompatible with the requested shape
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Metadata lookup failure, including out-of-range positional lookups
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The current context carries no member for a hierarchy
    #[error("No current member for {hierarchy} in the evaluation context")]
    UnboundHierarchy { hierarchy: HierarchyId },

    /// Maximum context-chain depth exceeded (calculated-member recursion)
    #[error(
        "Recursion limit of {limit} exceeded while evaluating a calculated member; context: {context}"
    )]
    RecursionLimit {
        limit: usize,
        depth: usize,
        context: String,
    },

    /// A set iteration exceeded the configured bound
    #[error("Iteration limit of {limit} elements exceeded")]
    IterationLimit { limit: usize },

    /// The surrounding driver requested cancellation
    #[error("Evaluation canceled")]
    Canceled,

    /// Internal evaluation error (should not happen)
    #[error("Internal evaluation error: {message}")]
    Internal { message: String },
}

impl EvalError {
    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
