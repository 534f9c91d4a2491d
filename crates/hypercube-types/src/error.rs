//! Type-model and conversion errors

use hypercube_model::HierarchyId;
use thiserror::Error;

/// Errors raised by type construction and checked value conversions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeError {
    /// A runtime value did not have the requested shape
    #[error("Type mismatch: expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: String,
    },

    /// Two tuple elements referenced the same hierarchy
    #[error("Tuple type references {hierarchy} more than once")]
    DuplicateHierarchyInTuple { hierarchy: HierarchyId },

    /// A tuple type with no elements was requested
    #[error("Tuple type must have at least one element")]
    EmptyTuple,

    /// A set-of-members was built from a non-member element type
    #[error("Member set element must be member-shaped, found {found}")]
    NotAMemberElement { found: String },

    /// A set-of-tuples was built with arity below two
    #[error("Tuple set requires arity of at least 2, found {arity}")]
    TupleSetArity { arity: usize },
}

impl TypeError {
    /// Create a shape-mismatch error
    pub fn mismatch(expected: &'static str, found: impl Into<String>) -> Self {
        Self::Mismatch {
            expected,
            found: found.into(),
        }
    }
}
