//! Errors raised while building or navigating cube metadata

use crate::metadata::{HierarchyId, LevelId, MemberId};
use thiserror::Error;

/// Errors for cube construction and metadata lookups
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A name collides with an existing object of the same kind
    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    /// A hierarchy id does not belong to this cube
    #[error("Unknown hierarchy: {id}")]
    UnknownHierarchy { id: HierarchyId },

    /// A positional hierarchy lookup was out of range
    #[error("Hierarchy index {index} out of range for cube with {count} hierarchies")]
    HierarchyIndexOutOfRange { index: usize, count: usize },

    /// A level id does not belong to this cube
    #[error("Unknown level: {id}")]
    UnknownLevel { id: LevelId },

    /// A member id does not belong to this cube
    #[error("Unknown member: {id}")]
    UnknownMember { id: MemberId },

    /// A hierarchy ended up with no member to use as its default
    #[error("Hierarchy {name} has no members and no All member to use as default")]
    NoDefaultMember { name: String },

    /// A member was attached under a parent from a different hierarchy
    #[error("Parent {parent} belongs to a different hierarchy than level {level}")]
    ParentHierarchyMismatch { parent: MemberId, level: LevelId },
}

impl ModelError {
    /// Create a duplicate-name error
    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
        }
    }
}
