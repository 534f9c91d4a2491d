//! Schema-reader collaborator contract
//!
//! The evaluation core navigates members exclusively through this trait so
//! that metadata can come from an in-memory cube, a remote catalog, or a
//! role-restricted view without the core knowing the difference.

use crate::cube::Cube;
use crate::metadata::{Level, Member};
use std::sync::Arc;

/// Read access to the member tree of a cube.
pub trait SchemaReader: Send + Sync {
    /// Ordered children of a member. Leaf members yield an empty vector.
    fn member_children(&self, member: &Member) -> Vec<Arc<Member>>;

    /// Ordered members of a level.
    fn level_members(&self, level: &Level) -> Vec<Arc<Member>>;
}

impl SchemaReader for Cube {
    fn member_children(&self, member: &Member) -> Vec<Arc<Member>> {
        self.child_ids(member.id)
            .iter()
            .filter_map(|id| self.member(*id).ok().cloned())
            .collect()
    }

    fn level_members(&self, level: &Level) -> Vec<Arc<Member>> {
        self.level_member_ids(level.id)
            .iter()
            .filter_map(|id| self.member(*id).ok().cloned())
            .collect()
    }
}
