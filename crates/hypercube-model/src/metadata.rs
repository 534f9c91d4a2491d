//! Dimensional metadata value objects
//!
//! Ids are dense indexes into the owning [`Cube`](crate::Cube)'s tables, so
//! lookups are O(1) and ids are cheap to copy into cache keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a dimension within one cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DimensionId(pub u32);

/// Identifier of a hierarchy within one cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HierarchyId(pub u32);

/// Identifier of a level within one cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelId(pub u32);

/// Identifier of a member within one cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub u32);

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dimension#{}", self.0)
    }
}

impl fmt::Display for HierarchyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hierarchy#{}", self.0)
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level#{}", self.0)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "member#{}", self.0)
    }
}

/// A dimension of the cube (e.g. `Time`, `Store`, `Measures`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// Dimension id within the owning cube
    pub id: DimensionId,
    /// Dimension name
    pub name: String,
    /// Whether this is the measures dimension
    pub measures: bool,
}

/// A hierarchy of a dimension.
///
/// Every hierarchy always has a current member during evaluation; when the
/// query does not set one, the cube's default member for the hierarchy
/// applies (the "All" member when the hierarchy has one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    /// Hierarchy id within the owning cube
    pub id: HierarchyId,
    /// Owning dimension
    pub dimension: DimensionId,
    /// Hierarchy name
    pub name: String,
    /// Whether the hierarchy has an "All" top member
    pub has_all: bool,
}

impl Hierarchy {
    /// Bracketed unique name, e.g. `[Time]`.
    pub fn unique_name(&self) -> String {
        format!("[{}]", self.name)
    }
}

/// A level of a hierarchy. Depth 0 is the top ("All") level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Level id within the owning cube
    pub id: LevelId,
    /// Owning hierarchy
    pub hierarchy: HierarchyId,
    /// Level name
    pub name: String,
    /// Distance from the hierarchy top
    pub depth: u32,
}

/// A member of a hierarchy.
///
/// Members are immutable and shared by `Arc`; identity comparisons during
/// evaluation go through [`MemberId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member id within the owning cube
    pub id: MemberId,
    /// Owning hierarchy
    pub hierarchy: HierarchyId,
    /// Level the member belongs to
    pub level: LevelId,
    /// Simple name, e.g. `Q1`
    pub name: String,
    /// Fully qualified name, e.g. `[Time].[1997].[Q1]`
    pub unique_name: String,
    /// Parent member, `None` for top members
    pub parent: Option<MemberId>,
    /// Whether this is the hierarchy's "All" member
    pub all: bool,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unique_name)
    }
}
