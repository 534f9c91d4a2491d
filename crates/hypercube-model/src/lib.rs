//! OLAP metadata model for the hypercube evaluation core
//!
//! This crate defines the dimensional metadata an expression tree is
//! evaluated against:
//!
//! - **Dimensions, hierarchies, levels, members**: immutable value objects
//!   identified by small copyable ids, shared by `Arc` once a cube is built
//! - **Cube**: the ordered collection of hierarchies with a default member
//!   per hierarchy and the parent/child member tree
//! - **SchemaReader**: the collaborator contract through which the
//!   evaluation core navigates members without knowing about storage
//!
//! The metadata here is read-only after [`CubeBuilder::build`]; the
//! evaluation core shares it freely across query executions.

pub mod cube;
pub mod error;
pub mod metadata;
pub mod reader;

pub use cube::{Cube, CubeBuilder};
pub use error::ModelError;
pub use metadata::{
    Dimension, DimensionId, Hierarchy, HierarchyId, Level, LevelId, Member, MemberId,
};
pub use reader::SchemaReader;
