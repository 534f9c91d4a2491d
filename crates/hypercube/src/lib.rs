//! Dimensional (OLAP) expression evaluation engine
//!
//! This crate ties the workspace together:
//! - cube metadata and builders ([`model`])
//! - value and type-shape representations ([`types`])
//! - the evaluation core: contexts, compiled nodes, caching, named sets
//!   and the axis driver ([`eval`])
//!
//! # Example
//!
//! ```ignore
//! use hypercube::{CubeBuilder, EvalConfig, Evaluator, QueryState};
//!
//! let mut builder = CubeBuilder::new("Sales");
//! let time = builder.add_dimension("Time")?;
//! builder.add_hierarchy(time, "Time", true)?;
//! let cube = builder.build()?;
//!
//! let state = QueryState::new(cube.clone(), cube, reader, EvalConfig::default());
//! let ev = Evaluator::root(state)?;
//! ```

// Re-export all public APIs from internal crates
pub use hypercube_eval as eval;
pub use hypercube_model as model;
pub use hypercube_types as types;

// Convenience re-exports
pub use hypercube_eval::{
    Calc, CellReader, EvalConfig, EvalError, EvalResult, Evaluator, QueryState,
};
pub use hypercube_model::{Cube, CubeBuilder, Member, SchemaReader};
pub use hypercube_types::{CellValue, TypeShape};
