//! Dimensional expression evaluation
//!
//! This crate is the physical evaluation core of the query processor: it
//! executes compiled expression trees against a cube under a dimensional
//! context. It provides:
//!
//! - **Node contract**: the [`Calc`] trait plus one capability trait per
//!   result shape, with a generic fallback ([`GenericCalc`]) for nodes
//!   whose shape cannot be pinned statically
//! - **Context**: the [`Evaluator`] assignment of one current member per
//!   hierarchy, with copy-on-push isolation and a scoped save/restore
//!   form for tight loops
//! - **Dependency analysis**: which hierarchies a node's result can vary
//!   with, driving sound result sharing
//! - **Result cache**: per-execution memoization keyed by node identity
//!   and the dependent context slice
//! - **Set protocol**: eager lists and lazy iterators, with adapters in
//!   both directions
//! - **Named sets**: static/dynamic resolution plus iteration-ordinal
//!   tracking
//! - **Lazy data tolerance**: a "not yet available" sentinel that flows
//!   through evaluation, a miss-tolerant backward scan, and an axis
//!   driver that re-evaluates until results are final
//!
//! # Example
//!
//! ```ignore
//! use hypercube_eval::{ConstantCalc, EvalConfig, Evaluator, QueryState};
//!
//! let state = QueryState::new(cube.clone(), cube, reader, EvalConfig::default());
//! let ev = Evaluator::root(state)?;
//! let value = ev.cached_eval(&calc)?;
//! ```
//!
//! # Architecture
//!
//! Evaluation is pull-based: a driver asks the root node for its value,
//! and nodes ask their children through the shape-typed methods. Nothing
//! here parses or compiles; the compiler hands this crate a finished tree
//! and the fact store hides behind [`CellReader`].

pub mod axis;
pub mod cache;
pub mod calc;
pub mod config;
pub mod context;
pub mod data;
pub mod deps;
pub mod error;
pub mod generic;
pub mod named_set;
pub mod native;
pub mod nodes;
pub mod scan;
pub mod sets;

// Re-export main types
pub use axis::evaluate_axes;
pub use cache::{CacheKey, CachedCalc, ResultCache};
pub use calc::{
    BooleanCalc, Calc, DateTimeCalc, DimensionCalc, DoubleCalc, HierarchyCalc, IntegerCalc,
    LevelCalc, MemberCalc, MemberIter, MemberIterCalc, MemberListCalc, ResultStyle, StringCalc,
    TupleCalc, TupleIter, TupleIterCalc, TupleListCalc, VoidCalc,
};
pub use config::{CancelCheck, EvalConfig};
pub use context::{Evaluator, QueryState};
pub use data::{CellReader, EmptyCellReader};
pub use deps::{any_depends, reads_cell_depends_on};
pub use error::{EvalError, EvalResult};
pub use generic::{GenericCalc, GenericEvalFn};
pub use named_set::{NamedSetEvaluator, NamedSetExpr};
pub use native::{NativeProvider, NativeSetEvaluator};
pub use nodes::{
    ChildrenCalc, ConstantCalc, CrossJoinCalc, CurrentMemberCalc, IsEmptyCalc, MemberValueCalc,
    TupleValueCalc,
};
pub use scan::last_non_empty;
pub use sets::{MemberIterToList, MemberListToIter, TupleIterToList, TupleListToIter};
