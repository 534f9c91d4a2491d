//! Dependency-analysis helpers
//!
//! `Calc::depends_on` bounds whether a node's result can vary with a
//! hierarchy's current member; the cache projects contexts onto exactly
//! the hierarchies a node depends on. Three rules cover the tree:
//!
//! 1. Default: a composite depends on a hierarchy if any child does.
//! 2. Pinning: a node that evaluates a member or tuple and re-establishes
//!    context from it before reading data does *not* depend on hierarchies
//!    its operand's declared shape statically fixes (the operand shadows
//!    the ambient assignment), but still depends on every hierarchy that
//!    is not pinned, because of the implicit cell read.
//! 3. Unconstrained reads: a node whose evaluation consults fact data
//!    under whatever context is ambient (emptiness tests) depends on all
//!    hierarchies, regardless of its visible children.
//!
//! These are the only override rules; individual functions get documented,
//! tested overrides only where their semantics demonstrably require one.

use crate::calc::Calc;
use hypercube_model::HierarchyId;

/// Rule 1: any-child dependence over an explicit child slice.
pub fn any_depends(children: &[&dyn Calc], hierarchy: HierarchyId) -> bool {
    children.iter().any(|child| child.depends_on(hierarchy))
}

/// Rule 2: dependence of a value-reading node whose context is
/// re-established from `operand` (a member- or tuple-shaped child).
///
/// Depends on `hierarchy` when the operand itself does, or when the
/// operand's declared shape leaves `hierarchy` to the ambient context.
pub fn reads_cell_depends_on(operand: &dyn Calc, hierarchy: HierarchyId) -> bool {
    operand.depends_on(hierarchy) || !operand.result_type().pins_hierarchy(hierarchy)
}
