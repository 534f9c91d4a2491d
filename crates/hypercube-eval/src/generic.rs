//! Generic fallback adapter
//!
//! [`GenericCalc`] implements every capability by delegating to one
//! untyped compute closure and converting at the boundary. The compiler
//! uses it for expressions whose shape cannot be pinned statically; it
//! costs a second dispatch and defers type errors to evaluation time, so
//! typed nodes are preferred wherever the inferred shape allows one.

use crate::calc::{
    BooleanCalc, Calc, DateTimeCalc, DimensionCalc, DoubleCalc, HierarchyCalc, IntegerCalc,
    LevelCalc, MemberCalc, MemberIterCalc, MemberListCalc, ResultStyle, StringCalc, TupleCalc,
    TupleIterCalc, TupleListCalc, VoidCalc,
};
use crate::context::Evaluator;
use crate::error::EvalResult;
use hypercube_types::{CellValue, TypeShape};
use std::fmt;
use std::sync::Arc;

/// The untyped compute function of a generic node.
pub type GenericEvalFn = Arc<dyn Fn(&Evaluator) -> EvalResult<CellValue> + Send + Sync>;

/// A node implementing all capabilities through one untyped closure.
pub struct GenericCalc {
    ty: TypeShape,
    style: ResultStyle,
    children: Vec<Box<dyn Calc>>,
    eval: GenericEvalFn,
}

impl GenericCalc {
    /// Wrap an untyped compute closure under a declared shape.
    pub fn new(ty: TypeShape, eval: GenericEvalFn) -> Self {
        Self {
            ty,
            style: ResultStyle::List,
            children: Vec::new(),
            eval,
        }
    }

    /// Attach children for dependency propagation.
    pub fn with_children(mut self, children: Vec<Box<dyn Calc>>) -> Self {
        self.children = children;
        self
    }

    /// Declare the result style of a set-shaped node.
    pub fn with_style(mut self, style: ResultStyle) -> Self {
        self.style = style;
        self
    }
}

impl fmt::Debug for GenericCalc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericCalc")
            .field("type", &self.ty)
            .field("style", &self.style)
            .field("children", &self.children.len())
            .finish()
    }
}

impl Calc for GenericCalc {
    fn result_type(&self) -> &TypeShape {
        &self.ty
    }

    fn children(&self) -> Vec<&dyn Calc> {
        self.children.iter().map(|child| &**child).collect()
    }

    fn result_style(&self) -> ResultStyle {
        self.style
    }

    fn evaluate(&self, ev: &Evaluator) -> EvalResult<CellValue> {
        (self.eval)(ev)
    }
}

impl IntegerCalc for GenericCalc {}
impl DoubleCalc for GenericCalc {}
impl BooleanCalc for GenericCalc {}
impl StringCalc for GenericCalc {}
impl DateTimeCalc for GenericCalc {}
impl MemberCalc for GenericCalc {}
impl LevelCalc for GenericCalc {}
impl HierarchyCalc for GenericCalc {}
impl DimensionCalc for GenericCalc {}
impl TupleCalc for GenericCalc {}
impl MemberListCalc for GenericCalc {}
impl MemberIterCalc for GenericCalc {}
impl TupleListCalc for GenericCalc {}
impl TupleIterCalc for GenericCalc {}
impl VoidCalc for GenericCalc {}
