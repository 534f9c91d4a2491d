//! Compiled-expression node contract
//!
//! A [`Calc`] is one node of a compiled expression tree: it declares a
//! static [`TypeShape`], exposes its children for dependency analysis, and
//! evaluates under an [`Evaluator`] context. Evaluation is pure with
//! respect to the tree itself; it may read through the context's cache and
//! may increase the miss counter, but never mutates the evaluator it was
//! given (it only pushes derived copies or uses the scoped restore form).
//!
//! Capabilities are the shape subtraits ([`DoubleCalc`], [`MemberCalc`],
//! [`MemberListCalc`], ...). A typed node implements its shape method
//! directly; the subtrait defaults implement the generic-fallback path
//! (evaluate untyped, then perform one explicit checked conversion), so a
//! node built through [`GenericCalc`](crate::generic::GenericCalc) defers
//! shape errors to evaluation time, which is permitted but the exception.
//!
//! When a typed path observes [`CellValue::NotYetAvailable`] it cannot
//! return the sentinel in-band; it records a miss on the shared counter
//! and returns a provisional null representation. The untyped path
//! propagates the sentinel value itself, and the axis driver re-evaluates
//! while the miss counter moves.

use crate::context::Evaluator;
use crate::error::{EvalError, EvalResult};
use chrono::{DateTime, Utc};
use hypercube_model::{Dimension, Hierarchy, HierarchyId, Level, Member};
use hypercube_types::{CellValue, DOUBLE_NULL, INT_NULL, TupleValue, TypeShape};
use std::fmt;
use std::sync::Arc;

/// Whether a set-producing node materializes its result or streams it.
///
/// Fixed at compile time; a node's declared style never changes across
/// evaluations. `List` results are finite, counted, and restartable;
/// `Iterable` results are finite single-pass sequences whose restart
/// requires re-invoking the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStyle {
    /// Fully materialized ordered sequence
    List,
    /// Lazy single-pass sequence
    Iterable,
}

/// A lazy member sequence borrowed from its producing node and context.
pub type MemberIter<'a> = Box<dyn Iterator<Item = EvalResult<Arc<Member>>> + 'a>;

/// A lazy tuple sequence borrowed from its producing node and context.
pub type TupleIter<'a> = Box<dyn Iterator<Item = EvalResult<TupleValue>> + 'a>;

/// One compiled expression node.
pub trait Calc: fmt::Debug + Send + Sync {
    /// The declared result shape, invariant after construction.
    fn result_type(&self) -> &TypeShape;

    /// Immediate children, for dependency analysis and tree walkers.
    fn children(&self) -> Vec<&dyn Calc> {
        Vec::new()
    }

    /// Whether this node's result can vary with the current member of
    /// `hierarchy`. Returning true is always safe; returning false when
    /// the result could differ is a correctness bug. The default is the
    /// composite rule: depends if any child depends.
    fn depends_on(&self, hierarchy: HierarchyId) -> bool {
        crate::deps::any_depends(&self.children(), hierarchy)
    }

    /// Result style of set-shaped nodes; ignored for scalars.
    fn result_style(&self) -> ResultStyle {
        ResultStyle::List
    }

    /// Evaluate on the untyped object path.
    fn evaluate(&self, ev: &Evaluator) -> EvalResult<CellValue>;
}

/// Integer-shaped evaluation; null is [`INT_NULL`].
pub trait IntegerCalc: Calc {
    fn evaluate_integer(&self, ev: &Evaluator) -> EvalResult<i64> {
        match self.evaluate(ev)? {
            CellValue::NotYetAvailable => {
                ev.note_missing();
                Ok(INT_NULL)
            }
            value => Ok(value.into_integer()?),
        }
    }
}

/// Double-shaped evaluation; null is [`DOUBLE_NULL`].
pub trait DoubleCalc: Calc {
    fn evaluate_double(&self, ev: &Evaluator) -> EvalResult<f64> {
        match self.evaluate(ev)? {
            CellValue::NotYetAvailable => {
                ev.note_missing();
                Ok(DOUBLE_NULL)
            }
            value => Ok(value.into_double()?),
        }
    }
}

/// Boolean-shaped evaluation; null coerces to false.
pub trait BooleanCalc: Calc {
    fn evaluate_boolean(&self, ev: &Evaluator) -> EvalResult<bool> {
        match self.evaluate(ev)? {
            CellValue::NotYetAvailable => {
                ev.note_missing();
                Ok(false)
            }
            value => Ok(value.into_boolean()?),
        }
    }
}

/// String-shaped evaluation.
pub trait StringCalc: Calc {
    fn evaluate_string(&self, ev: &Evaluator) -> EvalResult<Option<String>> {
        match self.evaluate(ev)? {
            CellValue::NotYetAvailable => {
                ev.note_missing();
                Ok(None)
            }
            value => Ok(value.into_string()?),
        }
    }
}

/// DateTime-shaped evaluation.
pub trait DateTimeCalc: Calc {
    fn evaluate_datetime(&self, ev: &Evaluator) -> EvalResult<Option<DateTime<Utc>>> {
        match self.evaluate(ev)? {
            CellValue::NotYetAvailable => {
                ev.note_missing();
                Ok(None)
            }
            value => Ok(value.into_datetime()?),
        }
    }
}

/// Member-shaped evaluation.
pub trait MemberCalc: Calc {
    fn evaluate_member(&self, ev: &Evaluator) -> EvalResult<Arc<Member>> {
        match self.evaluate(ev)? {
            CellValue::NotYetAvailable => {
                ev.note_missing();
                match self.result_type().bound_hierarchy() {
                    Some(hierarchy) => Ok(ev.cube().default_member(hierarchy)?.clone()),
                    None => Err(EvalError::internal(
                        "member expression has no provisional value for unfetched data",
                    )),
                }
            }
            value => Ok(value.into_member()?),
        }
    }
}

/// Level-shaped evaluation.
pub trait LevelCalc: Calc {
    fn evaluate_level(&self, ev: &Evaluator) -> EvalResult<Arc<Level>> {
        Ok(self.evaluate(ev)?.into_level()?)
    }
}

/// Hierarchy-shaped evaluation.
pub trait HierarchyCalc: Calc {
    fn evaluate_hierarchy(&self, ev: &Evaluator) -> EvalResult<Arc<Hierarchy>> {
        Ok(self.evaluate(ev)?.into_hierarchy()?)
    }
}

/// Dimension-shaped evaluation.
pub trait DimensionCalc: Calc {
    fn evaluate_dimension(&self, ev: &Evaluator) -> EvalResult<Arc<Dimension>> {
        Ok(self.evaluate(ev)?.into_dimension()?)
    }
}

/// Tuple-shaped evaluation.
pub trait TupleCalc: Calc {
    fn evaluate_tuple(&self, ev: &Evaluator) -> EvalResult<TupleValue> {
        match self.evaluate(ev)? {
            CellValue::NotYetAvailable => {
                ev.note_missing();
                provisional_tuple(self.result_type(), ev)
            }
            value => Ok(value.into_tuple()?),
        }
    }
}

/// Eager member-set evaluation.
pub trait MemberListCalc: Calc {
    fn evaluate_member_list(&self, ev: &Evaluator) -> EvalResult<Vec<Arc<Member>>> {
        match self.evaluate(ev)? {
            CellValue::NotYetAvailable => {
                ev.note_missing();
                Ok(Vec::new())
            }
            value => Ok(value.into_member_set()?),
        }
    }
}

/// Lazy member-set evaluation. The default materializes through the
/// untyped path; streaming nodes override it.
pub trait MemberIterCalc: Calc {
    fn evaluate_member_iter<'a>(&'a self, ev: &'a Evaluator) -> EvalResult<MemberIter<'a>> {
        let members = match self.evaluate(ev)? {
            CellValue::NotYetAvailable => {
                ev.note_missing();
                Vec::new()
            }
            value => value.into_member_set()?,
        };
        Ok(Box::new(members.into_iter().map(Ok)))
    }
}

/// Eager tuple-set evaluation.
pub trait TupleListCalc: Calc {
    fn evaluate_tuple_list(&self, ev: &Evaluator) -> EvalResult<Vec<TupleValue>> {
        match self.evaluate(ev)? {
            CellValue::NotYetAvailable => {
                ev.note_missing();
                Ok(Vec::new())
            }
            value => Ok(value.into_tuple_set()?),
        }
    }
}

/// Lazy tuple-set evaluation.
pub trait TupleIterCalc: Calc {
    fn evaluate_tuple_iter<'a>(&'a self, ev: &'a Evaluator) -> EvalResult<TupleIter<'a>> {
        let tuples = match self.evaluate(ev)? {
            CellValue::NotYetAvailable => {
                ev.note_missing();
                Vec::new()
            }
            value => value.into_tuple_set()?,
        };
        Ok(Box::new(tuples.into_iter().map(Ok)))
    }
}

/// Void-shaped evaluation (effect only).
pub trait VoidCalc: Calc {
    fn evaluate_void(&self, ev: &Evaluator) -> EvalResult<()> {
        self.evaluate(ev)?;
        Ok(())
    }
}

/// Provisional tuple for an unfetched result: the default member of every
/// hierarchy the declared tuple type binds.
fn provisional_tuple(shape: &TypeShape, ev: &Evaluator) -> EvalResult<TupleValue> {
    let TypeShape::Tuple(tuple) = shape else {
        return Err(EvalError::internal(
            "tuple expression with non-tuple declared shape",
        ));
    };
    let mut members = TupleValue::new();
    for element in tuple.elements() {
        match element.bound_hierarchy() {
            Some(hierarchy) => members.push(ev.cube().default_member(hierarchy)?.clone()),
            None => {
                return Err(EvalError::internal(
                    "tuple expression has no provisional value for unfetched data",
                ));
            }
        }
    }
    Ok(members)
}
