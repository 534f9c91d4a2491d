//! Named-set evaluation and iteration tracking
//!
//! A named set is declared once per query (`WITH SET` or a schema-level
//! definition) and referenced from many expressions. A *static* set is
//! resolved exactly once, in the query's root context, and the frozen
//! result is shared by every reference; a *dynamic* set re-resolves under
//! each referencing context.
//!
//! While a set function iterates a named set, the evaluator tracks the
//! zero-based position of the element under evaluation so expressions
//! inside the loop can ask "which ordinal am I at". Before iteration
//! starts (and outside any iteration) the ordinal is absent.

use crate::calc::{MemberIter, MemberListCalc, TupleIter, TupleListCalc};
use crate::context::Evaluator;
use crate::error::EvalResult;
use hypercube_model::Member;
use hypercube_types::{TupleValue, TypeError};
use log::debug;
use std::cell::{Cell, RefCell};
use std::sync::Arc;

/// The compiled expression behind a named set.
#[derive(Debug, Clone)]
pub enum NamedSetExpr {
    /// An arity-1 set of members
    Members(Arc<dyn MemberListCalc>),
    /// A set of tuples
    Tuples(Arc<dyn TupleListCalc>),
}

#[derive(Debug, Clone)]
enum SetValue {
    Members(Arc<Vec<Arc<Member>>>),
    Tuples(Arc<Vec<TupleValue>>),
}

/// One named set's per-execution state: the resolved (or resolvable)
/// value plus the iteration cursor.
#[derive(Debug)]
pub struct NamedSetEvaluator {
    name: String,
    expr: NamedSetExpr,
    dynamic: bool,
    ordinal: Cell<Option<usize>>,
    frozen: RefCell<Option<SetValue>>,
}

impl NamedSetEvaluator {
    pub fn new(name: impl Into<String>, expr: NamedSetExpr, dynamic: bool) -> Self {
        Self {
            name: name.into(),
            expr,
            dynamic,
            ordinal: Cell::new(None),
            frozen: RefCell::new(None),
        }
    }

    /// The set's declared name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether references re-resolve under their own context
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Zero-based position of the element currently under iteration, or
    /// `None` when no iteration over this set has started.
    pub fn current_ordinal(&self) -> Option<usize> {
        self.ordinal.get()
    }

    fn resolve(&self, ev: &Evaluator) -> EvalResult<SetValue> {
        if !self.dynamic {
            if let Some(value) = self.frozen.borrow().clone() {
                return Ok(value);
            }
        }
        // Static sets resolve in the root context regardless of where the
        // first reference occurs.
        let value = if self.dynamic {
            self.compute(ev)?
        } else {
            let root = Evaluator::root(Arc::clone(ev.state()))?;
            self.compute(&root)?
        };
        if !self.dynamic {
            debug!("froze static named set '{}'", self.name);
            *self.frozen.borrow_mut() = Some(value.clone());
        }
        Ok(value)
    }

    fn compute(&self, ev: &Evaluator) -> EvalResult<SetValue> {
        Ok(match &self.expr {
            NamedSetExpr::Members(calc) => {
                SetValue::Members(Arc::new(calc.evaluate_member_list(ev)?))
            }
            NamedSetExpr::Tuples(calc) => {
                SetValue::Tuples(Arc::new(calc.evaluate_tuple_list(ev)?))
            }
        })
    }

    /// Resolve to a member list. Fails for tuple-shaped sets.
    pub fn members(&self, ev: &Evaluator) -> EvalResult<Arc<Vec<Arc<Member>>>> {
        match self.resolve(ev)? {
            SetValue::Members(members) => Ok(members),
            SetValue::Tuples(_) => {
                Err(TypeError::mismatch("member set", format!("tuple set '{}'", self.name)).into())
            }
        }
    }

    /// Resolve to a tuple list. Fails for member-shaped sets.
    pub fn tuples(&self, ev: &Evaluator) -> EvalResult<Arc<Vec<TupleValue>>> {
        match self.resolve(ev)? {
            SetValue::Tuples(tuples) => Ok(tuples),
            SetValue::Members(_) => {
                Err(TypeError::mismatch("tuple set", format!("member set '{}'", self.name)).into())
            }
        }
    }

    /// Iterate the set's members, moving the ordinal cursor as a side
    /// effect: it reads `Some(i)` exactly while element `i` is the one
    /// last yielded.
    pub fn iterate_members<'a>(&'a self, ev: &Evaluator) -> EvalResult<MemberIter<'a>> {
        let members = self.members(ev)?;
        self.ordinal.set(None);
        let ordinal = &self.ordinal;
        Ok(Box::new((0..members.len()).map(move |i| {
            ordinal.set(Some(i));
            Ok(members[i].clone())
        })))
    }

    /// As [`NamedSetEvaluator::iterate_members`] for tuple-shaped sets.
    pub fn iterate_tuples<'a>(&'a self, ev: &Evaluator) -> EvalResult<TupleIter<'a>> {
        let tuples = self.tuples(ev)?;
        self.ordinal.set(None);
        let ordinal = &self.ordinal;
        Ok(Box::new((0..tuples.len()).map(move |i| {
            ordinal.set(Some(i));
            Ok(tuples[i].clone())
        })))
    }
}
