//! Top-level axis evaluation
//!
//! Query axes are tuple sets evaluated against the root context. Because
//! the fact store loads cells lazily, a pass over the axes may produce
//! provisional results backed by unfetched data; every such result
//! records a miss on the shared counter, and the reader records which
//! cells it was asked for. The driver re-runs the pass until one
//! completes without recording a new miss, letting the reader batch-load
//! everything a pass requested before the next one starts.

use crate::calc::TupleListCalc;
use crate::context::Evaluator;
use crate::error::{EvalError, EvalResult};
use hypercube_types::TupleValue;
use log::debug;

/// A pass that keeps recording misses without converging indicates a
/// reader that never loads what it was asked for.
const MAX_PASSES: usize = 64;

/// Evaluate every axis of a query until all results are final.
///
/// Cancellation is checked between axes; a pending request surfaces as
/// [`EvalError::Canceled`].
pub fn evaluate_axes(
    ev: &Evaluator,
    axes: &[&dyn TupleListCalc],
) -> EvalResult<Vec<Vec<TupleValue>>> {
    let axis_ev = ev.push_eval_axes(true)?;
    for pass in 1..=MAX_PASSES {
        let before = ev.state().missed_count();
        let mut results = Vec::with_capacity(axes.len());
        for axis in axes {
            if ev.state().config().cancel_requested() {
                return Err(EvalError::Canceled);
            }
            results.push(axis.evaluate_tuple_list(&axis_ev)?);
        }
        let missed = ev.state().missed_count() - before;
        if missed == 0 {
            return Ok(results);
        }
        debug!("axis pass {pass}: {missed} provisional results, re-evaluating");
    }
    Err(EvalError::internal(
        "axis evaluation produced provisional results on every pass",
    ))
}
