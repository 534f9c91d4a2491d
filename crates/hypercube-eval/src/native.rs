//! Native set evaluation
//!
//! Some set functions (crossjoins, filters, top-counts) can be pushed
//! down to the fact store and answered in bulk instead of member by
//! member. A [`NativeProvider`] inspects a function name and its compiled
//! arguments and, when the store can answer that combination under the
//! current context, returns a [`NativeSetEvaluator`] for it. Returning
//! `None` is always correct; the interpreted path is the semantics of
//! record.
//!
//! Nodes consult the provider only when the evaluator's native flag is
//! on; iterating functions turn the flag off for their element
//! expressions, because a pushed-down subexpression inside a loop would
//! re-plan per element.

use crate::calc::Calc;
use crate::context::Evaluator;
use crate::error::EvalResult;
use hypercube_types::TupleValue;
use std::fmt;
use std::sync::Arc;

/// A prepared bulk evaluation of one set expression.
pub trait NativeSetEvaluator: fmt::Debug + Send + Sync {
    /// Produce the set's tuples under the given context. The result must
    /// equal what the interpreted path would produce, including ordering.
    fn evaluate_tuples(&self, ev: &Evaluator) -> EvalResult<Vec<TupleValue>>;
}

/// Plans native evaluations for supported function/argument combinations.
pub trait NativeProvider: fmt::Debug + Send + Sync {
    /// Offer `function(args...)` for push-down under `ev`'s context.
    fn native_for(
        &self,
        function: &str,
        args: &[&dyn Calc],
        ev: &Evaluator,
    ) -> Option<Arc<dyn NativeSetEvaluator>>;
}
