//! Adapters between the eager and lazy set protocols
//!
//! A set-consuming function states which access style it wants; when the
//! producing node declares the other style, the compiler inserts one of
//! these adapters. List-to-iter is free (iterate the materialized
//! vector); iter-to-list drains the sequence once into a vector, which is
//! where a lazy pipeline pays its materialization cost.

use crate::calc::{
    Calc, MemberIter, MemberIterCalc, MemberListCalc, ResultStyle, TupleIter, TupleIterCalc,
    TupleListCalc,
};
use crate::context::Evaluator;
use crate::error::EvalResult;
use hypercube_model::{HierarchyId, Member};
use hypercube_types::{CellValue, TupleValue, TypeShape};
use std::sync::Arc;

macro_rules! delegate_calc {
    ($field:ident) => {
        fn result_type(&self) -> &TypeShape {
            self.$field.result_type()
        }

        fn children(&self) -> Vec<&dyn Calc> {
            vec![self.$field.as_ref() as &dyn Calc]
        }

        fn depends_on(&self, hierarchy: HierarchyId) -> bool {
            self.$field.depends_on(hierarchy)
        }

        fn evaluate(&self, ev: &Evaluator) -> EvalResult<CellValue> {
            self.$field.evaluate(ev)
        }
    };
}

/// Presents an eager member set through the lazy protocol.
#[derive(Debug)]
pub struct MemberListToIter {
    list: Box<dyn MemberListCalc>,
}

impl MemberListToIter {
    pub fn new(list: Box<dyn MemberListCalc>) -> Self {
        Self { list }
    }
}

impl Calc for MemberListToIter {
    delegate_calc!(list);

    fn result_style(&self) -> ResultStyle {
        ResultStyle::Iterable
    }
}

impl MemberIterCalc for MemberListToIter {
    fn evaluate_member_iter<'a>(&'a self, ev: &'a Evaluator) -> EvalResult<MemberIter<'a>> {
        let members = self.list.evaluate_member_list(ev)?;
        Ok(Box::new(members.into_iter().map(Ok)))
    }
}

/// Materializes a lazy member sequence into a counted, restartable list.
#[derive(Debug)]
pub struct MemberIterToList {
    iter: Box<dyn MemberIterCalc>,
}

impl MemberIterToList {
    pub fn new(iter: Box<dyn MemberIterCalc>) -> Self {
        Self { iter }
    }
}

impl Calc for MemberIterToList {
    delegate_calc!(iter);

    fn result_style(&self) -> ResultStyle {
        ResultStyle::List
    }
}

impl MemberListCalc for MemberIterToList {
    fn evaluate_member_list(&self, ev: &Evaluator) -> EvalResult<Vec<Arc<Member>>> {
        let mut members = Vec::new();
        for member in self.iter.evaluate_member_iter(ev)? {
            members.push(member?);
            ev.check_iteration(members.len())?;
        }
        Ok(members)
    }
}

/// Presents an eager tuple set through the lazy protocol.
#[derive(Debug)]
pub struct TupleListToIter {
    list: Box<dyn TupleListCalc>,
}

impl TupleListToIter {
    pub fn new(list: Box<dyn TupleListCalc>) -> Self {
        Self { list }
    }
}

impl Calc for TupleListToIter {
    delegate_calc!(list);

    fn result_style(&self) -> ResultStyle {
        ResultStyle::Iterable
    }
}

impl TupleIterCalc for TupleListToIter {
    fn evaluate_tuple_iter<'a>(&'a self, ev: &'a Evaluator) -> EvalResult<TupleIter<'a>> {
        let tuples = self.list.evaluate_tuple_list(ev)?;
        Ok(Box::new(tuples.into_iter().map(Ok)))
    }
}

/// Materializes a lazy tuple sequence into a counted, restartable list.
#[derive(Debug)]
pub struct TupleIterToList {
    iter: Box<dyn TupleIterCalc>,
}

impl TupleIterToList {
    pub fn new(iter: Box<dyn TupleIterCalc>) -> Self {
        Self { iter }
    }
}

impl Calc for TupleIterToList {
    delegate_calc!(iter);

    fn result_style(&self) -> ResultStyle {
        ResultStyle::List
    }
}

impl TupleListCalc for TupleIterToList {
    fn evaluate_tuple_list(&self, ev: &Evaluator) -> EvalResult<Vec<TupleValue>> {
        let mut tuples = Vec::new();
        for tuple in self.iter.evaluate_tuple_iter(ev)? {
            tuples.push(tuple?);
            ev.check_iteration(tuples.len())?;
        }
        Ok(tuples)
    }
}
