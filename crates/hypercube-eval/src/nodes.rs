//! Built-in compiled nodes
//!
//! The compiler owns node construction; this core only defines the small
//! adapter and diagnostic nodes it needs itself: literals, current-member
//! references, the member/tuple cell readers whose dependency pinning the
//! cache relies on, the emptiness test, and two set producers (children,
//! crossjoin) that exercise the schema-reader and native-evaluation seams.

use crate::calc::{
    BooleanCalc, Calc, DateTimeCalc, DoubleCalc, IntegerCalc, MemberCalc, MemberIterCalc,
    MemberListCalc, StringCalc, TupleCalc, TupleIterCalc, TupleListCalc,
};
use crate::context::Evaluator;
use crate::deps::{any_depends, reads_cell_depends_on};
use crate::error::EvalResult;
use hypercube_model::{HierarchyId, Member};
use hypercube_types::{CellValue, SetType, TupleType, TupleValue, TypeError, TypeShape};
use log::debug;
use std::sync::Arc;

/// A literal value with a fixed shape. Depends on no hierarchy.
#[derive(Debug)]
pub struct ConstantCalc {
    ty: TypeShape,
    value: CellValue,
}

impl ConstantCalc {
    /// Integer literal
    pub fn integer(value: i64) -> Self {
        Self {
            ty: TypeShape::integer(),
            value: CellValue::Integer(value),
        }
    }

    /// Double literal
    pub fn double(value: f64) -> Self {
        Self {
            ty: TypeShape::numeric(),
            value: CellValue::Double(value),
        }
    }

    /// Boolean literal
    pub fn boolean(value: bool) -> Self {
        Self {
            ty: TypeShape::boolean(),
            value: CellValue::Boolean(value),
        }
    }

    /// String literal
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            ty: TypeShape::string(),
            value: CellValue::String(value.into()),
        }
    }

    /// The null literal
    pub fn null() -> Self {
        Self {
            ty: TypeShape::Scalar(hypercube_types::ScalarKind::Null),
            value: CellValue::Null,
        }
    }

    /// A fixed member. The shape pins the member's hierarchy.
    pub fn member(member: Arc<Member>) -> Self {
        Self {
            ty: TypeShape::member(member.hierarchy),
            value: CellValue::Member(member),
        }
    }

    /// A fixed tuple. Fails if two members share a hierarchy.
    pub fn tuple(members: TupleValue) -> Result<Self, TypeError> {
        let elements = members.iter().map(|m| TypeShape::member(m.hierarchy)).collect();
        let tuple = TupleType::new(elements)?;
        Ok(Self {
            ty: TypeShape::Tuple(tuple),
            value: CellValue::Tuple(members),
        })
    }

    /// A fixed, materialized member set.
    pub fn member_set(hierarchy: Option<HierarchyId>, members: Vec<Arc<Member>>) -> Self {
        Self {
            ty: TypeShape::Set(SetType::members(hierarchy)),
            value: CellValue::MemberSet(members),
        }
    }

    /// A fixed, materialized tuple set.
    pub fn tuple_set(element: TupleType, tuples: Vec<TupleValue>) -> Result<Self, TypeError> {
        Ok(Self {
            ty: TypeShape::Set(SetType::of_tuples(element)?),
            value: CellValue::TupleSet(tuples),
        })
    }
}

impl Calc for ConstantCalc {
    fn result_type(&self) -> &TypeShape {
        &self.ty
    }

    fn evaluate(&self, _ev: &Evaluator) -> EvalResult<CellValue> {
        Ok(self.value.clone())
    }
}

impl IntegerCalc for ConstantCalc {}
impl DoubleCalc for ConstantCalc {}
impl BooleanCalc for ConstantCalc {}
impl StringCalc for ConstantCalc {}
impl DateTimeCalc for ConstantCalc {}
impl MemberCalc for ConstantCalc {}
impl TupleCalc for ConstantCalc {}
impl MemberListCalc for ConstantCalc {}
impl MemberIterCalc for ConstantCalc {}
impl TupleListCalc for ConstantCalc {}
impl TupleIterCalc for ConstantCalc {}

/// `<Hierarchy>.CurrentMember`: reads the context's assignment for one
/// hierarchy. Depends on exactly that hierarchy.
#[derive(Debug)]
pub struct CurrentMemberCalc {
    hierarchy: HierarchyId,
    ty: TypeShape,
}

impl CurrentMemberCalc {
    pub fn new(hierarchy: HierarchyId) -> Self {
        Self {
            hierarchy,
            ty: TypeShape::member(hierarchy),
        }
    }
}

impl Calc for CurrentMemberCalc {
    fn result_type(&self) -> &TypeShape {
        &self.ty
    }

    fn depends_on(&self, hierarchy: HierarchyId) -> bool {
        hierarchy == self.hierarchy
    }

    fn evaluate(&self, ev: &Evaluator) -> EvalResult<CellValue> {
        Ok(CellValue::Member(self.evaluate_member(ev)?))
    }
}

impl MemberCalc for CurrentMemberCalc {
    fn evaluate_member(&self, ev: &Evaluator) -> EvalResult<Arc<Member>> {
        ev.current_member(self.hierarchy)
    }
}

/// Evaluates a member expression, re-establishes context from it, and
/// reads the fact cell there.
///
/// Dependency rule: the operand's declared shape pins its hierarchy, so
/// the ambient member of that hierarchy is shadowed; every other
/// hierarchy still feeds the implicit cell read.
#[derive(Debug)]
pub struct MemberValueCalc {
    member: Box<dyn MemberCalc>,
    ty: TypeShape,
}

impl MemberValueCalc {
    pub fn new(member: Box<dyn MemberCalc>) -> Self {
        Self {
            member,
            ty: TypeShape::numeric(),
        }
    }
}

impl Calc for MemberValueCalc {
    fn result_type(&self) -> &TypeShape {
        &self.ty
    }

    fn children(&self) -> Vec<&dyn Calc> {
        vec![self.member.as_ref() as &dyn Calc]
    }

    fn depends_on(&self, hierarchy: HierarchyId) -> bool {
        reads_cell_depends_on(self.member.as_ref(), hierarchy)
    }

    fn evaluate(&self, ev: &Evaluator) -> EvalResult<CellValue> {
        let member = self.member.evaluate_member(ev)?;
        ev.with_member(member, |scoped| Ok(scoped.cells().cell(scoped)))
    }
}

impl DoubleCalc for MemberValueCalc {}
impl IntegerCalc for MemberValueCalc {}

/// Evaluates a tuple expression, re-establishes context from all of its
/// members, and reads the fact cell there. The pinning check applies to
/// every element of the tuple's declared type.
#[derive(Debug)]
pub struct TupleValueCalc {
    tuple: Box<dyn TupleCalc>,
    ty: TypeShape,
}

impl TupleValueCalc {
    pub fn new(tuple: Box<dyn TupleCalc>) -> Self {
        Self {
            tuple,
            ty: TypeShape::numeric(),
        }
    }
}

impl Calc for TupleValueCalc {
    fn result_type(&self) -> &TypeShape {
        &self.ty
    }

    fn children(&self) -> Vec<&dyn Calc> {
        vec![self.tuple.as_ref() as &dyn Calc]
    }

    fn depends_on(&self, hierarchy: HierarchyId) -> bool {
        reads_cell_depends_on(self.tuple.as_ref(), hierarchy)
    }

    fn evaluate(&self, ev: &Evaluator) -> EvalResult<CellValue> {
        let members = self.tuple.evaluate_tuple(ev)?;
        ev.with_members(&members, |scoped| Ok(scoped.cells().cell(scoped)))
    }
}

impl DoubleCalc for TupleValueCalc {}
impl IntegerCalc for TupleValueCalc {}

/// `IsEmpty(<value>)`: true when the operand evaluates to null.
///
/// The emptiness test reads the value of the current measure under
/// whatever context is ambient, so it conservatively depends on *all*
/// hierarchies even though its visible child may not reference them.
#[derive(Debug)]
pub struct IsEmptyCalc {
    value: Box<dyn Calc>,
    ty: TypeShape,
}

impl IsEmptyCalc {
    pub fn new(value: Box<dyn Calc>) -> Self {
        Self {
            value,
            ty: TypeShape::boolean(),
        }
    }
}

impl Calc for IsEmptyCalc {
    fn result_type(&self) -> &TypeShape {
        &self.ty
    }

    fn children(&self) -> Vec<&dyn Calc> {
        vec![self.value.as_ref()]
    }

    fn depends_on(&self, _hierarchy: HierarchyId) -> bool {
        true
    }

    fn evaluate(&self, ev: &Evaluator) -> EvalResult<CellValue> {
        match self.value.evaluate(ev)? {
            CellValue::NotYetAvailable => Ok(CellValue::NotYetAvailable),
            value => Ok(CellValue::Boolean(value.is_null())),
        }
    }
}

impl BooleanCalc for IsEmptyCalc {}

/// `<Member>.Children` through the schema reader.
#[derive(Debug)]
pub struct ChildrenCalc {
    member: Box<dyn MemberCalc>,
    ty: TypeShape,
}

impl ChildrenCalc {
    pub fn new(member: Box<dyn MemberCalc>) -> Self {
        let hierarchy = member.result_type().bound_hierarchy();
        Self {
            member,
            ty: TypeShape::Set(SetType::members(hierarchy)),
        }
    }
}

impl Calc for ChildrenCalc {
    fn result_type(&self) -> &TypeShape {
        &self.ty
    }

    fn children(&self) -> Vec<&dyn Calc> {
        vec![self.member.as_ref() as &dyn Calc]
    }

    fn evaluate(&self, ev: &Evaluator) -> EvalResult<CellValue> {
        Ok(CellValue::MemberSet(self.evaluate_member_list(ev)?))
    }
}

impl MemberListCalc for ChildrenCalc {
    fn evaluate_member_list(&self, ev: &Evaluator) -> EvalResult<Vec<Arc<Member>>> {
        let member = self.member.evaluate_member(ev)?;
        Ok(ev.schema().member_children(&member))
    }
}

impl MemberIterCalc for ChildrenCalc {}

/// `CrossJoin(<set>, <set>)` over two member sets, producing tuples.
///
/// Consults the native provider first when native evaluation is enabled,
/// falling back to interpreted nested loops. Under a non-empty context the
/// interpreted path drops tuples whose fact cell is empty; cells that are
/// not yet fetched are kept provisionally with a recorded miss.
#[derive(Debug)]
pub struct CrossJoinCalc {
    left: Box<dyn MemberListCalc>,
    right: Box<dyn MemberListCalc>,
    ty: TypeShape,
}

impl CrossJoinCalc {
    /// Fails at construction when the two element shapes share a
    /// hierarchy, surfacing the tuple-type invariant at compile time.
    pub fn new(
        left: Box<dyn MemberListCalc>,
        right: Box<dyn MemberListCalc>,
    ) -> Result<Self, TypeError> {
        let left_element = set_element(left.as_ref())?;
        let right_element = set_element(right.as_ref())?;
        let tuple = TupleType::new(vec![left_element, right_element])?;
        let ty = TypeShape::Set(SetType::of_tuples(tuple)?);
        Ok(Self { left, right, ty })
    }
}

fn set_element(calc: &dyn Calc) -> Result<TypeShape, TypeError> {
    match calc.result_type() {
        TypeShape::Set(set) => Ok(set.element().clone()),
        other => Err(TypeError::mismatch("Set", other.to_string())),
    }
}

impl Calc for CrossJoinCalc {
    fn result_type(&self) -> &TypeShape {
        &self.ty
    }

    fn children(&self) -> Vec<&dyn Calc> {
        vec![self.left.as_ref() as &dyn Calc, self.right.as_ref()]
    }

    fn depends_on(&self, hierarchy: HierarchyId) -> bool {
        if any_depends(&self.children(), hierarchy) {
            return true;
        }
        // Non-empty filtering reads fact cells under the ambient context,
        // so every hierarchy the produced tuples do not pin stays a
        // dependency regardless of what the operands declare.
        match &self.ty {
            TypeShape::Set(set) => !set.element().pins_hierarchy(hierarchy),
            _ => true,
        }
    }

    fn evaluate(&self, ev: &Evaluator) -> EvalResult<CellValue> {
        Ok(CellValue::TupleSet(self.evaluate_tuple_list(ev)?))
    }
}

impl TupleListCalc for CrossJoinCalc {
    fn evaluate_tuple_list(&self, ev: &Evaluator) -> EvalResult<Vec<TupleValue>> {
        if ev.native_enabled() {
            if let Some(provider) = ev.state().native() {
                if let Some(native) =
                    provider.native_for("CrossJoin", &self.children(), ev)
                {
                    debug!("CrossJoin: using native evaluator");
                    return native.evaluate_tuples(ev);
                }
            }
        }

        let left = self.left.evaluate_member_list(ev)?;
        let right = self.right.evaluate_member_list(ev)?;
        let mut tuples = Vec::with_capacity(left.len() * right.len());
        for l in &left {
            for r in &right {
                let tuple: TupleValue = smallvec::smallvec![l.clone(), r.clone()];
                if ev.non_empty() {
                    let cell =
                        ev.with_members(&tuple, |scoped| Ok(scoped.cells().cell(scoped)))?;
                    match cell {
                        CellValue::Null => continue,
                        CellValue::NotYetAvailable => ev.note_missing(),
                        _ => {}
                    }
                }
                tuples.push(tuple);
                ev.check_iteration(tuples.len())?;
            }
        }
        Ok(tuples)
    }
}

impl TupleIterCalc for CrossJoinCalc {}
