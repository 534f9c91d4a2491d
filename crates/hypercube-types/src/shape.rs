//! Static result shapes of compiled expressions
//!
//! A [`TypeShape`] is fixed when the compiler builds a node and never
//! changes across evaluations. Shapes double as the input to dependency
//! analysis: a member-shaped type with a known hierarchy *pins* that
//! hierarchy, shadowing whatever the ambient context would supply.

use crate::error::TypeError;
use hypercube_model::{DimensionId, HierarchyId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar result kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    /// 64-bit integer (null encoded as [`INT_NULL`](crate::INT_NULL))
    Integer,
    /// IEEE double (null encoded as [`DOUBLE_NULL`](crate::DOUBLE_NULL))
    Numeric,
    /// Unicode string
    String,
    /// Boolean
    Boolean,
    /// Date/time instant
    DateTime,
    /// Interned symbolic constant (e.g. sort-direction keywords)
    Symbol,
    /// The null literal's own type
    Null,
    /// Opaque geometry value produced by user-defined spatial functions
    Geometry,
}

/// The static result shape of a compiled expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeShape {
    /// A scalar of the given kind
    Scalar(ScalarKind),
    /// A member, optionally of a statically known hierarchy
    Member { hierarchy: Option<HierarchyId> },
    /// A level, optionally of a statically known hierarchy
    Level { hierarchy: Option<HierarchyId> },
    /// A hierarchy, optionally of a statically known dimension
    Hierarchy { dimension: Option<DimensionId> },
    /// A dimension
    Dimension,
    /// A fixed-arity combination of members from distinct hierarchies
    Tuple(TupleType),
    /// An ordered collection of members or tuples
    Set(SetType),
}

impl TypeShape {
    /// Integer scalar shape
    pub fn integer() -> Self {
        Self::Scalar(ScalarKind::Integer)
    }

    /// Numeric (double) scalar shape
    pub fn numeric() -> Self {
        Self::Scalar(ScalarKind::Numeric)
    }

    /// String scalar shape
    pub fn string() -> Self {
        Self::Scalar(ScalarKind::String)
    }

    /// Boolean scalar shape
    pub fn boolean() -> Self {
        Self::Scalar(ScalarKind::Boolean)
    }

    /// DateTime scalar shape
    pub fn datetime() -> Self {
        Self::Scalar(ScalarKind::DateTime)
    }

    /// Member shape with a known hierarchy
    pub fn member(hierarchy: HierarchyId) -> Self {
        Self::Member {
            hierarchy: Some(hierarchy),
        }
    }

    /// Member shape with an unknown hierarchy
    pub fn any_member() -> Self {
        Self::Member { hierarchy: None }
    }

    /// Whether this shape is scalar
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Whether this shape is a set
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// The hierarchy this shape statically binds, if any
    pub fn bound_hierarchy(&self) -> Option<HierarchyId> {
        match self {
            Self::Member { hierarchy } | Self::Level { hierarchy } => *hierarchy,
            _ => None,
        }
    }

    /// Whether this shape statically and unconditionally fixes the current
    /// member of `hierarchy`, shadowing the ambient context.
    ///
    /// Only member-valued shapes pin: a level or hierarchy reference does
    /// not determine a member. A tuple pins every hierarchy one of its
    /// elements pins.
    pub fn pins_hierarchy(&self, hierarchy: HierarchyId) -> bool {
        match self {
            Self::Member { hierarchy: Some(h) } => *h == hierarchy,
            Self::Tuple(tuple) => tuple
                .elements()
                .iter()
                .any(|e| e.pins_hierarchy(hierarchy)),
            _ => false,
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind:?}"),
            Self::Member { hierarchy: Some(h) } => write!(f, "Member<{h}>"),
            Self::Member { hierarchy: None } => write!(f, "Member"),
            Self::Level { hierarchy: Some(h) } => write!(f, "Level<{h}>"),
            Self::Level { hierarchy: None } => write!(f, "Level"),
            Self::Hierarchy { dimension: Some(d) } => write!(f, "Hierarchy<{d}>"),
            Self::Hierarchy { dimension: None } => write!(f, "Hierarchy"),
            Self::Dimension => write!(f, "Dimension"),
            Self::Tuple(tuple) => {
                write!(f, "(")?;
                for (i, element) in tuple.elements().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, ")")
            }
            Self::Set(set) => write!(f, "Set<{}>", set.element()),
        }
    }
}

/// A tuple type: ordered element shapes over pairwise-distinct hierarchies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupleType {
    elements: Vec<TypeShape>,
}

impl TupleType {
    /// Build a tuple type, rejecting duplicate hierarchies among the
    /// element shapes. Elements with a statically unknown hierarchy are
    /// accepted; the check applies to the hierarchies that are known.
    pub fn new(elements: Vec<TypeShape>) -> Result<Self, TypeError> {
        if elements.is_empty() {
            return Err(TypeError::EmptyTuple);
        }
        let mut seen: Vec<HierarchyId> = Vec::with_capacity(elements.len());
        for element in &elements {
            if let Some(hierarchy) = element.bound_hierarchy() {
                if seen.contains(&hierarchy) {
                    return Err(TypeError::DuplicateHierarchyInTuple { hierarchy });
                }
                seen.push(hierarchy);
            }
        }
        Ok(Self { elements })
    }

    /// Element shapes in order
    pub fn elements(&self) -> &[TypeShape] {
        &self.elements
    }

    /// Number of elements
    pub fn arity(&self) -> usize {
        self.elements.len()
    }
}

/// A set type: element shape plus arity. Arity 1 sets carry members,
/// arity > 1 sets carry tuples; the two never mix within one set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetType {
    element: Box<TypeShape>,
    arity: usize,
}

impl SetType {
    /// A set of members of an optionally known hierarchy
    pub fn members(hierarchy: Option<HierarchyId>) -> Self {
        Self {
            element: Box::new(TypeShape::Member { hierarchy }),
            arity: 1,
        }
    }

    /// A set of members
    pub fn of_members(element: TypeShape) -> Result<Self, TypeError> {
        match element {
            TypeShape::Member { .. } => Ok(Self {
                element: Box::new(element),
                arity: 1,
            }),
            other => Err(TypeError::NotAMemberElement {
                found: other.to_string(),
            }),
        }
    }

    /// A set of tuples of arity >= 2
    pub fn of_tuples(element: TupleType) -> Result<Self, TypeError> {
        let arity = element.arity();
        if arity < 2 {
            return Err(TypeError::TupleSetArity { arity });
        }
        Ok(Self {
            element: Box::new(TypeShape::Tuple(element)),
            arity,
        })
    }

    /// Element shape
    pub fn element(&self) -> &TypeShape {
        &self.element
    }

    /// Set arity (1 for member sets)
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Whether this set carries tuples
    pub fn is_tuple_set(&self) -> bool {
        self.arity > 1
    }
}
