//! Runtime result values
//!
//! [`CellValue`] is the closed value enum at the interpreter boundary.
//! Every cross-shape conversion is an explicit `Result`-returning
//! operation; the only silent coercions are the defined ones: integer
//! widening to double, `Null` to the primitive sentinels, and a member
//! standing in for a 1-tuple.
//!
//! `NotYetAvailable` is a transient "fact data not fetched yet" marker. It
//! is a value, not an error: a node observing it from a child must
//! propagate it (or record a miss and return a provisional result), never
//! treat it as empty.

use crate::error::TypeError;
use crate::null::{DOUBLE_NULL, INT_NULL};
use crate::shape::{ScalarKind, TypeShape};
use chrono::{DateTime, Utc};
use hypercube_model::{Dimension, Hierarchy, Level, Member};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// A tuple of members from distinct hierarchies. Tuples are short; four
/// inline slots cover the common cases without allocation.
pub type TupleValue = SmallVec<[Arc<Member>; 4]>;

/// Runtime value of one evaluated expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CellValue {
    /// Absent value
    Null,
    /// Integer scalar
    Integer(i64),
    /// Double scalar
    Double(f64),
    /// Boolean scalar
    Boolean(bool),
    /// String scalar
    String(String),
    /// Date/time scalar
    DateTime(DateTime<Utc>),
    /// A member
    Member(Arc<Member>),
    /// A level
    Level(Arc<Level>),
    /// A hierarchy
    Hierarchy(Arc<Hierarchy>),
    /// A dimension
    Dimension(Arc<Dimension>),
    /// A tuple of members
    Tuple(TupleValue),
    /// A materialized set of members
    MemberSet(Vec<Arc<Member>>),
    /// A materialized set of tuples
    TupleSet(Vec<TupleValue>),
    /// No result (statements evaluated for effect)
    Void,
    /// Underlying fact data has not been fetched yet
    NotYetAvailable,
}

impl CellValue {
    /// Short shape name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Integer(_) => "Integer",
            Self::Double(_) => "Double",
            Self::Boolean(_) => "Boolean",
            Self::String(_) => "String",
            Self::DateTime(_) => "DateTime",
            Self::Member(_) => "Member",
            Self::Level(_) => "Level",
            Self::Hierarchy(_) => "Hierarchy",
            Self::Dimension(_) => "Dimension",
            Self::Tuple(_) => "Tuple",
            Self::MemberSet(_) => "MemberSet",
            Self::TupleSet(_) => "TupleSet",
            Self::Void => "Void",
            Self::NotYetAvailable => "NotYetAvailable",
        }
    }

    /// Whether this is the absent value
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this is the transient not-yet-available sentinel
    pub fn is_not_yet_available(&self) -> bool {
        matches!(self, Self::NotYetAvailable)
    }

    /// Wrap an optional double, mapping absence to `Null` and the sentinel
    /// to `Null` as well (the sentinel never escapes on the object path).
    pub fn from_double(value: f64) -> Self {
        if crate::null::is_double_null(value) {
            Self::Null
        } else {
            Self::Double(value)
        }
    }

    /// Wrap an optional integer, mapping the sentinel to `Null`.
    pub fn from_integer(value: i64) -> Self {
        if crate::null::is_int_null(value) {
            Self::Null
        } else {
            Self::Integer(value)
        }
    }

    /// Convert to the integer path representation.
    ///
    /// `Null` becomes [`INT_NULL`]; anything non-integer is an error.
    pub fn into_integer(self) -> Result<i64, TypeError> {
        match self {
            Self::Integer(v) => Ok(v),
            Self::Null => Ok(INT_NULL),
            other => Err(TypeError::mismatch("Integer", other.kind())),
        }
    }

    /// Convert to the double path representation.
    ///
    /// Integers widen; `Null` becomes [`DOUBLE_NULL`].
    pub fn into_double(self) -> Result<f64, TypeError> {
        match self {
            Self::Double(v) => Ok(v),
            Self::Integer(v) => Ok(v as f64),
            Self::Null => Ok(DOUBLE_NULL),
            other => Err(TypeError::mismatch("Double", other.kind())),
        }
    }

    /// Convert to a boolean. `Null` is false, matching the emptiness-test
    /// semantics of the boolean evaluation path.
    pub fn into_boolean(self) -> Result<bool, TypeError> {
        match self {
            Self::Boolean(v) => Ok(v),
            Self::Null => Ok(false),
            other => Err(TypeError::mismatch("Boolean", other.kind())),
        }
    }

    /// Convert to an optional string
    pub fn into_string(self) -> Result<Option<String>, TypeError> {
        match self {
            Self::String(v) => Ok(Some(v)),
            Self::Null => Ok(None),
            other => Err(TypeError::mismatch("String", other.kind())),
        }
    }

    /// Convert to an optional date/time
    pub fn into_datetime(self) -> Result<Option<DateTime<Utc>>, TypeError> {
        match self {
            Self::DateTime(v) => Ok(Some(v)),
            Self::Null => Ok(None),
            other => Err(TypeError::mismatch("DateTime", other.kind())),
        }
    }

    /// Convert to a member
    pub fn into_member(self) -> Result<Arc<Member>, TypeError> {
        match self {
            Self::Member(m) => Ok(m),
            other => Err(TypeError::mismatch("Member", other.kind())),
        }
    }

    /// Convert to a level
    pub fn into_level(self) -> Result<Arc<Level>, TypeError> {
        match self {
            Self::Level(l) => Ok(l),
            other => Err(TypeError::mismatch("Level", other.kind())),
        }
    }

    /// Convert to a hierarchy
    pub fn into_hierarchy(self) -> Result<Arc<Hierarchy>, TypeError> {
        match self {
            Self::Hierarchy(h) => Ok(h),
            other => Err(TypeError::mismatch("Hierarchy", other.kind())),
        }
    }

    /// Convert to a dimension
    pub fn into_dimension(self) -> Result<Arc<Dimension>, TypeError> {
        match self {
            Self::Dimension(d) => Ok(d),
            other => Err(TypeError::mismatch("Dimension", other.kind())),
        }
    }

    /// Convert to a tuple. A member converts to its 1-tuple.
    pub fn into_tuple(self) -> Result<TupleValue, TypeError> {
        match self {
            Self::Tuple(t) => Ok(t),
            Self::Member(m) => Ok(smallvec::smallvec![m]),
            other => Err(TypeError::mismatch("Tuple", other.kind())),
        }
    }

    /// Convert to a materialized member set
    pub fn into_member_set(self) -> Result<Vec<Arc<Member>>, TypeError> {
        match self {
            Self::MemberSet(s) => Ok(s),
            other => Err(TypeError::mismatch("MemberSet", other.kind())),
        }
    }

    /// Convert to a materialized tuple set
    pub fn into_tuple_set(self) -> Result<Vec<TupleValue>, TypeError> {
        match self {
            Self::TupleSet(s) => Ok(s),
            other => Err(TypeError::mismatch("TupleSet", other.kind())),
        }
    }

    /// The static shape a value of this runtime form would declare, used
    /// by diagnostics only.
    pub fn shape(&self) -> Option<TypeShape> {
        match self {
            Self::Null => Some(TypeShape::Scalar(ScalarKind::Null)),
            Self::Integer(_) => Some(TypeShape::integer()),
            Self::Double(_) => Some(TypeShape::numeric()),
            Self::Boolean(_) => Some(TypeShape::boolean()),
            Self::String(_) => Some(TypeShape::string()),
            Self::DateTime(_) => Some(TypeShape::datetime()),
            Self::Member(m) => Some(TypeShape::member(m.hierarchy)),
            Self::Level(l) => Some(TypeShape::Level {
                hierarchy: Some(l.hierarchy),
            }),
            Self::Hierarchy(h) => Some(TypeShape::Hierarchy {
                dimension: Some(h.dimension),
            }),
            Self::Dimension(_) => Some(TypeShape::Dimension),
            _ => None,
        }
    }
}

/// Bitwise on doubles so the null sentinel and NaN results compare stably;
/// everything else is structural.
impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b || a.to_bits() == b.to_bits(),
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Member(a), Self::Member(b)) => a.id == b.id,
            (Self::Level(a), Self::Level(b)) => a.id == b.id,
            (Self::Hierarchy(a), Self::Hierarchy(b)) => a.id == b.id,
            (Self::Dimension(a), Self::Dimension(b)) => a.id == b.id,
            (Self::Tuple(a), Self::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.id == y.id)
            }
            (Self::MemberSet(a), Self::MemberSet(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.id == y.id)
            }
            (Self::TupleSet(a), Self::TupleSet(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| {
                        x.len() == y.len()
                            && x.iter().zip(y.iter()).all(|(m, n)| m.id == n.id)
                    })
            }
            (Self::Void, Self::Void) => true,
            (Self::NotYetAvailable, Self::NotYetAvailable) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "(null)"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{v}"),
            Self::Member(m) => write!(f, "{}", m.unique_name),
            Self::Level(l) => write!(f, "{}", l.name),
            Self::Hierarchy(h) => write!(f, "{}", h.unique_name()),
            Self::Dimension(d) => write!(f, "{}", d.name),
            Self::Tuple(t) => {
                write!(f, "(")?;
                for (i, m) in t.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", m.unique_name)?;
                }
                write!(f, ")")
            }
            Self::MemberSet(s) => write!(f, "{{{} members}}", s.len()),
            Self::TupleSet(s) => write!(f, "{{{} tuples}}", s.len()),
            Self::Void => write!(f, "(void)"),
            Self::NotYetAvailable => write!(f, "(not yet available)"),
        }
    }
}
