//! Type model and runtime values for the hypercube evaluation core
//!
//! Two closed enums anchor the whole interpreter boundary:
//!
//! - [`TypeShape`] describes the static result shape of a compiled
//!   expression (scalar kinds, dimensional element kinds, tuple, set).
//!   Shapes are immutable value objects created at compile time and shared
//!   by reference; the tuple constructor enforces the pairwise-distinct
//!   hierarchy invariant.
//! - [`CellValue`] is the runtime value produced by evaluation. Conversions
//!   between shapes are explicit, checked operations returning
//!   [`TypeError`]; there is no untyped object path.
//!
//! Integer- and double-shaped evaluation paths represent "no value" with a
//! reserved sentinel (see [`null`]); the conversions between sentinel and
//! absent value are exact and total in both directions.

pub mod error;
pub mod null;
pub mod shape;
pub mod value;

pub use error::TypeError;
pub use null::{
    DOUBLE_NULL, DOUBLE_NULL_BITS, INT_NULL, double_to_option, int_to_option, is_double_null,
    is_int_null, option_to_double, option_to_int,
};
pub use shape::{ScalarKind, SetType, TupleType, TypeShape};
pub use value::{CellValue, TupleValue};
