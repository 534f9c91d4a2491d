//! Null sentinels for the primitive evaluation paths
//!
//! The integer- and double-shaped `evaluate` paths return unboxed
//! primitives, so "no value" needs an in-band encoding distinct from every
//! representable number (SQL NULL semantics). The sentinel-to-`Option`
//! conversions here are the only sanctioned bridge between the primitive
//! paths and the object-shaped [`CellValue`](crate::CellValue) path; they
//! round-trip exactly for the sentinel and for all ordinary values.

/// Integer "no value" sentinel.
pub const INT_NULL: i64 = i64::MIN;

/// Bit pattern of the double "no value" sentinel: a quiet NaN with a
/// payload no arithmetic operation produces.
pub const DOUBLE_NULL_BITS: u64 = 0x7FF8_0000_0000_00F1;

/// Double "no value" sentinel. Detect it with [`is_double_null`]; an `==`
/// comparison is always false because the sentinel is a NaN.
pub const DOUBLE_NULL: f64 = f64::from_bits(DOUBLE_NULL_BITS);

/// Whether an integer result is the null sentinel.
#[inline]
pub fn is_int_null(value: i64) -> bool {
    value == INT_NULL
}

/// Whether a double result is the null sentinel. Bitwise, so ordinary NaN
/// results stay distinct from null.
#[inline]
pub fn is_double_null(value: f64) -> bool {
    value.to_bits() == DOUBLE_NULL_BITS
}

/// Sentinel to absent value.
#[inline]
pub fn double_to_option(value: f64) -> Option<f64> {
    if is_double_null(value) { None } else { Some(value) }
}

/// Absent value to sentinel.
#[inline]
pub fn option_to_double(value: Option<f64>) -> f64 {
    value.unwrap_or(DOUBLE_NULL)
}

/// Sentinel to absent value.
#[inline]
pub fn int_to_option(value: i64) -> Option<i64> {
    if is_int_null(value) { None } else { Some(value) }
}

/// Absent value to sentinel.
#[inline]
pub fn option_to_int(value: Option<i64>) -> i64 {
    value.unwrap_or(INT_NULL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_round_trips() {
        assert_eq!(option_to_double(double_to_option(DOUBLE_NULL)).to_bits(), DOUBLE_NULL_BITS);
        assert_eq!(option_to_int(int_to_option(INT_NULL)), INT_NULL);
    }

    #[test]
    fn ordinary_nan_is_not_null() {
        assert!(!is_double_null(f64::NAN));
        assert!(is_double_null(DOUBLE_NULL));
    }

    #[test]
    fn ordinary_values_round_trip() {
        for v in [0.0, -0.0, 1.5, f64::MAX, f64::MIN_POSITIVE] {
            assert_eq!(option_to_double(double_to_option(v)), v);
        }
        for v in [0i64, 1, -1, i64::MAX, i64::MIN + 1] {
            assert_eq!(option_to_int(int_to_option(v)), v);
        }
    }
}
