//! Exact rational helpers.
//!
//! All certification arithmetic runs on [`BigRational`]. This module holds
//! the infinity sentinels used for unbounded sides and the directed
//! conversions between rationals and `f64`.

use crate::error::{CertError, CertResult};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};

/// Create a rational from an integer.
pub fn rat(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

/// Create a rational `num / den`.
///
/// # Panics
/// Panics if `den` is zero.
pub fn ratio(num: i64, den: i64) -> BigRational {
    BigRational::new(BigInt::from(num), BigInt::from(den))
}

/// Convert a finite float to the rational it represents exactly.
///
/// Returns `None` for NaN and infinities.
pub fn from_f64(value: f64) -> Option<BigRational> {
    BigRational::from_float(value)
}

/// Nearest float to `value`, saturating to an infinity of the right sign.
pub fn to_f64_nearest(value: &BigRational) -> f64 {
    match value.to_f64() {
        Some(f) => f,
        None if value.is_negative() => f64::NEG_INFINITY,
        None => f64::INFINITY,
    }
}

/// Largest float not greater than `value`.
pub fn to_f64_down(value: &BigRational) -> f64 {
    let approx = to_f64_nearest(value);
    if approx == f64::INFINITY {
        return f64::MAX;
    }
    match BigRational::from_float(approx) {
        Some(exact) if &exact > value => approx.next_down(),
        _ => approx,
    }
}

/// Smallest float not less than `value`.
pub fn to_f64_up(value: &BigRational) -> f64 {
    let approx = to_f64_nearest(value);
    if approx == f64::NEG_INFINITY {
        return f64::MIN;
    }
    match BigRational::from_float(approx) {
        Some(exact) if &exact < value => approx.next_up(),
        _ => approx,
    }
}

/// Whether `value` is exactly representable as an `f64`.
pub fn is_f64_exact(value: &BigRational) -> bool {
    let approx = to_f64_nearest(value);
    BigRational::from_float(approx).is_some_and(|exact| &exact == value)
}

/// Convert the value of variable `var` for storage as a float.
///
/// Values beyond the float range cannot be stored without silently
/// truncating them and are reported as [`CertError::OutOfRange`].
pub fn to_f64_checked(var: usize, value: &BigRational) -> CertResult<f64> {
    let approx = to_f64_nearest(value);
    if approx.is_finite() {
        Ok(approx)
    } else {
        Err(CertError::OutOfRange {
            var,
            value: value.to_string(),
        })
    }
}

/// Whether `value` is an integer.
pub fn is_integral(value: &BigRational) -> bool {
    value.is_integer()
}

/// Fractional part `value - floor(value)`, always in `[0, 1)`.
pub fn fractional_part(value: &BigRational) -> BigRational {
    value - value.floor()
}

/// Exact dot product of two equally long rational slices.
pub fn dot(a: &[BigRational], b: &[BigRational]) -> BigRational {
    a.iter()
        .zip(b)
        .filter(|(x, y)| !x.is_zero() && !y.is_zero())
        .fold(BigRational::zero(), |acc, (x, y)| acc + x * y)
}

/// Positive and negative infinity sentinels.
///
/// Any value at or beyond a sentinel is treated as infinite, so problem
/// data may carry large magnitudes such as `1e20` in place of a true
/// infinity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RationalInfinity {
    pos: BigRational,
    neg: BigRational,
}

impl RationalInfinity {
    /// Create sentinels at `+magnitude` and `-magnitude`.
    pub fn new(magnitude: f64) -> CertResult<Self> {
        if !(magnitude.is_finite() && magnitude > 0.0) {
            return Err(CertError::InvalidConfig(format!(
                "infinity must be a positive finite number, got {magnitude}"
            )));
        }
        let pos = BigRational::from_float(magnitude)
            .ok_or_else(|| CertError::InvalidConfig(format!("bad infinity {magnitude}")))?;
        let neg = -pos.clone();
        Ok(Self { pos, neg })
    }

    /// The positive sentinel.
    pub fn pos(&self) -> &BigRational {
        &self.pos
    }

    /// The negative sentinel.
    pub fn neg(&self) -> &BigRational {
        &self.neg
    }

    /// Whether `value` is treated as positive infinity.
    pub fn is_pos_inf(&self, value: &BigRational) -> bool {
        value >= &self.pos
    }

    /// Whether `value` is treated as negative infinity.
    pub fn is_neg_inf(&self, value: &BigRational) -> bool {
        value <= &self.neg
    }

    /// Whether `value` is infinite in either direction.
    pub fn is_infinite(&self, value: &BigRational) -> bool {
        self.is_pos_inf(value) || self.is_neg_inf(value)
    }

    /// `Some(value)` if finite, `None` otherwise.
    pub fn finite<'a>(&self, value: &'a BigRational) -> Option<&'a BigRational> {
        if self.is_infinite(value) {
            None
        } else {
            Some(value)
        }
    }

    /// Clamp a value to the sentinel range.
    pub fn normalize(&self, value: BigRational) -> BigRational {
        if self.is_pos_inf(&value) {
            self.pos.clone()
        } else if self.is_neg_inf(&value) {
            self.neg.clone()
        } else {
            value
        }
    }
}

impl Default for RationalInfinity {
    fn default() -> Self {
        Self {
            pos: BigRational::from_integer(BigInt::from(10u64).pow(20)),
            neg: -BigRational::from_integer(BigInt::from(10u64).pow(20)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_directed_conversion_of_third() {
        let third = ratio(1, 3);
        let down = to_f64_down(&third);
        let up = to_f64_up(&third);
        assert!(from_f64(down).unwrap() < third);
        assert!(from_f64(up).unwrap() > third);
        assert_eq!(down.next_up(), up);
    }

    #[test]
    fn test_exact_values_are_not_widened() {
        let half = ratio(1, 2);
        assert_eq!(to_f64_down(&half), 0.5);
        assert_eq!(to_f64_up(&half), 0.5);
        assert!(is_f64_exact(&half));
        assert!(!is_f64_exact(&ratio(1, 10)));
    }

    #[test]
    fn test_out_of_range_value() {
        let huge = BigRational::from_integer(BigInt::from(10).pow(400));
        assert!(matches!(
            to_f64_checked(7, &huge),
            Err(CertError::OutOfRange { var: 7, .. })
        ));
        assert_eq!(to_f64_down(&huge), f64::MAX);
        assert_eq!(to_f64_up(&huge), f64::INFINITY);
        assert_eq!(to_f64_checked(0, &rat(3)), Ok(3.0));
    }

    #[test]
    fn test_infinity_sentinels() {
        let inf = RationalInfinity::default();
        assert!(inf.is_pos_inf(&BigRational::from_float(1e20).unwrap()));
        assert!(inf.is_pos_inf(&BigRational::from_float(1e30).unwrap()));
        assert!(inf.is_neg_inf(&BigRational::from_float(-1e21).unwrap()));
        assert!(!inf.is_infinite(&rat(1_000_000)));
        assert_eq!(inf.finite(&rat(5)), Some(&rat(5)));
        assert!(RationalInfinity::new(-1.0).is_err());
        assert_eq!(RationalInfinity::new(1e20).unwrap(), inf);
    }

    #[test]
    fn test_fractional_part() {
        assert_eq!(fractional_part(&ratio(9, 2)), ratio(1, 2));
        assert_eq!(fractional_part(&ratio(-9, 2)), ratio(1, 2));
        assert!(is_integral(&rat(-4)));
    }

    proptest! {
        #[test]
        fn directed_conversion_brackets_value(num in -1_000_000i64..1_000_000, den in 1i64..10_000) {
            let value = ratio(num, den);
            let down = from_f64(to_f64_down(&value)).unwrap();
            let up = from_f64(to_f64_up(&value)).unwrap();
            prop_assert!(down <= value);
            prop_assert!(value <= up);
        }
    }
}
