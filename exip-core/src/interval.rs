//! Directed-rounding interval arithmetic over `f64`.
//!
//! Every operation returns an interval guaranteed to contain the exact real
//! result. Rounding is directed per endpoint: the exact rounding error of
//! each sum and product is recovered with error-free transformations
//! (TwoSum and a fused multiply-add for products), and an endpoint is moved
//! one ulp outward only when the rounded result lies on the wrong side.
//!
//! Products follow the bound-arithmetic convention `0 * inf = 0`, so a zero
//! coefficient never turns an infinite bound into NaN.
//!
//! ## References
//!
//! - Moore: "Interval Analysis" (1966)
//! - Ogita, Rump, Oishi: "Accurate Sum and Dot Product" (2005)

use crate::rational::{RationalInfinity, to_f64_down, to_f64_up};
use num_rational::BigRational;

/// Products below this magnitude may lose bits to underflow, so their
/// rounding error cannot be recovered exactly.
const UNDERFLOW_GUARD: f64 = 1e-290;

/// A closed interval `[inf, sup]` of reals with float endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeInterval {
    /// Lower endpoint.
    pub inf: f64,
    /// Upper endpoint.
    pub sup: f64,
}

impl SafeInterval {
    /// Create the point interval `[v, v]`.
    pub fn point(v: f64) -> Self {
        Self { inf: v, sup: v }
    }

    /// Create the interval `[inf, sup]`.
    pub fn new(inf: f64, sup: f64) -> Self {
        debug_assert!(inf <= sup || inf.is_nan() || sup.is_nan());
        Self { inf, sup }
    }

    /// The zero interval.
    pub fn zero() -> Self {
        Self::point(0.0)
    }

    /// The whole real line.
    pub fn entire() -> Self {
        Self {
            inf: f64::NEG_INFINITY,
            sup: f64::INFINITY,
        }
    }

    /// Tightest interval enclosing an exact rational.
    pub fn from_rational(value: &BigRational) -> Self {
        Self {
            inf: to_f64_down(value),
            sup: to_f64_up(value),
        }
    }

    /// Enclosure of a bound value; sentinel values become true infinities.
    pub fn from_bound(value: &BigRational, infinity: &RationalInfinity) -> Self {
        if infinity.is_pos_inf(value) {
            Self::point(f64::INFINITY)
        } else if infinity.is_neg_inf(value) {
            Self::point(f64::NEG_INFINITY)
        } else {
            Self::from_rational(value)
        }
    }

    /// Whether this is `(-inf, +inf)`.
    pub fn is_entire(&self) -> bool {
        self.inf == f64::NEG_INFINITY && self.sup == f64::INFINITY
    }

    /// Whether `v` lies in the interval.
    pub fn contains(&self, v: f64) -> bool {
        self.inf <= v && v <= self.sup
    }

    /// Negation `-[a, b] = [-b, -a]`.
    pub fn neg(self) -> Self {
        Self {
            inf: -self.sup,
            sup: -self.inf,
        }
    }

    /// Interval sum.
    pub fn add(self, other: Self) -> Self {
        Self {
            inf: add_down(self.inf, other.inf),
            sup: add_up(self.sup, other.sup),
        }
    }

    /// Interval difference.
    pub fn sub(self, other: Self) -> Self {
        self.add(other.neg())
    }

    /// Interval product.
    pub fn mul(self, other: Self) -> Self {
        let pairs = [
            (self.inf, other.inf),
            (self.inf, other.sup),
            (self.sup, other.inf),
            (self.sup, other.sup),
        ];
        let inf = pairs
            .iter()
            .map(|&(a, b)| mul_down(a, b))
            .fold(f64::INFINITY, f64::min);
        let sup = pairs
            .iter()
            .map(|&(a, b)| mul_up(a, b))
            .fold(f64::NEG_INFINITY, f64::max);
        Self { inf, sup }
    }

    /// Product with a float scalar.
    pub fn mul_scalar(self, scalar: f64) -> Self {
        self.mul(Self::point(scalar))
    }

    /// Enclosure of `sum_i xs[i] * ys[i]` for float weights and interval factors.
    pub fn scalar_product(xs: &[f64], ys: &[SafeInterval]) -> Self {
        xs.iter()
            .zip(ys)
            .fold(Self::zero(), |acc, (&x, &y)| acc.add(y.mul_scalar(x)))
    }
}

impl Default for SafeInterval {
    fn default() -> Self {
        Self::zero()
    }
}

/// Rounding error of `s = fl(a + b)`, i.e. `(a + b) - s` exactly (TwoSum).
fn two_sum_err(a: f64, b: f64, s: f64) -> f64 {
    let bb = s - a;
    (a - (s - bb)) + (b - bb)
}

/// `a + b` rounded toward negative infinity.
pub fn add_down(a: f64, b: f64) -> f64 {
    let s = a + b;
    if s.is_nan() {
        return f64::NEG_INFINITY;
    }
    if s.is_infinite() {
        if s > 0.0 && a.is_finite() && b.is_finite() {
            return f64::MAX;
        }
        return s;
    }
    if two_sum_err(a, b, s) < 0.0 {
        s.next_down()
    } else {
        s
    }
}

/// `a + b` rounded toward positive infinity.
pub fn add_up(a: f64, b: f64) -> f64 {
    -add_down(-a, -b)
}

/// `a * b` rounded toward negative infinity, with `0 * inf = 0`.
pub fn mul_down(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 {
        return 0.0;
    }
    let p = a * b;
    if p.is_nan() {
        return f64::NEG_INFINITY;
    }
    if p.is_infinite() {
        if p > 0.0 && a.is_finite() && b.is_finite() {
            return f64::MAX;
        }
        return p;
    }
    if p.abs() < UNDERFLOW_GUARD {
        return p.next_down();
    }
    if a.mul_add(b, -p) < 0.0 {
        p.next_down()
    } else {
        p
    }
}

/// `a * b` rounded toward positive infinity, with `0 * inf = 0`.
pub fn mul_up(a: f64, b: f64) -> f64 {
    -mul_down(-a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::{from_f64, ratio};
    use num_traits::Zero;
    use proptest::prelude::*;

    #[test]
    fn test_sum_of_tenths_is_enclosed() {
        let tenth = SafeInterval::from_rational(&ratio(1, 10));
        let mut acc = SafeInterval::zero();
        for _ in 0..10 {
            acc = acc.add(tenth);
        }
        assert!(acc.contains(1.0));
        assert!(acc.inf < acc.sup);
    }

    #[test]
    fn test_exact_operations_stay_points() {
        let a = SafeInterval::point(1.5);
        let b = SafeInterval::point(2.0);
        assert_eq!(a.add(b), SafeInterval::point(3.5));
        assert_eq!(a.mul(b), SafeInterval::point(3.0));
    }

    #[test]
    fn test_zero_times_infinity_is_zero() {
        assert_eq!(mul_down(0.0, f64::INFINITY), 0.0);
        assert_eq!(mul_up(f64::NEG_INFINITY, 0.0), 0.0);
        let unbounded = SafeInterval::new(0.0, f64::INFINITY);
        let prod = unbounded.mul_scalar(0.0);
        assert_eq!(prod, SafeInterval::zero());
    }

    #[test]
    fn test_overflow_saturates_outward() {
        assert_eq!(add_down(f64::MAX, f64::MAX), f64::MAX);
        assert_eq!(add_up(f64::MAX, f64::MAX), f64::INFINITY);
        assert_eq!(mul_down(-f64::MAX, 2.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_mixed_sign_product() {
        let x = SafeInterval::new(-2.0, 3.0);
        let y = SafeInterval::new(-1.0, 4.0);
        let p = x.mul(y);
        assert_eq!(p.inf, -8.0);
        assert_eq!(p.sup, 12.0);
    }

    #[test]
    fn test_bound_sentinels() {
        let inf = RationalInfinity::default();
        let big = inf.pos().clone();
        assert_eq!(SafeInterval::from_bound(&big, &inf).inf, f64::INFINITY);
        assert!(SafeInterval::entire().is_entire());
    }

    proptest! {
        #[test]
        fn add_encloses_exact_sum(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let exact = from_f64(a).unwrap() + from_f64(b).unwrap();
            let lo = from_f64(add_down(a, b)).unwrap();
            let hi = from_f64(add_up(a, b)).unwrap();
            prop_assert!(lo <= exact && exact <= hi);
        }

        #[test]
        fn mul_encloses_exact_product(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let exact = from_f64(a).unwrap() * from_f64(b).unwrap();
            let lo = from_f64(mul_down(a, b)).unwrap();
            let hi = from_f64(mul_up(a, b)).unwrap();
            prop_assert!(lo <= exact && exact <= hi);
            if exact.is_zero() {
                prop_assert_eq!(mul_down(a, b), 0.0);
            }
        }
    }
}
