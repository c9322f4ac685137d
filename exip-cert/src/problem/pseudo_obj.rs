//! Pseudo-objective cache.
//!
//! The pseudo-objective is `sum_j c_j * b_j` where `b_j` is the local bound
//! minimizing the term: the lower bound for `c_j > 0` and the upper bound for
//! `c_j < 0`. Terms whose bound is infinite are counted separately; the value
//! is finite only when that count is zero.

use exip_core::RationalInfinity;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

/// Contribution of a single variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contribution {
    /// Finite term `c_j * b_j`
    Finite(BigRational),
    /// The bound needed by the term is infinite
    Infinite,
}

impl Contribution {
    /// Contribution of a variable with objective `obj` and local bounds.
    pub fn of(
        obj: &BigRational,
        lb: &BigRational,
        ub: &BigRational,
        infinity: &RationalInfinity,
    ) -> Self {
        if obj.is_zero() {
            return Contribution::Finite(BigRational::zero());
        }
        let bound = if obj.is_positive() { lb } else { ub };
        if infinity.is_infinite(bound) {
            Contribution::Infinite
        } else {
            Contribution::Finite(obj * bound)
        }
    }
}

/// Incrementally maintained pseudo-objective.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PseudoObjective {
    finite_sum: BigRational,
    infinite: usize,
}

impl PseudoObjective {
    /// Compute the pseudo-objective from scratch.
    pub fn compute(
        obj: &[BigRational],
        lb: &[BigRational],
        ub: &[BigRational],
        infinity: &RationalInfinity,
    ) -> Self {
        let mut pseudo = Self::default();
        for ((c, l), u) in obj.iter().zip(lb).zip(ub) {
            pseudo.add(&Contribution::of(c, l, u, infinity));
        }
        pseudo
    }

    fn add(&mut self, term: &Contribution) {
        match term {
            Contribution::Finite(v) => self.finite_sum += v,
            Contribution::Infinite => self.infinite += 1,
        }
    }

    fn remove(&mut self, term: &Contribution) {
        match term {
            Contribution::Finite(v) => self.finite_sum -= v,
            Contribution::Infinite => self.infinite -= 1,
        }
    }

    /// Replace the old contribution of a variable with its new one.
    pub fn update(&mut self, old: &Contribution, new: &Contribution) {
        self.remove(old);
        self.add(new);
    }

    /// Sum of the finite terms.
    pub fn finite_sum(&self) -> &BigRational {
        &self.finite_sum
    }

    /// Number of terms with an infinite bound.
    pub fn infinite_count(&self) -> usize {
        self.infinite
    }

    /// The pseudo-objective, if finite.
    pub fn value(&self) -> Option<&BigRational> {
        (self.infinite == 0).then_some(&self.finite_sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exip_core::rational::rat;

    fn inf() -> RationalInfinity {
        RationalInfinity::new(1e20).unwrap()
    }

    #[test]
    fn test_contribution_picks_minimizing_bound() {
        let infinity = inf();
        assert_eq!(
            Contribution::of(&rat(3), &rat(1), &rat(5), &infinity),
            Contribution::Finite(rat(3))
        );
        assert_eq!(
            Contribution::of(&rat(-2), &rat(1), &rat(5), &infinity),
            Contribution::Finite(rat(-10))
        );
        assert_eq!(
            Contribution::of(&rat(-2), &rat(1), infinity.pos(), &infinity),
            Contribution::Infinite
        );
        assert_eq!(
            Contribution::of(&rat(0), infinity.neg(), infinity.pos(), &infinity),
            Contribution::Finite(rat(0))
        );
    }

    #[test]
    fn test_update_tracks_infinite_terms() {
        let infinity = inf();
        let obj = vec![rat(1), rat(-1)];
        let lb = vec![rat(0), rat(0)];
        let ub = vec![rat(4), infinity.pos().clone()];
        let mut pseudo = PseudoObjective::compute(&obj, &lb, &ub, &infinity);
        assert_eq!(pseudo.infinite_count(), 1);
        assert_eq!(pseudo.value(), None);

        let old = Contribution::of(&obj[1], &lb[1], &ub[1], &infinity);
        let new = Contribution::of(&obj[1], &lb[1], &rat(6), &infinity);
        pseudo.update(&old, &new);
        assert_eq!(pseudo.value(), Some(&rat(-6)));
    }
}
