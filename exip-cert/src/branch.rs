//! Integrality check of an exact LP optimum.

use crate::problem::{BoundSide, RationalProblem};
use crate::tree::ChildBound;
use exip_core::rational::is_integral;
use num_rational::BigRational;

/// Outcome of the integrality check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchDecision {
    /// Every integer variable has an integral value.
    Integral,
    /// Branch on the first fractional integer variable.
    Branch {
        /// Branching variable
        var: usize,
        /// Its fractional value
        value: BigRational,
        /// Upper bound of the down child, `floor(value)`
        down: BigRational,
        /// Lower bound of the up child, `ceil(value)`
        up: BigRational,
    },
}

impl BranchDecision {
    /// Bound changes of the down and up child, if branching.
    pub fn children(&self) -> Option<(Vec<ChildBound>, Vec<ChildBound>)> {
        match self {
            BranchDecision::Integral => None,
            BranchDecision::Branch { var, down, up, .. } => Some((
                vec![(*var, BoundSide::Upper, down.clone())],
                vec![(*var, BoundSide::Lower, up.clone())],
            )),
        }
    }
}

/// Scan the integer variables in index order for a fractional value.
pub fn check_integrality(problem: &RationalProblem, primal: &[BigRational]) -> BranchDecision {
    let fractional = primal
        .iter()
        .enumerate()
        .find(|(j, v)| problem.is_integer(*j) && !is_integral(v));
    match fractional {
        Some((var, value)) => BranchDecision::Branch {
            var,
            value: value.clone(),
            down: value.floor(),
            up: value.ceil(),
        },
        None => BranchDecision::Integral,
    }
}
