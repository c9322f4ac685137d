//! Bound certification strategies.
//!
//! Every strategy turns the approximate dual solution of the current node
//! into a lower bound that is correct in exact arithmetic, or reports that
//! it cannot:
//!
//! - [`resolve`]: re-solve (or verify) the node LP exactly from the
//!   approximate basis.
//! - [`project_shift`]: project the approximate dual onto the dual equality
//!   constraints and shift it toward a precomputed interior point.
//! - [`interval_ns`]: Neumaier–Shcherbina bound in directed-rounding
//!   interval arithmetic.
//! - [`exact_ns`]: Neumaier–Shcherbina bound in rational arithmetic.
//!
//! Each module also proves infeasibility from a Farkas ray where it can.

pub mod exact_ns;
pub mod extended;
pub mod interval_ns;
pub mod project_shift;
pub mod resolve;

pub use extended::{ExtColumn, ExtendedLayout};
pub use interval_ns::IntervalData;

use crate::approx::ApproxLp;
use crate::problem::RationalProblem;
use exip_core::rational::to_f64_down;
use exip_core::{CertError, CertResult, DualBoundMethod};
use num_rational::BigRational;
use std::fmt;

/// A lower bound proven in exact arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertifiedBound {
    /// Bound on the internal (minimization) objective.
    pub value: BigRational,
    /// Strategy that produced it.
    pub method: DualBoundMethod,
}

impl CertifiedBound {
    /// Create a bound.
    pub fn new(value: BigRational, method: DualBoundMethod) -> Self {
        Self { value, method }
    }

    /// Largest float not above the bound, safe to hand to the tree.
    pub fn safe_lower(&self) -> f64 {
        to_f64_down(&self.value)
    }
}

impl fmt::Display for CertifiedBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.method.name())
    }
}

/// Result of one certification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertifyOutcome {
    /// A certified lower bound.
    Bound(CertifiedBound),
    /// The node LP is proven infeasible.
    Infeasible,
    /// The strategy could not certify anything; the reason is informational.
    Unavailable(String),
}

impl CertifyOutcome {
    /// Unavailable with a reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Whether a bound or an infeasibility proof was obtained.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Unavailable(_))
    }

    /// The certified bound, if any.
    pub fn bound(&self) -> Option<&CertifiedBound> {
        match self {
            Self::Bound(b) => Some(b),
            _ => None,
        }
    }
}

/// Check that the approximate LP has the shape of the problem.
pub(crate) fn check_dimensions(problem: &RationalProblem, approx: &dyn ApproxLp) -> CertResult<()> {
    let exact_rows = problem.num_rows();
    let exact_cols = problem.num_vars();
    let approx_rows = approx.num_rows();
    let approx_cols = approx.num_cols();
    if approx_rows == exact_rows
        && approx_cols == exact_cols
        && approx.row_duals().len() == exact_rows
        && approx.reduced_costs().len() == exact_cols
    {
        Ok(())
    } else {
        Err(CertError::DimensionMismatch {
            approx_rows,
            approx_cols,
            exact_rows,
            exact_cols,
        })
    }
}
