//! Neumaier–Shcherbina bound in interval arithmetic.
//!
//! The same weak duality bound as [`super::exact_ns`], evaluated with
//! directed-rounding intervals instead of rationals. Each exact value is
//! replaced once by its tightest float enclosure ([`IntervalData`]); every
//! operation afterwards rounds outward, so the lower end of the final
//! interval is a valid bound.

use super::{CertifiedBound, CertifyOutcome, check_dimensions};
use crate::approx::ApproxLp;
use crate::problem::{BoundScope, RationalProblem};
use exip_core::interval::add_down;
use exip_core::{CertResult, DualBoundMethod, SafeInterval};
use num_rational::BigRational;

/// Float enclosures of the exact problem data.
///
/// Built once per run; only the local column bounds are read per call.
#[derive(Debug, Clone)]
pub struct IntervalData {
    /// Row-major matrix enclosures, parallel to the problem's rows.
    rows: Vec<Vec<(usize, SafeInterval)>>,
    obj: Vec<SafeInterval>,
    lhs: Vec<SafeInterval>,
    rhs: Vec<SafeInterval>,
}

impl IntervalData {
    /// Enclose the matrix, objective and row sides of a problem.
    pub fn new(problem: &RationalProblem) -> Self {
        let infinity = problem.infinity();
        let rows = (0..problem.num_rows())
            .map(|i| {
                problem
                    .row(i)
                    .iter()
                    .map(|(j, a)| (*j, SafeInterval::from_rational(a)))
                    .collect()
            })
            .collect();
        Self {
            rows,
            obj: problem
                .objective()
                .iter()
                .map(SafeInterval::from_rational)
                .collect(),
            lhs: (0..problem.num_rows())
                .map(|i| SafeInterval::from_bound(problem.lhs(i), infinity))
                .collect(),
            rhs: (0..problem.num_rows())
                .map(|i| SafeInterval::from_bound(problem.rhs(i), infinity))
                .collect(),
        }
    }

    /// Whether the data was built for a problem of this shape.
    pub fn matches(&self, problem: &RationalProblem) -> bool {
        self.rows.len() == problem.num_rows() && self.obj.len() == problem.num_vars()
    }

    /// Lower end of the bound enclosure for dual `duals`.
    ///
    /// With `with_objective` unset the objective is taken as zero. Returns
    /// `-inf` when the bound cannot be made finite.
    pub(crate) fn ns_bound(
        &self,
        problem: &RationalProblem,
        duals: &[f64],
        with_objective: bool,
    ) -> f64 {
        let infinity = problem.infinity();
        let mut redcost: Vec<SafeInterval> = if with_objective {
            self.obj.clone()
        } else {
            vec![SafeInterval::zero(); self.obj.len()]
        };
        let mut bound = 0.0;
        for (i, &y) in duals.iter().enumerate() {
            if y.is_nan() || y.is_infinite() {
                return f64::NEG_INFINITY;
            }
            let side = if y > 0.0 {
                self.lhs[i]
            } else if y < 0.0 {
                self.rhs[i]
            } else {
                continue;
            };
            if side.inf.is_infinite() || side.sup.is_infinite() {
                continue;
            }
            bound = add_down(bound, side.mul_scalar(y).inf);
            for (j, a) in &self.rows[i] {
                redcost[*j] = redcost[*j].sub(a.mul_scalar(y));
            }
        }
        for (j, r) in redcost.iter().enumerate() {
            let lb = SafeInterval::from_bound(&problem.lower_bounds(BoundScope::Local)[j], infinity);
            let ub = SafeInterval::from_bound(&problem.upper_bounds(BoundScope::Local)[j], infinity);
            let range = SafeInterval::new(lb.inf, ub.sup);
            bound = add_down(bound, r.mul(range).inf);
            if bound == f64::NEG_INFINITY {
                return bound;
            }
        }
        bound
    }
}

fn enclosure_to_rational(bound: f64) -> Option<BigRational> {
    if bound.is_finite() {
        BigRational::from_float(bound)
    } else {
        None
    }
}

/// Certify a lower bound from the approximate row duals.
pub fn certify(
    problem: &RationalProblem,
    data: &IntervalData,
    approx: &dyn ApproxLp,
) -> CertResult<CertifyOutcome> {
    problem.ensure_drained()?;
    check_dimensions(problem, approx)?;
    let bound = data.ns_bound(problem, approx.row_duals(), true);
    Ok(match enclosure_to_rational(bound) {
        Some(value) => {
            tracing::debug!(bound, "interval NS bound");
            CertifyOutcome::Bound(CertifiedBound::new(value, DualBoundMethod::IntervalNs))
        }
        None => CertifyOutcome::unavailable("interval bound is not finite"),
    })
}

/// Prove infeasibility from the approximate Farkas ray.
pub fn certify_infeasible(
    problem: &RationalProblem,
    data: &IntervalData,
    approx: &dyn ApproxLp,
) -> CertResult<CertifyOutcome> {
    problem.ensure_drained()?;
    check_dimensions(problem, approx)?;
    let Some(ray) = approx.farkas_duals() else {
        return Ok(CertifyOutcome::unavailable("no Farkas ray"));
    };
    if ray.len() != problem.num_rows() {
        return Ok(CertifyOutcome::unavailable("Farkas ray has the wrong length"));
    }
    let bound = data.ns_bound(problem, ray, false);
    Ok(if bound > 0.0 {
        CertifyOutcome::Infeasible
    } else {
        CertifyOutcome::Unavailable(format!("Farkas bound {bound} is not positive"))
    })
}
