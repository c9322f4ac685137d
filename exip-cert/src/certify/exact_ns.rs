//! Neumaier–Shcherbina bound in exact arithmetic.
//!
//! For any row dual `y`, weak duality gives
//!
//! ```text
//! c^T x = y^T A x + r^T x >= sum_i y_i b_i + sum_j min(r_j lb_j, r_j ub_j)
//! ```
//!
//! with `r = c - A^T y` and `b_i` the side of row `i` selected by the sign of
//! `y_i`. The approximate duals are read as exact rationals, `r` is formed
//! exactly, and the whole violation of the dual equalities is absorbed by
//! the bound duals. No factorization is needed.

use super::{CertifiedBound, CertifyOutcome, check_dimensions};
use crate::approx::ApproxLp;
use crate::problem::{BoundScope, RationalProblem};
use exip_core::rational::from_f64;
use exip_core::{CertResult, DualBoundMethod};
use num_rational::BigRational;
use num_traits::{Signed, Zero};

/// Exact bound for dual `y` and cost vector `costs`.
///
/// Duals whose needed row side is infinite are dropped. Fails if a dual is
/// not finite or if a nonzero reduced cost needs an infinite column bound.
pub(crate) fn ns_bound(
    problem: &RationalProblem,
    duals: &[f64],
    costs: &[BigRational],
) -> Result<BigRational, String> {
    let mut bound = BigRational::zero();
    let mut redcost = costs.to_vec();
    for (i, &value) in duals.iter().enumerate() {
        let y = from_f64(value).ok_or_else(|| format!("dual of row {i} is not finite"))?;
        let side = if y.is_positive() {
            problem.finite_lhs(i)
        } else if y.is_negative() {
            problem.finite_rhs(i)
        } else {
            continue;
        };
        let Some(side) = side else {
            continue;
        };
        bound += &y * side;
        for (j, a) in problem.row(i) {
            redcost[*j] -= a * &y;
        }
    }
    for (j, r) in redcost.iter().enumerate() {
        let side = if r.is_positive() {
            problem.finite_lb(BoundScope::Local, j)
        } else if r.is_negative() {
            problem.finite_ub(BoundScope::Local, j)
        } else {
            continue;
        };
        let Some(side) = side else {
            return Err(format!(
                "reduced cost of {} needs an infinite bound",
                problem.var_name(j)
            ));
        };
        bound += r * side;
    }
    Ok(bound)
}

/// Certify a lower bound from the approximate row duals.
pub fn certify(problem: &RationalProblem, approx: &dyn ApproxLp) -> CertResult<CertifyOutcome> {
    problem.ensure_drained()?;
    check_dimensions(problem, approx)?;
    Ok(match ns_bound(problem, approx.row_duals(), problem.objective()) {
        Ok(value) => {
            tracing::debug!(%value, "exact NS bound");
            CertifyOutcome::Bound(CertifiedBound::new(value, DualBoundMethod::ExactNs))
        }
        Err(reason) => CertifyOutcome::Unavailable(reason),
    })
}

/// Prove infeasibility from the approximate Farkas ray.
///
/// With a zero objective every feasible point has value zero, so a
/// strictly positive bound proves that none exists.
pub fn certify_infeasible(
    problem: &RationalProblem,
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
    let zero = vec![BigRational::zero(); problem.num_vars()];
    Ok(match ns_bound(problem, ray, &zero) {
        Ok(value) if value.is_positive() => CertifyOutcome::Infeasible,
        Ok(value) => CertifyOutcome::Unavailable(format!("Farkas bound {value} is not positive")),
        Err(reason) => CertifyOutcome::Unavailable(reason),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approx::ApproxLpSnapshot;
    use crate::problem::{BoundSide, ObjSense, ProblemBuilder, VarKind};
    use exip_core::rational::{rat, ratio};

    /// min x + y  s.t.  x + y >= 2, x, y in [0, 10]
    fn problem() -> RationalProblem {
        let mut b = ProblemBuilder::new(ObjSense::Minimize);
        let x = b.add_var("x", rat(1), Some(rat(0)), Some(rat(10)), VarKind::Continuous);
        let y = b.add_var("y", rat(1), Some(rat(0)), Some(rat(10)), VarKind::Continuous);
        b.add_row("c", &[(x, rat(1)), (y, rat(1))], Some(rat(2)), None)
            .unwrap();
        b.build().unwrap()
    }

    #[test]
    fn test_exact_dual_gives_optimum() {
        let problem = problem();
        let approx = ApproxLpSnapshot::new(vec![1.0], vec![0.0, 0.0]);
        let outcome = certify(&problem, &approx).unwrap();
        assert_eq!(outcome.bound().unwrap().value, rat(2));
    }

    #[test]
    fn test_perturbed_dual_is_repaired() {
        let problem = problem();
        // y = 0.5 leaves r = (1/2, 1/2) on the lower bounds 0
        let approx = ApproxLpSnapshot::new(vec![0.5], vec![0.5, 0.5]);
        let outcome = certify(&problem, &approx).unwrap();
        assert_eq!(outcome.bound().unwrap().value, rat(1));

        // y = 1.5 overshoots: r = (-1/2, -1/2) at the upper bounds 10
        let approx = ApproxLpSnapshot::new(vec![1.5], vec![0.0, 0.0]);
        let outcome = certify(&problem, &approx).unwrap();
        assert_eq!(outcome.bound().unwrap().value, rat(3) - rat(10));
    }

    #[test]
    fn test_infinite_needed_bound_is_unavailable() {
        let mut b = ProblemBuilder::new(ObjSense::Minimize);
        let x = b.add_var("x", rat(1), None, None, VarKind::Continuous);
        b.add_row("c", &[(x, rat(1))], Some(rat(1)), Some(rat(1))).unwrap();
        let problem = b.build().unwrap();
        let approx = ApproxLpSnapshot::new(vec![0.9999999], vec![0.0]);
        assert!(!certify(&problem, &approx).unwrap().is_success());
    }

    #[test]
    fn test_uses_local_bounds() {
        let mut problem = problem();
        problem
            .record_bound_change(0, BoundSide::Lower, ratio(3, 2))
            .unwrap();
        let approx = ApproxLpSnapshot::new(vec![0.0], vec![1.0, 1.0]);
        assert!(certify(&problem, &approx).is_err());
        problem.drain_bound_changes();
        let outcome = certify(&problem, &approx).unwrap();
        assert_eq!(outcome.bound().unwrap().value, ratio(3, 2));
    }

    #[test]
    fn test_farkas_ray_proves_infeasibility() {
        // x + y >= 2 with x, y in [0, 10] tightened to [0, 0]
        let mut problem = problem();
        problem.record_bound_change(0, BoundSide::Upper, rat(0)).unwrap();
        problem.record_bound_change(1, BoundSide::Upper, rat(0)).unwrap();
        problem.drain_bound_changes();
        let approx = ApproxLpSnapshot::infeasible(vec![1.0], 2);
        assert_eq!(
            certify_infeasible(&problem, &approx).unwrap(),
            CertifyOutcome::Infeasible
        );

        let wrong = ApproxLpSnapshot::infeasible(vec![-1.0], 2);
        assert!(!certify_infeasible(&problem, &wrong).unwrap().is_success());
    }
}
