//! Project-and-shift.
//!
//! The approximate duals are split into an extended dual vector `w`. The
//! equality residual `c - D w` is removed by a correction on the basis
//! columns of [`PsData`], which leaves `D w = c` exactly but may make some
//! basis components negative. Those are repaired by moving `w` toward the
//! interior point `w*`: for `lambda` in `[0, 1]`,
//! `(1 - lambda) w + lambda w*` still satisfies the equalities, and the
//! smallest `lambda` that clears every negative component is used.

use super::{CertifiedBound, CertifyOutcome, ExtendedLayout, check_dimensions};
use crate::approx::ApproxLp;
use crate::problem::{BoundScope, RationalProblem};
use crate::psdata::PsData;
use exip_core::{CertResult, CertifyConfig, DualBoundMethod, PsShift};
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Shift coefficient toward the interior point, zero if `w` is non-negative.
fn shift_coefficient(ps: &PsData, w: &[BigRational], shift: PsShift) -> Result<BigRational, String> {
    let negative: Vec<usize> = (0..w.len()).filter(|&k| w[k].is_negative()).collect();
    if negative.is_empty() {
        return Ok(BigRational::zero());
    }
    let interior = ps.interior();
    if let Some(&k) = negative.iter().find(|&&k| !ps.is_included(k)) {
        return Err(format!("negative component {k} outside the included columns"));
    }
    Ok(match shift {
        PsShift::PerComponent => negative
            .iter()
            .map(|&k| -&w[k] / (&interior[k] - &w[k]))
            .max()
            .unwrap_or_else(BigRational::zero),
        PsShift::Global => {
            let min = negative
                .iter()
                .map(|&k| &w[k])
                .min()
                .cloned()
                .unwrap_or_else(BigRational::zero);
            let slack = ps.common_slack();
            // lambda_1 = slack / (slack - min), lambda_2 = 1 - lambda_1
            BigRational::one() - slack / (slack - min)
        }
    })
}

/// Exactly dual feasible extended vector built from the approximate duals.
pub fn project(
    problem: &RationalProblem,
    ps: &PsData,
    approx: &dyn ApproxLp,
    config: &CertifyConfig,
) -> Result<Vec<BigRational>, String> {
    check_dimensions(problem, approx).map_err(|e| e.to_string())?;
    let layout = ps.layout();
    if *layout != ExtendedLayout::new(problem) {
        return Err("project-and-shift data belongs to another problem".into());
    }
    let mut w = layout
        .split(
            problem,
            approx.row_duals(),
            approx.reduced_costs(),
            BoundScope::Local,
        )
        .ok_or("approximate duals are not finite")?;

    let residual = layout.residual(problem, &w);
    if residual.iter().any(|r| !r.is_zero()) {
        let correction = ps
            .factor()
            .solve(&residual)
            .map_err(|e| format!("projection failed: {e}"))?;
        for (k, z) in ps.basis().iter().zip(correction) {
            w[*k] += z;
        }
    }

    let lambda = shift_coefficient(ps, &w, config.ps_shift)?;
    if lambda.is_positive() {
        tracing::debug!(%lambda, "shifting toward interior point");
        let keep = BigRational::one() - &lambda;
        for (wk, ik) in w.iter_mut().zip(ps.interior()) {
            *wk = &keep * &*wk + &lambda * ik;
        }
    }

    if config.ps_cancel_pairs {
        layout.cancel_pairs(&mut w);
    }
    Ok(w)
}

/// Certify a lower bound by project-and-shift.
pub fn certify(
    problem: &RationalProblem,
    ps: &PsData,
    approx: &dyn ApproxLp,
    config: &CertifyConfig,
) -> CertResult<CertifyOutcome> {
    problem.ensure_drained()?;
    check_dimensions(problem, approx)?;
    let w = match project(problem, ps, approx, config) {
        Ok(w) => w,
        Err(reason) => return Ok(CertifyOutcome::Unavailable(reason)),
    };
    Ok(match ps.layout().objective(problem, &w, BoundScope::Local) {
        Some(value) => {
            tracing::debug!(%value, "project-and-shift bound");
            CertifyOutcome::Bound(CertifiedBound::new(value, DualBoundMethod::ProjectShift))
        }
        None => CertifyOutcome::unavailable("dual uses an infinite side"),
    })
}

/// Project-and-shift has no interior point for Farkas rays.
pub fn certify_infeasible(
    _problem: &RationalProblem,
    _ps: &PsData,
    _approx: &dyn ApproxLp,
) -> CertResult<CertifyOutcome> {
    Ok(CertifyOutcome::unavailable(
        "project-and-shift does not prove infeasibility",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approx::ApproxLpSnapshot;
    use crate::problem::{ObjSense, ProblemBuilder, VarKind};
    use exip_core::rational::rat;

    /// min x  s.t.  x = 1, x free
    fn equality() -> RationalProblem {
        let mut b = ProblemBuilder::new(ObjSense::Minimize);
        let x = b.add_var("x", rat(1), None, None, VarKind::Continuous);
        b.add_row("e", &[(x, rat(1))], Some(rat(1)), Some(rat(1))).unwrap();
        b.build().unwrap()
    }

    /// min x + 2y  s.t.  x + y >= 2, x, y in [0, 3]
    fn covering() -> RationalProblem {
        let mut b = ProblemBuilder::new(ObjSense::Minimize);
        let x = b.add_var("x", rat(1), Some(rat(0)), Some(rat(3)), VarKind::Continuous);
        let y = b.add_var("y", rat(2), Some(rat(0)), Some(rat(3)), VarKind::Continuous);
        b.add_row("c", &[(x, rat(1)), (y, rat(1))], Some(rat(2)), None)
            .unwrap();
        b.build().unwrap()
    }

    #[test]
    fn test_projection_repairs_rounded_dual() {
        let problem = equality();
        let config = CertifyConfig::default();
        let ps = PsData::build(&problem, &config).unwrap();
        let approx = ApproxLpSnapshot::new(vec![0.9999999], vec![0.0]);
        let outcome = certify(&problem, &ps, &approx, &config).unwrap();
        assert_eq!(outcome.bound().unwrap().value, rat(1));
    }

    #[test]
    fn test_projected_vector_is_dual_feasible() {
        let problem = covering();
        let config = CertifyConfig::default();
        let ps = PsData::build(&problem, &config).unwrap();
        let approx = ApproxLpSnapshot::new(vec![1.3], vec![-0.3, 0.7]);
        let w = project(&problem, &ps, &approx, &config).unwrap();
        let layout = ps.layout();
        assert!(layout.residual(&problem, &w).iter().all(|r| r.is_zero()));
        assert!(w.iter().all(|wk| !wk.is_negative()));
        let bound = layout.objective(&problem, &w, BoundScope::Local).unwrap();
        assert!(bound <= rat(2));
    }

    #[test]
    fn test_global_shift_is_sound() {
        let problem = covering();
        let config = CertifyConfig {
            ps_shift: PsShift::Global,
            ps_cancel_pairs: false,
            ..CertifyConfig::default()
        };
        let ps = PsData::build(&problem, &config).unwrap();
        // y = 5/2 leaves residual (-3/2, -1/2); the lb dual of x turns negative
        let approx = ApproxLpSnapshot::new(vec![2.5], vec![0.0, 0.0]);
        let w = project(&problem, &ps, &approx, &config).unwrap();
        assert!(w.iter().all(|wk| !wk.is_negative()));
        let outcome = certify(&problem, &ps, &approx, &config).unwrap();
        assert!(outcome.bound().unwrap().value <= rat(2));
    }

    #[test]
    fn test_exact_dual_is_kept() {
        let problem = covering();
        let config = CertifyConfig::default();
        let ps = PsData::build(&problem, &config).unwrap();
        let approx = ApproxLpSnapshot::new(vec![1.0], vec![0.0, 1.0]);
        let outcome = certify(&problem, &ps, &approx, &config).unwrap();
        assert_eq!(outcome.bound().unwrap().value, rat(2));
    }

    #[test]
    fn test_projection_rejects_extra_duals() {
        let problem = equality();
        let config = CertifyConfig::default();
        let ps = PsData::build(&problem, &config).unwrap();
        let approx = ApproxLpSnapshot {
            duals: vec![1.0, 0.5],
            ..ApproxLpSnapshot::new(vec![1.0], vec![0.0])
        };
        assert!(project(&problem, &ps, &approx, &config).is_err());
    }

    #[test]
    fn test_never_proves_infeasibility() {
        let problem = equality();
        let ps = PsData::build(&problem, &CertifyConfig::default()).unwrap();
        let approx = ApproxLpSnapshot::infeasible(vec![1.0], 1);
        assert!(!certify_infeasible(&problem, &ps, &approx).unwrap().is_success());
    }
}
