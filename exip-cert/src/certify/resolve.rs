//! Exact resolve-and-verify.
//!
//! The approximate basis is loaded into the exact LP. In
//! [`ResolveMode::Verify`] it is only checked: a basis that is dual feasible
//! in exact arithmetic has an exact objective that bounds the node LP from
//! below. In [`ResolveMode::Resolve`] the exact dual simplex is warm started
//! from it and run to optimality, subject to the configured limits.

use super::{CertifiedBound, CertifyOutcome};
use crate::adapter::ExactLpAdapter;
use crate::approx::ApproxLp;
use crate::problem::RationalProblem;
use exip_core::{CertResult, CertifyConfig, CertifyObserver, DualBoundMethod, ResolveMode};
use exip_math::{LpStatus, SimplexAlgorithm};

fn solve(
    adapter: &mut ExactLpAdapter,
    approx: &mut dyn ApproxLp,
    config: &CertifyConfig,
    observer: &mut dyn CertifyObserver,
) -> CertResult<LpStatus> {
    adapter.set_limits(config.resolve_iteration_limit, config.lp_time_limit(), None);
    let status = adapter.solve(SimplexAlgorithm::Dual)?;
    let (iterations, elapsed) = adapter.last_solve();
    observer.on_exact_solve(iterations, elapsed);
    tracing::debug!(?status, iterations, "exact resolve");
    if let Err(err) = adapter.store_approximate_state(approx) {
        tracing::debug!(%err, "could not hand exact basis back");
    }
    Ok(status)
}

/// Certify a lower bound with the exact LP.
pub fn certify(
    problem: &RationalProblem,
    adapter: &mut ExactLpAdapter,
    approx: &mut dyn ApproxLp,
    config: &CertifyConfig,
    observer: &mut dyn CertifyObserver,
) -> CertResult<CertifyOutcome> {
    problem.ensure_drained()?;
    let loaded = adapter.load_approximate_state(approx)?;
    match config.resolve_mode {
        ResolveMode::Verify => {
            if !loaded {
                return Ok(CertifyOutcome::unavailable("no approximate basis to verify"));
            }
            if !adapter.is_dual_feasible()? {
                tracing::debug!("approximate basis is not dual feasible in exact arithmetic");
                return Ok(CertifyOutcome::unavailable("basis is not dual feasible"));
            }
            let value = adapter.objective_value()?;
            Ok(CertifyOutcome::Bound(CertifiedBound::new(
                value,
                DualBoundMethod::ExactResolve,
            )))
        }
        ResolveMode::Resolve => Ok(match solve(adapter, approx, config, observer)? {
            LpStatus::Optimal => CertifyOutcome::Bound(CertifiedBound::new(
                adapter.objective_value()?,
                DualBoundMethod::ExactResolve,
            )),
            LpStatus::Infeasible => CertifyOutcome::Infeasible,
            status => CertifyOutcome::Unavailable(format!("exact solve ended with {status:?}")),
        }),
    }
}

/// Prove infeasibility by an exact solve.
pub fn certify_infeasible(
    problem: &RationalProblem,
    adapter: &mut ExactLpAdapter,
    approx: &mut dyn ApproxLp,
    config: &CertifyConfig,
    observer: &mut dyn CertifyObserver,
) -> CertResult<CertifyOutcome> {
    problem.ensure_drained()?;
    adapter.load_approximate_state(approx)?;
    Ok(match solve(adapter, approx, config, observer)? {
        LpStatus::Infeasible => CertifyOutcome::Infeasible,
        status => CertifyOutcome::Unavailable(format!("exact solve ended with {status:?}")),
    })
}
