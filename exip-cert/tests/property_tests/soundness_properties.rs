//! Property-based tests for certified bounds
//!
//! Every strategy is run on a perturbed copy of the exact optimal dual and
//! compared with the exact LP optimum, at the root and at a child node.

use exip_cert::certify::project_shift;
use exip_cert::{
    ApproxLpSnapshot, BoundScope, BoundSide, CertificationContext, ExactLpAdapter, NodeBound, ObjSense,
    ProblemBuilder, PsData, RationalProblem, VarKind,
};
use exip_core::rational::{rat, to_f64_nearest};
use exip_core::{CertifyConfig, DualBoundMethod};
use exip_math::{LpStatus, SimplexAlgorithm};
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

/// Row sides: 0 = `<=`, 1 = `>=`, 2 = ranged
#[derive(Debug, Clone)]
struct RowSpec {
    coefs: Vec<i64>,
    kind: u8,
    side: i64,
}

fn row_strategy(ncols: usize) -> impl Strategy<Value = RowSpec> {
    (prop::collection::vec(-4i64..5, ncols), 0u8..3, -6i64..7)
        .prop_map(|(coefs, kind, side)| RowSpec { coefs, kind, side })
}

fn problem_strategy() -> impl Strategy<Value = (Vec<i64>, Vec<RowSpec>)> {
    (1usize..4).prop_flat_map(|n| {
        (
            prop::collection::vec(-5i64..6, n),
            prop::collection::vec(row_strategy(n), 1..4),
        )
    })
}

/// `min c x` over the box `[-5, 5]^n`.
fn build(obj: &[i64], rows: &[RowSpec]) -> RationalProblem {
    let mut b = ProblemBuilder::new(ObjSense::Minimize);
    for (j, &c) in obj.iter().enumerate() {
        b.add_var(format!("x{j}"), rat(c), Some(rat(-5)), Some(rat(5)), VarKind::Continuous);
    }
    for (i, row) in rows.iter().enumerate() {
        let entries: Vec<(usize, BigRational)> = row
            .coefs
            .iter()
            .enumerate()
            .map(|(j, &a)| (j, rat(a)))
            .collect();
        let (lhs, rhs) = match row.kind {
            0 => (None, Some(rat(row.side))),
            1 => (Some(rat(row.side)), None),
            _ => (Some(rat(row.side - 2)), Some(rat(row.side + 2))),
        };
        b.add_row(format!("r{i}"), &entries, lhs, rhs).unwrap();
    }
    b.build().unwrap()
}

/// Exact optimum and an approximate dual solution off by `noise`.
fn approximate(problem: &RationalProblem, noise: f64) -> Option<(BigRational, ApproxLpSnapshot)> {
    let mut lp = ExactLpAdapter::construct(problem).unwrap();
    if lp.solve(SimplexAlgorithm::Dual).unwrap() != LpStatus::Optimal {
        return None;
    }
    let optimum = lp.objective_value().unwrap();
    let duals: Vec<f64> = lp
        .duals()
        .unwrap()
        .iter()
        .map(|y| to_f64_nearest(y) * (1.0 + noise))
        .collect();
    let mut redcosts: Vec<f64> = problem.objective().iter().map(to_f64_nearest).collect();
    for (i, y) in duals.iter().enumerate() {
        for (j, a) in problem.row(i) {
            redcosts[*j] -= to_f64_nearest(a) * y;
        }
    }
    Some((optimum, ApproxLpSnapshot::new(duals, redcosts)))
}

/// Certify with `ctx` and check the bound against `optimum`.
fn assert_sound(
    ctx: &mut CertificationContext,
    problem: &mut RationalProblem,
    approx: &ApproxLpSnapshot,
    optimum: &BigRational,
) -> Result<(), TestCaseError> {
    let mut approx = approx.clone();
    let bound = ctx.certify_bound(problem, &mut approx).unwrap();
    prop_assert!(!matches!(bound, NodeBound::Infeasible { .. }), "feasible problem certified as infeasible");
    if let Some(value) = bound.exact_value() {
        prop_assert!(value <= optimum, "{} > {}", value, optimum);
    }
    Ok(())
}

#[cfg(test)]
mod bound_soundness {
    use super::*;

    const METHODS: [DualBoundMethod; 4] = [
        DualBoundMethod::ExactResolve,
        DualBoundMethod::ProjectShift,
        DualBoundMethod::IntervalNs,
        DualBoundMethod::ExactNs,
    ];

    proptest! {
        /// No strategy reports a bound above the exact optimum
        #[test]
        fn bounds_never_exceed_optimum(
            (obj, rows) in problem_strategy(),
            noise in -1e-6f64..1e-6
        ) {
            let mut problem = build(&obj, &rows);
            let Some((optimum, approx)) = approximate(&problem, noise) else {
                return Ok(());
            };
            for method in METHODS {
                let config = CertifyConfig {
                    fallback: false,
                    ..CertifyConfig::with_method(method)
                };
                let mut ctx = CertificationContext::new(config).unwrap();
                let mut approx = approx.clone();
                let bound = ctx.certify_bound(&mut problem, &mut approx).unwrap();
                prop_assert!(!matches!(bound, NodeBound::Infeasible { .. }), "feasible problem certified as infeasible");
                if let Some(value) = bound.exact_value() {
                    prop_assert!(value <= &optimum, "{:?}: {} > {}", method, value, optimum);
                }
                if let Some(safe) = bound.safe_lower_bound() {
                    prop_assert!(safe <= to_f64_nearest(&optimum));
                }
            }
        }

        /// Bounds stay valid below the root and again after backtracking
        #[test]
        fn bounds_hold_across_backtracking(
            (obj, rows) in problem_strategy(),
            (var, lower, value) in (0usize..3, any::<bool>(), -5i64..6),
            noise in -1e-6f64..1e-6
        ) {
            let mut problem = build(&obj, &rows);
            let Some((root_optimum, root_approx)) = approximate(&problem, noise) else {
                return Ok(());
            };
            let var = var % obj.len();
            let side = if lower { BoundSide::Lower } else { BoundSide::Upper };
            for method in METHODS {
                let config = CertifyConfig {
                    fallback: false,
                    ..CertifyConfig::with_method(method)
                };
                let mut ctx = CertificationContext::new(config).unwrap();
                assert_sound(&mut ctx, &mut problem, &root_approx, &root_optimum)?;

                ctx.enter_node(&mut problem, 1).unwrap();
                problem.record_bound_change(var, side, rat(value)).unwrap();
                ctx.drain_bound_changes(&mut problem).unwrap();
                if let Some((optimum, approx)) = approximate(&problem, noise) {
                    prop_assert!(optimum >= root_optimum);
                    assert_sound(&mut ctx, &mut problem, &approx, &optimum)?;
                }

                ctx.enter_node(&mut problem, 0).unwrap();
                prop_assert_eq!(problem.depth(), 0);
                prop_assert_eq!(
                    problem.lower_bounds(BoundScope::Local),
                    problem.lower_bounds(BoundScope::Global)
                );
                prop_assert_eq!(
                    problem.upper_bounds(BoundScope::Local),
                    problem.upper_bounds(BoundScope::Global)
                );
                assert_sound(&mut ctx, &mut problem, &root_approx, &root_optimum)?;
            }
        }

        /// The exact re-solve reproduces the optimum
        #[test]
        fn resolve_is_tight((obj, rows) in problem_strategy()) {
            let mut problem = build(&obj, &rows);
            let Some((optimum, mut approx)) = approximate(&problem, 0.0) else {
                return Ok(());
            };
            let config = CertifyConfig::with_method(DualBoundMethod::ExactResolve);
            let mut ctx = CertificationContext::new(config).unwrap();
            let bound = ctx.certify_bound(&mut problem, &mut approx).unwrap();
            prop_assert_eq!(bound.exact_value(), Some(&optimum));
        }

        /// Projected duals satisfy the dual equalities exactly and are nonnegative
        #[test]
        fn projection_is_dual_feasible(
            (obj, rows) in problem_strategy(),
            noise in -1e-3f64..1e-3
        ) {
            let problem = build(&obj, &rows);
            let Some((optimum, approx)) = approximate(&problem, noise) else {
                return Ok(());
            };
            let config = CertifyConfig::default();
            let Ok(ps) = PsData::build(&problem, &config) else {
                return Ok(());
            };
            // the shift may be unable to repair a component outside the basis
            let Ok(w) = project_shift::project(&problem, &ps, &approx, &config) else {
                return Ok(());
            };
            let layout = ps.layout();
            prop_assert!(layout.residual(&problem, &w).iter().all(|r| r.is_zero()));
            prop_assert!(w.iter().all(|wk| !wk.is_negative()));
            if let Some(value) = layout.objective(&problem, &w, BoundScope::Local) {
                prop_assert!(value <= optimum);
            }
        }
    }
}
