//! Property-based tests for the exact simplex
//!
//! This module tests:
//! - Primal feasibility of optimal solutions
//! - Strong duality in exact arithmetic
//! - Agreement of the primal and dual variants

use exip_math::lp::{ExactLp, LpStatus, RationalSimplex, SimplexAlgorithm};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use proptest::prelude::*;

/// Helper to create rational
fn rat(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

/// Row sides: 0 = `<=`, 1 = `>=`, 2 = ranged
#[derive(Debug, Clone)]
struct RowSpec {
    coefs: Vec<i64>,
    kind: u8,
    side: i64,
}

fn row_strategy(ncols: usize) -> impl Strategy<Value = RowSpec> {
    (
        prop::collection::vec(-4i64..5, ncols),
        0u8..3,
        -6i64..7,
    )
        .prop_map(|(coefs, kind, side)| RowSpec { coefs, kind, side })
}

fn lp_strategy() -> impl Strategy<Value = (Vec<i64>, Vec<RowSpec>)> {
    (1usize..4).prop_flat_map(|n| {
        (
            prop::collection::vec(-5i64..6, n),
            prop::collection::vec(row_strategy(n), 1..4),
        )
    })
}

/// Build `min c x` over the box `[-5, 5]^n`.
fn build(obj: &[i64], rows: &[RowSpec]) -> RationalSimplex {
    let mut lp = RationalSimplex::new();
    for &c in obj {
        lp.add_col(rat(c), Some(rat(-5)), Some(rat(5))).unwrap();
    }
    for row in rows {
        let entries: Vec<(usize, BigRational)> = row
            .coefs
            .iter()
            .enumerate()
            .map(|(j, &a)| (j, rat(a)))
            .collect();
        let (lhs, rhs) = match row.kind {
            0 => (None, Some(rat(row.side))),
            1 => (Some(rat(row.side)), None),
            _ => (Some(rat(row.side)), Some(rat(row.side + 3))),
        };
        lp.add_row(&entries, lhs, rhs).unwrap();
    }
    lp
}

#[cfg(test)]
mod simplex_duality_properties {
    use super::*;

    proptest! {
        /// Optimal solutions satisfy every row and bound
        #[test]
        fn optimal_solution_is_feasible((obj, rows) in lp_strategy()) {
            let mut lp = build(&obj, &rows);
            let status = lp.solve(SimplexAlgorithm::Primal).unwrap();
            prop_assert!(status == LpStatus::Optimal || status == LpStatus::Infeasible);
            if status == LpStatus::Optimal {
                let x = lp.primal().unwrap();
                for xj in &x {
                    prop_assert!(xj >= &rat(-5) && xj <= &rat(5));
                }
                for row in &rows {
                    let act: BigRational = row
                        .coefs
                        .iter()
                        .zip(&x)
                        .map(|(&a, xj)| rat(a) * xj)
                        .fold(BigRational::zero(), |s, v| s + v);
                    match row.kind {
                        0 => prop_assert!(act <= rat(row.side)),
                        1 => prop_assert!(act >= rat(row.side)),
                        _ => prop_assert!(act >= rat(row.side) && act <= rat(row.side + 3)),
                    }
                }
            }
        }

        /// The exact duals prove the optimal objective
        #[test]
        fn duals_close_the_gap((obj, rows) in lp_strategy()) {
            let mut lp = build(&obj, &rows);
            if lp.solve(SimplexAlgorithm::Primal).unwrap() != LpStatus::Optimal {
                return Ok(());
            }
            let y = lp.duals().unwrap();
            let r = lp.reduced_costs().unwrap();
            let mut bound = BigRational::zero();
            for (row, yi) in rows.iter().zip(&y) {
                if yi.is_positive() {
                    prop_assert!(row.kind != 0, "positive dual on a <= row");
                    bound += yi * rat(row.side);
                } else if yi.is_negative() {
                    prop_assert!(row.kind != 1, "negative dual on a >= row");
                    let rhs = if row.kind == 0 { row.side } else { row.side + 3 };
                    bound += yi * rat(rhs);
                }
            }
            for rj in &r {
                if rj.is_positive() {
                    bound += rj * rat(-5);
                } else if rj.is_negative() {
                    bound += rj * rat(5);
                }
            }
            prop_assert_eq!(bound, lp.objective_value().unwrap());
        }

        /// Re-solving with the dual simplex after a bound change matches a cold solve
        #[test]
        fn dual_warm_start_matches_cold((obj, rows) in lp_strategy(), ub in -2i64..3) {
            let mut warm = build(&obj, &rows);
            if warm.solve(SimplexAlgorithm::Primal).unwrap() != LpStatus::Optimal {
                return Ok(());
            }
            warm.change_bounds(0, Some(rat(-5)), Some(rat(ub))).unwrap();
            let warm_status = warm.solve(SimplexAlgorithm::Dual).unwrap();

            let mut cold = build(&obj, &rows);
            cold.change_bounds(0, Some(rat(-5)), Some(rat(ub))).unwrap();
            let cold_status = cold.solve(SimplexAlgorithm::Primal).unwrap();

            prop_assert_eq!(warm_status, cold_status);
            if cold_status == LpStatus::Optimal {
                prop_assert_eq!(warm.objective_value().unwrap(), cold.objective_value().unwrap());
            }
        }
    }
}
