//! Property-based tests for the column factorization

use exip_math::lu::{ColumnFactorization, RationalLu};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use proptest::prelude::*;

fn rat(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

fn sparse(col: &[i64]) -> Vec<(usize, BigRational)> {
    col.iter()
        .enumerate()
        .filter(|(_, v)| **v != 0)
        .map(|(i, v)| (i, rat(*v)))
        .collect()
}

#[cfg(test)]
mod lu_solve_properties {
    use super::*;

    proptest! {
        /// A right-hand side built from the basis columns is solved exactly
        #[test]
        fn solve_recovers_combination(
            cols in prop::collection::vec(prop::collection::vec(-3i64..4, 3), 1..6),
            weights in prop::collection::vec(-5i64..6, 6)
        ) {
            let entries: Vec<Vec<(usize, BigRational)>> = cols.iter().map(|c| sparse(c)).collect();
            let lu = RationalLu::factor(
                3,
                entries.iter().enumerate().map(|(id, e)| (id, e.as_slice())),
            ).unwrap();
            prop_assert!(lu.rank() <= 3);

            let mut rhs = vec![BigRational::zero(); 3];
            for (k, &id) in lu.basis().iter().enumerate() {
                for (row, v) in &entries[id] {
                    rhs[*row] += v * rat(weights[k]);
                }
            }
            let x = lu.solve(&rhs).unwrap();
            let mut back = vec![BigRational::zero(); 3];
            for (k, &id) in lu.basis().iter().enumerate() {
                for (row, v) in &entries[id] {
                    back[*row] += v * &x[k];
                }
            }
            prop_assert_eq!(back, rhs);
        }

        /// Every candidate column lies in the span of the accepted ones
        #[test]
        fn basis_spans_all_candidates(
            cols in prop::collection::vec(prop::collection::vec(-3i64..4, 3), 1..6)
        ) {
            let entries: Vec<Vec<(usize, BigRational)>> = cols.iter().map(|c| sparse(c)).collect();
            let lu = RationalLu::factor(
                3,
                entries.iter().enumerate().map(|(id, e)| (id, e.as_slice())),
            ).unwrap();
            for col in &cols {
                let dense: Vec<BigRational> = col.iter().map(|v| rat(*v)).collect();
                prop_assert!(lu.solve(&dense).is_ok());
            }
        }
    }
}
