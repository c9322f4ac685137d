//! ExIP Math - Exact rational linear algebra for certification
//!
//! Numerical collaborators of the certification layer, all in exact
//! [`BigRational`](num_rational::BigRational) arithmetic:
//! - [`lp::ExactLp`], the contract of an exact LP solver, and
//!   [`lp::RationalSimplex`], a bounded primal/dual simplex implementing it
//! - [`lu::ColumnFactorization`] and [`lu::RationalLu`], a column
//!   factorization that extracts a linearly independent column subset
//!
//! # Examples
//!
//! ```
//! use exip_math::lp::{ExactLp, LpStatus, RationalSimplex, SimplexAlgorithm};
//! use num_rational::BigRational;
//!
//! let one = || BigRational::from_integer(1.into());
//! let mut lp = RationalSimplex::new();
//! let x = lp.add_col(one(), Some(BigRational::from_integer(0.into())), None).unwrap();
//! lp.add_row(&[(x, one())], Some(one()), None).unwrap();
//! assert_eq!(lp.solve(SimplexAlgorithm::Primal).unwrap(), LpStatus::Optimal);
//! assert_eq!(lp.objective_value().unwrap(), one());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod lp;
pub mod lu;

pub use lp::{
    BasisStatus, ExactLp, LpBasis, LpError, LpStatus, RationalSimplex, SimplexAlgorithm,
    SimplexStats,
};
pub use lu::{ColumnFactorization, FactorError, RationalLu};
