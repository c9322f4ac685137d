//! Exact rational linear programming.
//!
//! The [`ExactLp`] trait is the contract the certification layer consumes
//! from an exact-rational LP solver. [`RationalSimplex`] implements it with a
//! dense-tableau bounded simplex over [`BigRational`].
//!
//! The LP is `min c^T x` subject to `lhs <= A x <= rhs` and
//! `lb <= x <= ub`, where any side may be infinite (`None`).

pub mod simplex;

pub use simplex::{RationalSimplex, SimplexStats};

use exip_core::CertError;
use num_rational::BigRational;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the exact LP solver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LpError {
    /// Memory for the LP could not be reserved.
    #[error("allocation failed: {0}")]
    Allocation(String),
    /// A column or row index is out of range.
    #[error("index {index} out of range (size {size})")]
    InvalidIndex {
        /// Offending index
        index: usize,
        /// Current size
        size: usize,
    },
    /// A basis has the wrong shape or number of basic entries.
    #[error("invalid basis: {0}")]
    InvalidBasis(String),
    /// The basis matrix is singular.
    #[error("basis matrix is singular")]
    SingularBasis,
    /// Lower bound above upper bound.
    #[error("inconsistent bounds on variable {0}")]
    InconsistentBounds(usize),
    /// An internal invariant of the simplex was violated.
    #[error("internal simplex error: {0}")]
    Internal(String),
}

impl From<LpError> for CertError {
    fn from(err: LpError) -> Self {
        match err {
            LpError::Allocation(msg) => CertError::Construction(msg),
            other => CertError::LpSolve(other.to_string()),
        }
    }
}

/// Outcome of an exact LP solve.
///
/// Every variant is an expected result, not a fault; faults are [`LpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LpStatus {
    /// Optimal basis found.
    Optimal,
    /// The LP is primal infeasible.
    Infeasible,
    /// The LP is unbounded.
    Unbounded,
    /// The dual objective reached the objective limit.
    ObjLimitExceeded,
    /// The iteration limit was reached.
    IterLimit,
    /// The time limit was reached.
    TimeLimit,
}

impl LpStatus {
    /// Whether the solve ended at an optimal basis.
    pub fn is_optimal(self) -> bool {
        self == LpStatus::Optimal
    }

    /// Whether the solve stopped on a limit.
    pub fn is_limit(self) -> bool {
        matches!(self, LpStatus::IterLimit | LpStatus::TimeLimit)
    }
}

/// Simplex variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SimplexAlgorithm {
    /// Primal simplex (two phases).
    #[default]
    Primal,
    /// Dual simplex; falls back to primal when the basis is not dual feasible.
    Dual,
}

/// Position of a column or row in a basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasisStatus {
    /// In the basis.
    Basic,
    /// Nonbasic at its lower bound.
    AtLower,
    /// Nonbasic at its upper bound.
    AtUpper,
    /// Nonbasic free variable at zero.
    Zero,
}

/// A simplex basis for warm starting.
///
/// For rows, the status refers to the row activity `A_i x`: `AtLower` means
/// the activity sits at the left-hand side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LpBasis {
    /// Status of each column.
    pub cols: Vec<BasisStatus>,
    /// Status of each row.
    pub rows: Vec<BasisStatus>,
}

impl LpBasis {
    /// Slack basis: every row basic, columns at a finite bound.
    pub fn slack(ncols: usize, nrows: usize) -> Self {
        Self {
            cols: vec![BasisStatus::AtLower; ncols],
            rows: vec![BasisStatus::Basic; nrows],
        }
    }

    /// Number of basic entries.
    pub fn num_basic(&self) -> usize {
        self.cols
            .iter()
            .chain(&self.rows)
            .filter(|s| **s == BasisStatus::Basic)
            .count()
    }
}

/// Contract of an exact-rational LP solver.
pub trait ExactLp: std::fmt::Debug {
    /// Number of columns.
    fn num_cols(&self) -> usize;

    /// Number of rows.
    fn num_rows(&self) -> usize;

    /// Reserve room for additional columns and rows.
    fn reserve(&mut self, cols: usize, rows: usize) -> Result<(), LpError>;

    /// Append a column with objective coefficient and bounds; returns its index.
    fn add_col(
        &mut self,
        obj: BigRational,
        lb: Option<BigRational>,
        ub: Option<BigRational>,
    ) -> Result<usize, LpError>;

    /// Append a row `lhs <= sum entries <= rhs`; returns its index.
    fn add_row(
        &mut self,
        entries: &[(usize, BigRational)],
        lhs: Option<BigRational>,
        rhs: Option<BigRational>,
    ) -> Result<usize, LpError>;

    /// Change the bounds of a column.
    fn change_bounds(
        &mut self,
        col: usize,
        lb: Option<BigRational>,
        ub: Option<BigRational>,
    ) -> Result<(), LpError>;

    /// Limit the simplex iterations of each solve.
    fn set_iteration_limit(&mut self, limit: Option<u64>);

    /// Limit the wall-clock time of each solve.
    fn set_time_limit(&mut self, limit: Option<Duration>);

    /// Stop the dual simplex once the objective reaches this value.
    fn set_objective_limit(&mut self, limit: Option<BigRational>);

    /// Run the simplex.
    fn solve(&mut self, algorithm: SimplexAlgorithm) -> Result<LpStatus, LpError>;

    /// Objective value of the current basic solution.
    fn objective_value(&mut self) -> Result<BigRational, LpError>;

    /// Column values of the current basic solution.
    fn primal(&mut self) -> Result<Vec<BigRational>, LpError>;

    /// Row duals of the current basis.
    fn duals(&mut self) -> Result<Vec<BigRational>, LpError>;

    /// Column reduced costs of the current basis.
    fn reduced_costs(&mut self) -> Result<Vec<BigRational>, LpError>;

    /// Whether the current basic solution satisfies all bounds.
    fn is_primal_feasible(&mut self) -> Result<bool, LpError>;

    /// Whether the current basis is dual feasible.
    fn is_dual_feasible(&mut self) -> Result<bool, LpError>;

    /// The current basis.
    fn basis(&self) -> LpBasis;

    /// Install a basis; a singular basis is rejected and the old one kept.
    fn set_basis(&mut self, basis: &LpBasis) -> Result<(), LpError>;

    /// Iterations of the last solve.
    fn iterations(&self) -> u64;
}
