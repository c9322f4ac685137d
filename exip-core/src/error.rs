//! Error types for exact bound certification.
//!
//! Only genuine faults are errors. Expected non-optimal LP outcomes
//! (infeasible, objective limit, iteration or time limit) are reported as
//! status values by the LP layer, and an unavailable certificate is an
//! ordinary result of a certification call.

use thiserror::Error;

/// Errors raised by the certification layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CertError {
    /// Building the exact LP failed (allocation exhausted).
    #[error("exact LP construction failed: {0}")]
    Construction(String),

    /// The exact LP solver reported an unresolved error.
    #[error("exact LP solve failed: {0}")]
    LpSolve(String),

    /// Approximate and exact LP disagree on their dimensions.
    #[error("dimension mismatch: approximate LP has {approx_rows}x{approx_cols}, exact LP has {exact_rows}x{exact_cols}")]
    DimensionMismatch {
        /// Rows in the approximate LP
        approx_rows: usize,
        /// Columns in the approximate LP
        approx_cols: usize,
        /// Rows in the exact LP
        exact_rows: usize,
        /// Columns in the exact LP
        exact_cols: usize,
    },

    /// Project-and-shift setup failed earlier in this run.
    #[error("project-and-shift data unavailable: {0}")]
    ProjectShiftUnavailable(String),

    /// Sparse factorization failed.
    #[error("factorization failed: {0}")]
    Factorization(String),

    /// A primal value cannot be stored as a floating-point number.
    #[error("value of variable {var} is out of floating-point range: {value}")]
    OutOfRange {
        /// Variable index
        var: usize,
        /// Exact value rendered as a string
        value: String,
    },

    /// An objective value is infinite or cannot be rounded safely.
    #[error("objective value cannot be rounded safely: {0}")]
    UnsafeObjective(String),

    /// The problem data is inconsistent.
    #[error("invalid problem: {0}")]
    InvalidProblem(String),

    /// A variable index is out of range.
    #[error("variable index {0} out of range")]
    InvalidVariable(usize),

    /// A row index is out of range.
    #[error("row index {0} out of range")]
    InvalidRow(usize),

    /// The configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Local bounds were read while bound changes were still pending.
    #[error("{0} bound change(s) pending; drain the bound log first")]
    PendingBoundChanges(usize),

    /// Backtracking targeted a level that does not exist.
    #[error("cannot backtrack to depth {target}, current depth is {current}")]
    InvalidBacktrack {
        /// Requested depth
        target: usize,
        /// Current depth
        current: usize,
    },

    /// I/O failure while printing a solution.
    #[error("I/O error: {0}")]
    Io(String),
}

impl CertError {
    /// Whether callers are expected to recover from this error locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CertError::DimensionMismatch { .. } | CertError::ProjectShiftUnavailable(_)
        )
    }
}

impl From<std::io::Error> for CertError {
    fn from(err: std::io::Error) -> Self {
        CertError::Io(err.to_string())
    }
}

/// Result type for certification operations.
pub type CertResult<T> = Result<T, CertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let mismatch = CertError::DimensionMismatch {
            approx_rows: 1,
            approx_cols: 2,
            exact_rows: 1,
            exact_cols: 3,
        };
        assert!(mismatch.is_recoverable());
        assert!(CertError::ProjectShiftUnavailable("singular".into()).is_recoverable());
        assert!(!CertError::LpSolve("boom".into()).is_recoverable());
        assert!(
            !CertError::OutOfRange {
                var: 0,
                value: "1e400".into()
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_display() {
        let err = CertError::PendingBoundChanges(3);
        assert_eq!(
            err.to_string(),
            "3 bound change(s) pending; drain the bound log first"
        );
    }
}
