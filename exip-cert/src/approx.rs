//! Contract of the approximate (floating-point) LP solver.
//!
//! The certification layer reads the approximate dual solution and basis of
//! the node LP through [`ApproxLp`] and may hand an exact basis back for
//! warm starting. [`ApproxLpSnapshot`] is a plain-data implementation for
//! callers that extract the solution up front.

use exip_core::CertResult;
use exip_math::LpBasis;

/// Read access to the approximate LP solution of the current node.
pub trait ApproxLp {
    /// Number of rows of the approximate LP.
    fn num_rows(&self) -> usize;

    /// Number of columns of the approximate LP.
    fn num_cols(&self) -> usize;

    /// Row dual values.
    fn row_duals(&self) -> &[f64];

    /// Column reduced costs.
    fn reduced_costs(&self) -> &[f64];

    /// Dual ray proving infeasibility, if the LP was found infeasible.
    fn farkas_duals(&self) -> Option<&[f64]> {
        None
    }

    /// Current basis, if the solver exposes one.
    fn basis(&self) -> Option<LpBasis> {
        None
    }

    /// Install a basis for the next approximate solve.
    fn set_basis(&mut self, _basis: &LpBasis) -> CertResult<()> {
        Ok(())
    }

    /// Objective value reported by the approximate solve.
    fn objective_value(&self) -> f64;
}

/// Approximate LP solution held as plain data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApproxLpSnapshot {
    /// Number of rows
    pub nrows: usize,
    /// Number of columns
    pub ncols: usize,
    /// Row duals
    pub duals: Vec<f64>,
    /// Reduced costs
    pub redcosts: Vec<f64>,
    /// Farkas ray for an infeasible LP
    pub farkas: Option<Vec<f64>>,
    /// Basis of the approximate solve
    pub basis: Option<LpBasis>,
    /// Approximate objective value
    pub objective: f64,
}

impl ApproxLpSnapshot {
    /// Snapshot from dual values and reduced costs.
    pub fn new(duals: Vec<f64>, redcosts: Vec<f64>) -> Self {
        Self {
            nrows: duals.len(),
            ncols: redcosts.len(),
            duals,
            redcosts,
            ..Self::default()
        }
    }

    /// Snapshot of an infeasible LP with the given Farkas ray.
    pub fn infeasible(farkas: Vec<f64>, ncols: usize) -> Self {
        Self {
            nrows: farkas.len(),
            ncols,
            duals: vec![0.0; farkas.len()],
            redcosts: vec![0.0; ncols],
            farkas: Some(farkas),
            ..Self::default()
        }
    }

    /// Attach a basis.
    pub fn with_basis(mut self, basis: LpBasis) -> Self {
        self.basis = Some(basis);
        self
    }

    /// Attach the approximate objective value.
    pub fn with_objective(mut self, objective: f64) -> Self {
        self.objective = objective;
        self
    }
}

impl ApproxLp for ApproxLpSnapshot {
    fn num_rows(&self) -> usize {
        self.nrows
    }

    fn num_cols(&self) -> usize {
        self.ncols
    }

    fn row_duals(&self) -> &[f64] {
        &self.duals
    }

    fn reduced_costs(&self) -> &[f64] {
        &self.redcosts
    }

    fn farkas_duals(&self) -> Option<&[f64]> {
        self.farkas.as_deref()
    }

    fn basis(&self) -> Option<LpBasis> {
        self.basis.clone()
    }

    fn set_basis(&mut self, basis: &LpBasis) -> CertResult<()> {
        self.basis = Some(basis.clone());
        Ok(())
    }

    fn objective_value(&self) -> f64 {
        self.objective
    }
}
