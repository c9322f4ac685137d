//! Exact LP adapter.
//!
//! Owns the single exact-rational LP of a run. The LP is built once from the
//! problem and then only re-bounded: every drained or backtracked bound
//! change is pushed into it through [`ExactLpAdapter::sync_bounds`].
//! Expected non-optimal outcomes come back as [`LpStatus`] values; only
//! genuine solver faults become [`CertError::LpSolve`].

use crate::approx::ApproxLp;
use crate::problem::{BoundScope, RationalProblem};
use exip_core::{CertError, CertResult};
use exip_math::{ExactLp, LpBasis, LpStatus, RationalSimplex, SimplexAlgorithm};
use num_rational::BigRational;
use std::time::{Duration, Instant};

/// Adapter statistics.
#[derive(Debug, Clone, Default)]
pub struct AdapterStats {
    /// Exact solves
    pub solves: u64,
    /// Simplex iterations over all solves
    pub iterations: u64,
    /// Time spent solving
    pub solve_time: Duration,
    /// Column bound updates pushed into the LP
    pub bound_syncs: u64,
    /// Approximate bases loaded
    pub warm_starts: u64,
    /// Approximate bases rejected by the exact LP
    pub rejected_bases: u64,
}

/// Handle to the exact LP of a run.
#[derive(Debug)]
pub struct ExactLpAdapter {
    lp: Box<dyn ExactLp>,
    stats: AdapterStats,
    last_iterations: u64,
    last_solve_time: Duration,
}

impl ExactLpAdapter {
    /// Build the exact LP of a problem over its local bounds.
    ///
    /// Fails with [`CertError::Construction`] only if memory cannot be
    /// reserved.
    pub fn construct(problem: &RationalProblem) -> CertResult<Self> {
        Self::construct_with(problem, Box::new(RationalSimplex::new()), BoundScope::Local)
    }

    /// Build the LP into a given solver, over the bounds of `scope`.
    pub fn construct_with(
        problem: &RationalProblem,
        mut lp: Box<dyn ExactLp>,
        scope: BoundScope,
    ) -> CertResult<Self> {
        let nvars = problem.num_vars();
        let nrows = problem.num_rows();
        lp.reserve(nvars, nrows)
            .map_err(|e| CertError::Construction(e.to_string()))?;
        for (j, obj) in problem.objective().iter().enumerate() {
            lp.add_col(
                obj.clone(),
                problem.finite_lb(scope, j).cloned(),
                problem.finite_ub(scope, j).cloned(),
            )
            .map_err(|e| CertError::Construction(e.to_string()))?;
        }
        for i in 0..nrows {
            lp.add_row(
                problem.row(i),
                problem.finite_lhs(i).cloned(),
                problem.finite_rhs(i).cloned(),
            )
            .map_err(|e| CertError::Construction(e.to_string()))?;
        }
        tracing::debug!(nvars, nrows, ?scope, "constructed exact LP");
        Ok(Self {
            lp,
            stats: AdapterStats::default(),
            last_iterations: 0,
            last_solve_time: Duration::ZERO,
        })
    }

    /// Push the local bounds of `vars` into the LP.
    pub fn sync_bounds(&mut self, problem: &RationalProblem, vars: &[usize]) -> CertResult<()> {
        for &var in vars {
            self.lp.change_bounds(
                var,
                problem.finite_lb(BoundScope::Local, var).cloned(),
                problem.finite_ub(BoundScope::Local, var).cloned(),
            )?;
            self.stats.bound_syncs += 1;
        }
        Ok(())
    }

    fn check_dimensions(&self, approx_rows: usize, approx_cols: usize) -> CertResult<()> {
        let exact_rows = self.lp.num_rows();
        let exact_cols = self.lp.num_cols();
        if approx_rows == exact_rows && approx_cols == exact_cols {
            Ok(())
        } else {
            Err(CertError::DimensionMismatch {
                approx_rows,
                approx_cols,
                exact_rows,
                exact_cols,
            })
        }
    }

    /// Load the approximate basis as a warm start.
    ///
    /// Returns `Ok(false)` if the approximate solver has no basis or the
    /// exact LP rejects it as singular; the previous basis is then kept.
    /// Differing dimensions are reported as [`CertError::DimensionMismatch`].
    pub fn load_approximate_state(&mut self, approx: &dyn ApproxLp) -> CertResult<bool> {
        self.check_dimensions(approx.num_rows(), approx.num_cols())?;
        let Some(basis) = approx.basis() else {
            return Ok(false);
        };
        match self.lp.set_basis(&basis) {
            Ok(()) => {
                self.stats.warm_starts += 1;
                Ok(true)
            }
            Err(err) => {
                tracing::debug!(%err, "exact LP rejected approximate basis");
                self.stats.rejected_bases += 1;
                Ok(false)
            }
        }
    }

    /// Hand the exact basis to the approximate solver.
    pub fn store_approximate_state(&self, approx: &mut dyn ApproxLp) -> CertResult<()> {
        self.check_dimensions(approx.num_rows(), approx.num_cols())?;
        approx.set_basis(&self.lp.basis())
    }

    /// Set the iteration, time and objective limits of following solves.
    pub fn set_limits(
        &mut self,
        iterations: Option<u64>,
        time: Option<Duration>,
        objective: Option<BigRational>,
    ) {
        self.lp.set_iteration_limit(iterations);
        self.lp.set_time_limit(time);
        self.lp.set_objective_limit(objective);
    }

    /// Solve the LP exactly.
    pub fn solve(&mut self, algorithm: SimplexAlgorithm) -> CertResult<LpStatus> {
        let start = Instant::now();
        let status = self.lp.solve(algorithm)?;
        self.last_solve_time = start.elapsed();
        self.last_iterations = self.lp.iterations();
        self.stats.solves += 1;
        self.stats.iterations += self.last_iterations;
        self.stats.solve_time += self.last_solve_time;
        Ok(status)
    }

    /// Iterations and time of the last solve.
    pub fn last_solve(&self) -> (u64, Duration) {
        (self.last_iterations, self.last_solve_time)
    }

    /// Objective value of the current basic solution.
    pub fn objective_value(&mut self) -> CertResult<BigRational> {
        Ok(self.lp.objective_value()?)
    }

    /// Column values of the current basic solution.
    pub fn primal(&mut self) -> CertResult<Vec<BigRational>> {
        Ok(self.lp.primal()?)
    }

    /// Row duals of the current basis.
    pub fn duals(&mut self) -> CertResult<Vec<BigRational>> {
        Ok(self.lp.duals()?)
    }

    /// Whether the current basis is dual feasible.
    pub fn is_dual_feasible(&mut self) -> CertResult<bool> {
        Ok(self.lp.is_dual_feasible()?)
    }

    /// Whether the current basic solution is primal feasible.
    pub fn is_primal_feasible(&mut self) -> CertResult<bool> {
        Ok(self.lp.is_primal_feasible()?)
    }

    /// The current exact basis.
    pub fn basis(&self) -> LpBasis {
        self.lp.basis()
    }

    /// Number of columns of the LP.
    pub fn num_cols(&self) -> usize {
        self.lp.num_cols()
    }

    /// Number of rows of the LP.
    pub fn num_rows(&self) -> usize {
        self.lp.num_rows()
    }

    /// Get statistics.
    pub fn stats(&self) -> &AdapterStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approx::ApproxLpSnapshot;
    use crate::problem::{BoundSide, ObjSense, ProblemBuilder, VarKind};
    use exip_core::rational::rat;

    /// min x + 2y  s.t.  x + y >= 2, x in [0, 3], y in [0, 3]
    fn problem() -> RationalProblem {
        let mut b = ProblemBuilder::new(ObjSense::Minimize);
        let x = b.add_var("x", rat(1), Some(rat(0)), Some(rat(3)), VarKind::Continuous);
        let y = b.add_var("y", rat(2), Some(rat(0)), Some(rat(3)), VarKind::Continuous);
        b.add_row("c", &[(x, rat(1)), (y, rat(1))], Some(rat(2)), None)
            .unwrap();
        b.build().unwrap()
    }

    #[test]
    fn test_construct_and_solve() {
        let problem = problem();
        let mut lp = ExactLpAdapter::construct(&problem).unwrap();
        assert_eq!((lp.num_rows(), lp.num_cols()), (1, 2));
        assert_eq!(lp.solve(SimplexAlgorithm::Primal).unwrap(), LpStatus::Optimal);
        assert_eq!(lp.objective_value().unwrap(), rat(2));
        assert_eq!(lp.stats().solves, 1);
    }

    #[test]
    fn test_sync_bounds_follows_problem() {
        let mut problem = problem();
        let mut lp = ExactLpAdapter::construct(&problem).unwrap();
        lp.solve(SimplexAlgorithm::Primal).unwrap();

        problem.record_bound_change(0, BoundSide::Upper, rat(1)).unwrap();
        let touched = problem.drain_bound_changes();
        lp.sync_bounds(&problem, &touched).unwrap();
        assert_eq!(lp.solve(SimplexAlgorithm::Dual).unwrap(), LpStatus::Optimal);
        // x = 1, y = 1
        assert_eq!(lp.objective_value().unwrap(), rat(3));
    }

    #[test]
    fn test_dimension_mismatch_is_reported() {
        let problem = problem();
        let mut lp = ExactLpAdapter::construct(&problem).unwrap();
        let approx = ApproxLpSnapshot::new(vec![1.0, 0.0], vec![0.0, 0.0]);
        let err = lp.load_approximate_state(&approx).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_state_round_trip() {
        let problem = problem();
        let mut lp = ExactLpAdapter::construct(&problem).unwrap();
        lp.solve(SimplexAlgorithm::Primal).unwrap();
        let mut approx = ApproxLpSnapshot::new(vec![1.0], vec![0.0, 1.0]);
        lp.store_approximate_state(&mut approx).unwrap();
        assert_eq!(approx.basis, Some(lp.basis()));

        let mut fresh = ExactLpAdapter::construct(&problem).unwrap();
        assert!(fresh.load_approximate_state(&approx).unwrap());
        assert_eq!(fresh.solve(SimplexAlgorithm::Dual).unwrap(), LpStatus::Optimal);
        assert_eq!(fresh.last_solve().0, 0);
    }
}
