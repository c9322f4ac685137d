//! Exact bound tightening on singleton rows.
//!
//! A row `lhs <= a x_j <= rhs` with a single nonzero implies
//! `lhs / a <= x_j <= rhs / a` (sides swapped for `a < 0`). Implied bounds
//! of integer variables are rounded inward. Rows with more than one nonzero
//! are left alone.
//!
//! New bounds are recorded in the problem's bound log; the caller drains
//! them.

use crate::problem::{BoundSide, RationalProblem};
use exip_core::CertResult;
use num_traits::Signed;

/// Outcome of a tightening pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TightenResult {
    /// An implied bound crosses the opposite bound; the node is infeasible.
    Cutoff {
        /// Row implying the bound
        row: usize,
        /// Variable whose domain became empty
        var: usize,
    },
    /// This many bounds were strictly tightened.
    Tightened(usize),
    /// No bound changed.
    Unchanged,
}

/// Statistics about bound tightening.
#[derive(Clone, Debug, Default)]
pub struct TighteningStats {
    /// Singleton rows examined
    pub rows_examined: usize,
    /// Bounds tightened
    pub bounds_tightened: usize,
    /// Cutoffs detected
    pub cutoffs: usize,
}

/// Single-row bound tightener.
#[derive(Debug, Default)]
pub struct BoundTightener {
    stats: TighteningStats,
}

impl BoundTightener {
    /// Create a new bound tightener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tighten with one row.
    pub fn tighten_row(
        &mut self,
        problem: &mut RationalProblem,
        row: usize,
    ) -> CertResult<TightenResult> {
        problem.ensure_drained()?;
        problem.try_row(row)?;
        self.tighten_singleton(problem, row)
    }

    /// Tighten with every singleton row.
    ///
    /// Stops at the first cutoff. Later rows see the bounds implied by
    /// earlier ones.
    pub fn tighten_all(&mut self, problem: &mut RationalProblem) -> CertResult<TightenResult> {
        problem.ensure_drained()?;
        let mut total = 0;
        for row in 0..problem.num_rows() {
            match self.tighten_singleton(problem, row)? {
                TightenResult::Tightened(n) => total += n,
                TightenResult::Unchanged => {}
                cutoff @ TightenResult::Cutoff { .. } => return Ok(cutoff),
            }
        }
        Ok(if total > 0 {
            TightenResult::Tightened(total)
        } else {
            TightenResult::Unchanged
        })
    }

    /// Get statistics.
    pub fn stats(&self) -> &TighteningStats {
        &self.stats
    }

    fn tighten_singleton(
        &mut self,
        problem: &mut RationalProblem,
        row: usize,
    ) -> CertResult<TightenResult> {
        let [(var, coef)] = problem.row(row) else {
            return Ok(TightenResult::Unchanged);
        };
        let var = *var;
        self.stats.rows_examined += 1;
        let lhs = problem.finite_lhs(row).map(|l| l / coef);
        let rhs = problem.finite_rhs(row).map(|r| r / coef);
        let (lower, upper) = if coef.is_positive() { (lhs, rhs) } else { (rhs, lhs) };

        let mut changes = Vec::with_capacity(2);
        for (side, implied) in [(BoundSide::Lower, lower), (BoundSide::Upper, upper)] {
            let Some(mut implied) = implied else {
                continue;
            };
            if problem.is_integer(var) {
                implied = match side {
                    BoundSide::Lower => implied.ceil(),
                    BoundSide::Upper => implied.floor(),
                };
            }
            let current = problem.effective_bound(var, side);
            let stronger = match side {
                BoundSide::Lower => &implied > current,
                BoundSide::Upper => &implied < current,
            };
            if stronger {
                changes.push((side, implied));
            }
        }

        let mut count = 0;
        for (side, value) in changes {
            let opposite = match side {
                BoundSide::Lower => problem.effective_bound(var, BoundSide::Upper),
                BoundSide::Upper => problem.effective_bound(var, BoundSide::Lower),
            };
            let crosses = match side {
                BoundSide::Lower => &value > opposite,
                BoundSide::Upper => &value < opposite,
            };
            if crosses {
                tracing::debug!(row, var, "singleton row empties the domain");
                self.stats.cutoffs += 1;
                return Ok(TightenResult::Cutoff { row, var });
            }
            tracing::trace!(row, var, ?side, %value, "tightened bound");
            problem.record_bound_change(var, side, value)?;
            count += 1;
        }
        self.stats.bounds_tightened += count;
        Ok(if count > 0 {
            TightenResult::Tightened(count)
        } else {
            TightenResult::Unchanged
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ObjSense, ProblemBuilder, VarKind};
    use exip_core::rational::{rat, ratio};

    fn problem(kind: VarKind) -> RationalProblem {
        let mut b = ProblemBuilder::new(ObjSense::Minimize);
        let x = b.add_var("x", rat(1), Some(rat(0)), Some(rat(10)), kind);
        b.add_row("le4", &[(x, rat(1))], None, Some(rat(4))).unwrap();
        b.add_row("ge7", &[(x, rat(1))], Some(rat(7)), None).unwrap();
        b.add_row("half", &[(x, rat(2))], None, Some(rat(9))).unwrap();
        b.add_row("neg", &[(x, rat(-2))], Some(rat(-5)), None).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn test_tightens_then_cuts_off() {
        let mut problem = problem(VarKind::Continuous);
        let mut tightener = BoundTightener::new();
        assert_eq!(
            tightener.tighten_row(&mut problem, 0).unwrap(),
            TightenResult::Tightened(1)
        );
        problem.drain_bound_changes();
        assert_eq!(problem.local_ub(0).unwrap(), &rat(4));

        assert_eq!(
            tightener.tighten_row(&mut problem, 1).unwrap(),
            TightenResult::Cutoff { row: 1, var: 0 }
        );
        assert_eq!(tightener.stats().cutoffs, 1);
    }

    #[test]
    fn test_integer_bound_is_rounded() {
        let mut problem = problem(VarKind::Integer);
        let mut tightener = BoundTightener::new();
        tightener.tighten_row(&mut problem, 2).unwrap();
        problem.drain_bound_changes();
        assert_eq!(problem.local_ub(0).unwrap(), &rat(4));

        let mut problem = problem_continuous_half();
        tightener.tighten_row(&mut problem, 0).unwrap();
        problem.drain_bound_changes();
        assert_eq!(problem.local_ub(0).unwrap(), &ratio(9, 2));
    }

    fn problem_continuous_half() -> RationalProblem {
        let mut b = ProblemBuilder::new(ObjSense::Minimize);
        let x = b.add_var("x", rat(1), Some(rat(0)), Some(rat(10)), VarKind::Continuous);
        b.add_row("half", &[(x, rat(2))], None, Some(rat(9))).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn test_negative_coefficient_swaps_sides() {
        let mut problem = problem(VarKind::Continuous);
        let mut tightener = BoundTightener::new();
        // -2x >= -5  =>  x <= 5/2
        tightener.tighten_row(&mut problem, 3).unwrap();
        problem.drain_bound_changes();
        assert_eq!(problem.local_ub(0).unwrap(), &ratio(5, 2));
    }

    #[test]
    fn test_never_widens() {
        let mut problem = problem(VarKind::Continuous);
        let mut tightener = BoundTightener::new();
        tightener.tighten_row(&mut problem, 0).unwrap();
        problem.drain_bound_changes();
        // x <= 9/2 is weaker than x <= 4
        assert_eq!(
            tightener.tighten_row(&mut problem, 2).unwrap(),
            TightenResult::Unchanged
        );
        assert_eq!(problem.local_ub(0).unwrap(), &rat(4));
    }

    #[test]
    fn test_pass_stops_at_cutoff() {
        let mut problem = problem(VarKind::Continuous);
        let result = BoundTightener::new().tighten_all(&mut problem).unwrap();
        assert_eq!(result, TightenResult::Cutoff { row: 1, var: 0 });
    }

    #[test]
    fn test_requires_drained_log() {
        let mut problem = problem(VarKind::Continuous);
        problem.record_bound_change(0, BoundSide::Lower, rat(1)).unwrap();
        assert!(BoundTightener::new().tighten_all(&mut problem).is_err());
        assert_eq!(problem.local_lb(0).unwrap(), &rat(0));
    }
}
