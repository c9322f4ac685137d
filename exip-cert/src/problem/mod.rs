//! Exact problem model.
//!
//! [`RationalProblem`] holds the exact data of the mixed-integer program:
//! objective, global and local variable bounds, and a row-major sparse
//! constraint matrix with left- and right-hand sides. Internally the
//! objective is always minimized; a maximization problem stores the negated
//! objective and reports values in original space through
//! [`RationalProblem::to_original`].
//!
//! Local bounds change only through the deferred [`BoundLog`]: changes are
//! recorded, then applied in one batch by
//! [`RationalProblem::drain_bound_changes`], which keeps the
//! [`PseudoObjective`] cache and the [`BoundTrail`] in step.
//!
//! Infinite bounds and sides are stored as the sentinels of the problem's
//! [`RationalInfinity`].

pub mod bound_log;
pub mod builder;
pub mod pseudo_obj;
pub mod trail;

pub use bound_log::{BoundLog, PendingChange};
pub use builder::ProblemBuilder;
pub use pseudo_obj::{Contribution, PseudoObjective};
pub use trail::{BoundTrail, TrailEntry, TrailStats};

use exip_core::rational::is_f64_exact;
use exip_core::{CertError, CertResult, RationalInfinity};
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;

/// Magnitude from which a finite bound counts as large.
const LARGE_BOUND: i64 = 1_000_000;

/// Objective sense of the original problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjSense {
    /// Minimize the objective
    #[default]
    Minimize,
    /// Maximize the objective
    Maximize,
}

impl ObjSense {
    /// `+1` for minimization, `-1` for maximization.
    pub fn sign(self) -> BigRational {
        match self {
            ObjSense::Minimize => BigRational::one(),
            ObjSense::Maximize => -BigRational::one(),
        }
    }
}

/// Integrality requirement of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VarKind {
    /// Real-valued
    #[default]
    Continuous,
    /// Integer-valued
    Integer,
}

/// Side of a variable bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundSide {
    /// Lower bound
    Lower,
    /// Upper bound
    Upper,
}

/// Which set of bounds to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundScope {
    /// Bounds of the original problem
    Global,
    /// Bounds of the current node
    Local,
}

/// Size and numerics statistics of a problem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemStats {
    /// Number of variables
    pub nvars: usize,
    /// Number of integer variables
    pub ninteger_vars: usize,
    /// Number of rows
    pub nrows: usize,
    /// Number of nonzero matrix entries
    pub nnonz: usize,
    /// Matrix entries with an integral value
    pub nintegral_nonz: usize,
    /// Variables with at least one infinite global bound
    pub ninf_bounds: usize,
    /// Integer variables with at least one infinite global bound
    pub ninf_int_bounds: usize,
    /// Variables with finite bounds of magnitude at least one million
    pub nlarge_bounds: usize,
    /// Rows with data not representable as `f64`
    pub nsplit_rows: usize,
    /// Smallest absolute nonzero among matrix entries and finite sides
    pub min_abs_value: Option<BigRational>,
    /// Largest absolute nonzero among matrix entries and finite sides
    pub max_abs_value: Option<BigRational>,
    /// Whether some objective coefficient is not representable as `f64`
    pub obj_needs_scaling: bool,
}

impl ProblemStats {
    /// Ratio of the largest to the smallest absolute nonzero value.
    pub fn coef_ratio(&self) -> Option<f64> {
        match (&self.min_abs_value, &self.max_abs_value) {
            (Some(min), Some(max)) => (max / min).to_f64(),
            _ => None,
        }
    }
}

impl fmt::Display for ProblemStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Exact problem      : {} vars ({} integer), {} rows, {} nonzeros ({} integral)",
            self.nvars, self.ninteger_vars, self.nrows, self.nnonz, self.nintegral_nonz
        )?;
        writeln!(
            f,
            "  bounds           : {} infinite ({} integer), {} large",
            self.ninf_bounds, self.ninf_int_bounds, self.nlarge_bounds
        )?;
        write!(
            f,
            "  numerics         : {} rows to split, coefficient ratio {}",
            self.nsplit_rows,
            self.coef_ratio()
                .map_or_else(|| "-".to_string(), |r| format!("{r:.3e}"))
        )
    }
}

/// Exact mixed-integer problem with local bounds.
#[derive(Debug, Clone)]
pub struct RationalProblem {
    sense: ObjSense,
    /// Constant added to the objective in original space
    obj_offset: BigRational,
    /// Objective coefficients in minimization form
    obj: Vec<BigRational>,
    kinds: Vec<VarKind>,
    names: Vec<String>,
    global_lb: Vec<BigRational>,
    global_ub: Vec<BigRational>,
    local_lb: Vec<BigRational>,
    local_ub: Vec<BigRational>,
    /// Start of each row in `entries`
    row_begin: Vec<usize>,
    /// Number of entries of each row
    row_len: Vec<usize>,
    /// Row-major `(column, value)` entries
    entries: Vec<(usize, BigRational)>,
    lhs: Vec<BigRational>,
    rhs: Vec<BigRational>,
    row_names: Vec<String>,
    infinity: RationalInfinity,
    log: BoundLog,
    pseudo: PseudoObjective,
    trail: BoundTrail,
}

impl RationalProblem {
    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.obj.len()
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.lhs.len()
    }

    /// Number of nonzero matrix entries.
    pub fn num_nonzeros(&self) -> usize {
        self.entries.len()
    }

    /// Objective sense of the original problem.
    pub fn sense(&self) -> ObjSense {
        self.sense
    }

    /// Objective offset in original space.
    pub fn obj_offset(&self) -> &BigRational {
        &self.obj_offset
    }

    /// Infinity sentinels.
    pub fn infinity(&self) -> &RationalInfinity {
        &self.infinity
    }

    /// Objective coefficients in minimization form.
    pub fn objective(&self) -> &[BigRational] {
        &self.obj
    }

    fn check_var(&self, var: usize) -> CertResult<()> {
        if var < self.num_vars() {
            Ok(())
        } else {
            Err(CertError::InvalidVariable(var))
        }
    }

    fn check_row(&self, row: usize) -> CertResult<()> {
        if row < self.num_rows() {
            Ok(())
        } else {
            Err(CertError::InvalidRow(row))
        }
    }

    /// Exact objective coefficient of a variable in original space.
    pub fn obj(&self, var: usize) -> CertResult<BigRational> {
        self.check_var(var)?;
        Ok(match self.sense {
            ObjSense::Minimize => self.obj[var].clone(),
            ObjSense::Maximize => -self.obj[var].clone(),
        })
    }

    /// Global lower bound of a variable.
    pub fn global_lb(&self, var: usize) -> CertResult<&BigRational> {
        self.check_var(var)?;
        Ok(&self.global_lb[var])
    }

    /// Global upper bound of a variable.
    pub fn global_ub(&self, var: usize) -> CertResult<&BigRational> {
        self.check_var(var)?;
        Ok(&self.global_ub[var])
    }

    /// Global bound that is worst for the objective: the upper bound for a
    /// non-negative coefficient, the lower bound otherwise.
    pub fn worst_global_bound(&self, var: usize) -> CertResult<&BigRational> {
        self.check_var(var)?;
        Ok(if self.obj[var].is_negative() {
            &self.global_lb[var]
        } else {
            &self.global_ub[var]
        })
    }

    /// Local lower bound of a variable.
    pub fn local_lb(&self, var: usize) -> CertResult<&BigRational> {
        self.check_var(var)?;
        Ok(&self.local_lb[var])
    }

    /// Local upper bound of a variable.
    pub fn local_ub(&self, var: usize) -> CertResult<&BigRational> {
        self.check_var(var)?;
        Ok(&self.local_ub[var])
    }

    /// All lower bounds of a scope.
    pub fn lower_bounds(&self, scope: BoundScope) -> &[BigRational] {
        match scope {
            BoundScope::Global => &self.global_lb,
            BoundScope::Local => &self.local_lb,
        }
    }

    /// All upper bounds of a scope.
    pub fn upper_bounds(&self, scope: BoundScope) -> &[BigRational] {
        match scope {
            BoundScope::Global => &self.global_ub,
            BoundScope::Local => &self.local_ub,
        }
    }

    /// Lower bound of a scope, `None` if infinite.
    pub fn finite_lb(&self, scope: BoundScope, var: usize) -> Option<&BigRational> {
        self.infinity.finite(&self.lower_bounds(scope)[var])
    }

    /// Upper bound of a scope, `None` if infinite.
    pub fn finite_ub(&self, scope: BoundScope, var: usize) -> Option<&BigRational> {
        self.infinity.finite(&self.upper_bounds(scope)[var])
    }

    /// Integrality requirement of a variable.
    pub fn kind(&self, var: usize) -> VarKind {
        self.kinds[var]
    }

    /// Whether a variable must be integral.
    pub fn is_integer(&self, var: usize) -> bool {
        self.kinds[var] == VarKind::Integer
    }

    /// Name of a variable.
    pub fn var_name(&self, var: usize) -> &str {
        &self.names[var]
    }

    /// Name of a row.
    pub fn row_name(&self, row: usize) -> &str {
        &self.row_names[row]
    }

    /// Entries `(column, value)` of a row.
    pub fn row(&self, row: usize) -> &[(usize, BigRational)] {
        let begin = self.row_begin[row];
        &self.entries[begin..begin + self.row_len[row]]
    }

    /// Checked access to a row.
    pub fn try_row(&self, row: usize) -> CertResult<&[(usize, BigRational)]> {
        self.check_row(row)?;
        Ok(self.row(row))
    }

    /// Left-hand side of a row.
    pub fn lhs(&self, row: usize) -> &BigRational {
        &self.lhs[row]
    }

    /// Right-hand side of a row.
    pub fn rhs(&self, row: usize) -> &BigRational {
        &self.rhs[row]
    }

    /// Left-hand side of a row, `None` if infinite.
    pub fn finite_lhs(&self, row: usize) -> Option<&BigRational> {
        self.infinity.finite(&self.lhs[row])
    }

    /// Right-hand side of a row, `None` if infinite.
    pub fn finite_rhs(&self, row: usize) -> Option<&BigRational> {
        self.infinity.finite(&self.rhs[row])
    }

    /// Activity `A_i x` of a row.
    pub fn row_activity(&self, row: usize, x: &[BigRational]) -> BigRational {
        self.row(row)
            .iter()
            .fold(BigRational::zero(), |acc, (j, a)| acc + a * &x[*j])
    }

    /// Objective value of `x` in minimization form.
    pub fn objective_value(&self, x: &[BigRational]) -> BigRational {
        exip_core::rational::dot(&self.obj, x)
    }

    /// Map a minimization-form objective value to original space.
    pub fn to_original(&self, value: &BigRational) -> BigRational {
        self.sense.sign() * value + &self.obj_offset
    }

    /// Record a local bound change to be applied by the next drain.
    ///
    /// The value is clamped into the global bounds. A change that would make
    /// the variable's bounds cross is rejected.
    pub fn record_bound_change(
        &mut self,
        var: usize,
        side: BoundSide,
        value: BigRational,
    ) -> CertResult<()> {
        self.check_var(var)?;
        let value = self.infinity.normalize(value);
        let value = match side {
            BoundSide::Lower if value < self.global_lb[var] => self.global_lb[var].clone(),
            BoundSide::Upper if value > self.global_ub[var] => self.global_ub[var].clone(),
            _ => value,
        };
        let crosses = match side {
            BoundSide::Lower => value > *self.effective_bound(var, BoundSide::Upper),
            BoundSide::Upper => value < *self.effective_bound(var, BoundSide::Lower),
        };
        if crosses {
            return Err(CertError::InvalidProblem(format!(
                "{side:?} bound {value} on variable {var} crosses the opposite bound"
            )));
        }
        self.log.record(var, side, value);
        Ok(())
    }

    /// Local bound after applying the pending changes.
    pub fn effective_bound(&self, var: usize, side: BoundSide) -> &BigRational {
        self.log.pending(var, side).unwrap_or(match side {
            BoundSide::Lower => &self.local_lb[var],
            BoundSide::Upper => &self.local_ub[var],
        })
    }

    /// Number of pending bound changes.
    pub fn num_pending_changes(&self) -> usize {
        self.log.len()
    }

    /// Remove the pending bound changes without applying them.
    pub fn take_pending_changes(&mut self) -> Vec<PendingChange> {
        self.log.take()
    }

    /// Fail with [`CertError::PendingBoundChanges`] unless the log is empty.
    pub fn ensure_drained(&self) -> CertResult<()> {
        if self.log.is_empty() {
            Ok(())
        } else {
            Err(CertError::PendingBoundChanges(self.log.len()))
        }
    }

    fn contribution(&self, var: usize) -> Contribution {
        Contribution::of(
            &self.obj[var],
            &self.local_lb[var],
            &self.local_ub[var],
            &self.infinity,
        )
    }

    fn set_local_bound(&mut self, var: usize, side: BoundSide, value: BigRational) -> BigRational {
        let old_term = self.contribution(var);
        let slot = match side {
            BoundSide::Lower => &mut self.local_lb[var],
            BoundSide::Upper => &mut self.local_ub[var],
        };
        let old = std::mem::replace(slot, value);
        let new_term = self.contribution(var);
        self.pseudo.update(&old_term, &new_term);
        old
    }

    /// Apply all pending bound changes to the local bounds.
    ///
    /// Returns the sorted indices of variables whose bounds changed.
    pub fn drain_bound_changes(&mut self) -> Vec<usize> {
        let mut touched = Vec::with_capacity(self.log.len());
        for change in self.log.take() {
            let current = match change.side {
                BoundSide::Lower => &self.local_lb[change.var],
                BoundSide::Upper => &self.local_ub[change.var],
            };
            if *current == change.value {
                continue;
            }
            let old = self.set_local_bound(change.var, change.side, change.value);
            self.trail.record(change.var, change.side, old);
            touched.push(change.var);
        }
        touched.sort_unstable();
        touched.dedup();
        touched
    }

    /// Open a new tree level; changes drained afterwards are undone by
    /// [`RationalProblem::backtrack_to`].
    pub fn push_level(&mut self) {
        self.trail.push_level();
    }

    /// Current tree depth of the bound trail.
    pub fn depth(&self) -> usize {
        self.trail.depth()
    }

    /// Restore the local bounds that were in effect at `depth`.
    ///
    /// Pending changes belong to the level being left and are discarded.
    /// Returns the sorted indices of variables whose bounds changed.
    pub fn backtrack_to(&mut self, depth: usize) -> CertResult<Vec<usize>> {
        let current = self.trail.depth();
        let undone = self
            .trail
            .unwind(depth)
            .ok_or(CertError::InvalidBacktrack {
                target: depth,
                current,
            })?;
        let discarded = self.log.take();
        if !discarded.is_empty() {
            tracing::debug!(count = discarded.len(), "discarding pending bound changes");
        }
        let mut touched = Vec::with_capacity(undone.len());
        for entry in undone {
            self.set_local_bound(entry.var, entry.side, entry.old);
            touched.push(entry.var);
        }
        touched.sort_unstable();
        touched.dedup();
        Ok(touched)
    }

    /// Trail statistics.
    pub fn trail_stats(&self) -> &TrailStats {
        self.trail.stats()
    }

    /// The incrementally maintained pseudo-objective of the local bounds.
    pub fn pseudo_objective(&self) -> &PseudoObjective {
        &self.pseudo
    }

    /// Recompute the pseudo-objective from scratch.
    pub fn recompute_pseudo_objective(&self) -> PseudoObjective {
        PseudoObjective::compute(&self.obj, &self.local_lb, &self.local_ub, &self.infinity)
    }

    /// Size and numerics statistics.
    pub fn stats(&self) -> ProblemStats {
        let large = BigRational::from_integer(LARGE_BOUND.into());
        let mut stats = ProblemStats {
            nvars: self.num_vars(),
            nrows: self.num_rows(),
            nnonz: self.num_nonzeros(),
            ..ProblemStats::default()
        };

        for var in 0..self.num_vars() {
            let integer = self.is_integer(var);
            if integer {
                stats.ninteger_vars += 1;
            }
            let lb = &self.global_lb[var];
            let ub = &self.global_ub[var];
            if self.infinity.is_infinite(lb) || self.infinity.is_infinite(ub) {
                stats.ninf_bounds += 1;
                if integer {
                    stats.ninf_int_bounds += 1;
                }
            } else if lb.abs() >= large || ub.abs() >= large {
                stats.nlarge_bounds += 1;
            }
            if !is_f64_exact(&self.obj[var]) {
                stats.obj_needs_scaling = true;
            }
        }

        let mut observe = |v: &BigRational| {
            if v.is_zero() {
                return;
            }
            let abs = v.abs();
            if stats.min_abs_value.as_ref().is_none_or(|m| &abs < m) {
                stats.min_abs_value = Some(abs.clone());
            }
            if stats.max_abs_value.as_ref().is_none_or(|m| &abs > m) {
                stats.max_abs_value = Some(abs);
            }
        };
        let mut nsplit = 0;
        let mut nintegral = 0;
        for row in 0..self.num_rows() {
            let mut split = false;
            for (_, a) in self.row(row) {
                observe(a);
                if a.is_integer() {
                    nintegral += 1;
                }
                split |= !is_f64_exact(a);
            }
            for side in [self.finite_lhs(row), self.finite_rhs(row)].into_iter().flatten() {
                observe(side);
                split |= !is_f64_exact(side);
            }
            if split {
                nsplit += 1;
            }
        }
        stats.nsplit_rows = nsplit;
        stats.nintegral_nonz = nintegral;
        stats
    }
}
