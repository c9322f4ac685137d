//! Bounded Simplex over Exact Rationals.
//!
//! Dense-tableau implementation of the primal and dual simplex for LPs with
//! bounded variables. Each row `i` gets an activity variable `s_i = A_i x`
//! whose bounds are the row sides, so the constraint system is
//! `[A | -I] v = 0` with `m` rows and `n + m` variables.
//!
//! The tableau `T = B^-1 [A | -I]` is kept explicitly and updated by
//! Gauss-Jordan pivots. Basic values are recomputed from the nonbasic
//! positions after every pivot, so no rounding drift can accumulate (there
//! is none in exact arithmetic, but recomputation also keeps bound flips
//! trivial).
//!
//! Pivot selection uses Bland's rule (smallest index among candidates), so
//! both variants terminate on degenerate problems.
//!
//! ## References
//!
//! - Chvátal: "Linear Programming" (1983), chapters 8 and 10
//! - Koberstein: "The Dual Simplex Method" (2005)

use super::{BasisStatus, ExactLp, LpBasis, LpError, LpStatus, SimplexAlgorithm};
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::cmp::Ordering;
use std::time::{Duration, Instant};

/// Simplex statistics.
#[derive(Debug, Clone, Default)]
pub struct SimplexStats {
    /// Total iterations over all solves.
    pub iterations: u64,
    /// Basis changes.
    pub pivots: u64,
    /// Bound flips of the entering variable.
    pub bound_flips: u64,
    /// Tableau rebuilds from scratch.
    pub refactorizations: u64,
    /// Solves performed.
    pub solves: u64,
}

/// Result of a primal ratio test.
enum Step {
    /// The entering variable reaches its opposite bound.
    Flip,
    /// Basic variable of `row` leaves at the given bound.
    Pivot { row: usize, leave: BasisStatus },
}

/// Exact bounded simplex solver.
#[derive(Debug, Clone, Default)]
pub struct RationalSimplex {
    /// Objective coefficients of the structural columns.
    obj: Vec<BigRational>,
    /// Lower bounds of all variables, columns first.
    lower: Vec<Option<BigRational>>,
    /// Upper bounds of all variables, columns first.
    upper: Vec<Option<BigRational>>,
    /// Sparse rows of the constraint matrix.
    rows: Vec<Vec<(usize, BigRational)>>,
    /// Basis status of all variables.
    status: Vec<BasisStatus>,
    /// Basic variable of each tableau row.
    head: Vec<usize>,
    /// `B^-1 [A | -I]`, valid when `factored`.
    tableau: Vec<Vec<BigRational>>,
    /// Current values of all variables.
    values: Vec<BigRational>,
    factored: bool,
    iteration_limit: Option<u64>,
    time_limit: Option<Duration>,
    objective_limit: Option<BigRational>,
    last_iterations: u64,
    stats: SimplexStats,
}

impl RationalSimplex {
    /// Create an empty LP.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get statistics.
    pub fn stats(&self) -> &SimplexStats {
        &self.stats
    }

    fn ncols(&self) -> usize {
        self.obj.len()
    }

    fn nvars(&self) -> usize {
        self.obj.len() + self.rows.len()
    }

    fn cost(&self, var: usize) -> BigRational {
        self.obj.get(var).cloned().unwrap_or_else(BigRational::zero)
    }

    fn is_fixed(&self, var: usize) -> bool {
        matches!((&self.lower[var], &self.upper[var]), (Some(l), Some(u)) if l == u)
    }

    fn can_increase(&self, var: usize) -> bool {
        match &self.upper[var] {
            Some(u) => &self.values[var] < u,
            None => true,
        }
    }

    fn can_decrease(&self, var: usize) -> bool {
        match &self.lower[var] {
            Some(l) => &self.values[var] > l,
            None => true,
        }
    }

    fn below_lower(&self, var: usize) -> bool {
        matches!(&self.lower[var], Some(l) if &self.values[var] < l)
    }

    fn above_upper(&self, var: usize) -> bool {
        matches!(&self.upper[var], Some(u) if &self.values[var] > u)
    }

    /// Default nonbasic position for a variable with the given bounds.
    fn default_status(lb: &Option<BigRational>, ub: &Option<BigRational>) -> BasisStatus {
        match (lb, ub) {
            (Some(_), _) => BasisStatus::AtLower,
            (None, Some(_)) => BasisStatus::AtUpper,
            (None, None) => BasisStatus::Zero,
        }
    }

    /// Make a nonbasic status consistent with the variable's bounds.
    fn normalize_status(&mut self, var: usize) {
        let status = self.status[var];
        let fixed = match status {
            BasisStatus::Basic => return,
            BasisStatus::AtLower if self.lower[var].is_some() => status,
            BasisStatus::AtUpper if self.upper[var].is_some() => status,
            BasisStatus::Zero if self.lower[var].is_none() && self.upper[var].is_none() => status,
            _ => Self::default_status(&self.lower[var], &self.upper[var]),
        };
        self.status[var] = fixed;
    }

    fn nonbasic_value(&self, var: usize) -> BigRational {
        match self.status[var] {
            BasisStatus::AtLower => self.lower[var].clone().unwrap_or_else(BigRational::zero),
            BasisStatus::AtUpper => self.upper[var].clone().unwrap_or_else(BigRational::zero),
            BasisStatus::Zero | BasisStatus::Basic => BigRational::zero(),
        }
    }

    /// Gauss-Jordan pivot on `(row, col)`.
    fn pivot_tableau(tableau: &mut [Vec<BigRational>], row: usize, col: usize) {
        let pivot = tableau[row][col].clone();
        if !pivot.is_one() {
            for elem in tableau[row].iter_mut() {
                if !elem.is_zero() {
                    *elem = &*elem / &pivot;
                }
            }
        }
        let pivot_row = tableau[row].clone();
        let support: Vec<usize> = pivot_row
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_zero())
            .map(|(j, _)| j)
            .collect();
        for (i, other) in tableau.iter_mut().enumerate() {
            if i == row || other[col].is_zero() {
                continue;
            }
            let factor = other[col].clone();
            for &j in &support {
                other[j] = &other[j] - &factor * &pivot_row[j];
            }
        }
    }

    /// Rebuild the tableau for the current basic variables.
    fn refactor(&mut self) -> Result<(), LpError> {
        let n = self.ncols();
        let m = self.rows.len();
        let width = n + m;
        if self.head.len() != m {
            return Err(LpError::InvalidBasis(format!(
                "{} basic variables for {} rows",
                self.head.len(),
                m
            )));
        }

        let mut tableau = vec![vec![BigRational::zero(); width]; m];
        for (i, row) in self.rows.iter().enumerate() {
            for (j, a) in row {
                tableau[i][*j] = &tableau[i][*j] + a;
            }
            tableau[i][n + i] = -BigRational::one();
        }

        let mut used = vec![false; m];
        let mut head = vec![usize::MAX; m];
        for &var in &self.head {
            let Some(p) = (0..m).find(|&r| !used[r] && !tableau[r][var].is_zero()) else {
                return Err(LpError::SingularBasis);
            };
            used[p] = true;
            head[p] = var;
            Self::pivot_tableau(&mut tableau, p, var);
        }

        self.tableau = tableau;
        self.head = head;
        self.factored = true;
        self.stats.refactorizations += 1;
        self.compute_values();
        Ok(())
    }

    fn ensure_factored(&mut self) -> Result<(), LpError> {
        if !self.factored {
            self.refactor()?;
        }
        Ok(())
    }

    /// Recompute all values from the nonbasic positions.
    fn compute_values(&mut self) {
        let width = self.nvars();
        let mut values = vec![BigRational::zero(); width];
        for (var, value) in values.iter_mut().enumerate() {
            if self.status[var] != BasisStatus::Basic {
                *value = self.nonbasic_value(var);
            }
        }
        let nonzero: Vec<usize> = (0..width)
            .filter(|&j| self.status[j] != BasisStatus::Basic && !values[j].is_zero())
            .collect();
        for (r, &var) in self.head.iter().enumerate() {
            let mut acc = BigRational::zero();
            for &j in &nonzero {
                let t = &self.tableau[r][j];
                if !t.is_zero() {
                    acc -= t * &values[j];
                }
            }
            values[var] = acc;
        }
        self.values = values;
    }

    fn phase_two_costs(&self) -> Vec<BigRational> {
        (0..self.nvars()).map(|var| self.cost(var)).collect()
    }

    fn phase_one_costs(&self) -> Vec<BigRational> {
        let mut costs = vec![BigRational::zero(); self.nvars()];
        for &var in &self.head {
            if self.below_lower(var) {
                costs[var] = -BigRational::one();
            } else if self.above_upper(var) {
                costs[var] = BigRational::one();
            }
        }
        costs
    }

    /// `d_k = c_k - c_B^T T_k` for every variable.
    fn reduced_costs_for(&self, costs: &[BigRational]) -> Vec<BigRational> {
        let mut d = costs.to_vec();
        for (r, &var) in self.head.iter().enumerate() {
            let cb = &costs[var];
            if cb.is_zero() {
                continue;
            }
            for (k, t) in self.tableau[r].iter().enumerate() {
                if !t.is_zero() {
                    d[k] -= cb * t;
                }
            }
        }
        for &var in &self.head {
            d[var] = BigRational::zero();
        }
        d
    }

    fn has_primal_infeasibility(&self) -> bool {
        self.head
            .iter()
            .any(|&var| self.below_lower(var) || self.above_upper(var))
    }

    fn basis_is_dual_feasible(&self, d: &[BigRational]) -> bool {
        (0..self.nvars()).all(|var| {
            if self.is_fixed(var) {
                return true;
            }
            match self.status[var] {
                BasisStatus::Basic => true,
                BasisStatus::AtLower => !d[var].is_negative(),
                BasisStatus::AtUpper => !d[var].is_positive(),
                BasisStatus::Zero => d[var].is_zero(),
            }
        })
    }

    fn current_objective(&self) -> BigRational {
        self.obj
            .iter()
            .zip(&self.values)
            .filter(|(c, _)| !c.is_zero())
            .fold(BigRational::zero(), |acc, (c, x)| acc + c * x)
    }

    fn limit_reached(&self, iterations: u64, start: Instant) -> Option<LpStatus> {
        if let Some(limit) = self.iteration_limit
            && iterations >= limit
        {
            return Some(LpStatus::IterLimit);
        }
        if let Some(limit) = self.time_limit
            && start.elapsed() >= limit
        {
            return Some(LpStatus::TimeLimit);
        }
        None
    }

    fn pivot(&mut self, row: usize, entering: usize, leave: BasisStatus) {
        let leaving = self.head[row];
        self.status[leaving] = leave;
        self.status[entering] = BasisStatus::Basic;
        self.head[row] = entering;
        Self::pivot_tableau(&mut self.tableau, row, entering);
        self.stats.pivots += 1;
        self.compute_values();
    }

    /// Primal ratio test for `entering` moving up (`increase`) or down.
    fn ratio_test(&self, entering: usize, increase: bool, phase_one: bool) -> Option<Step> {
        let mut best: Option<(BigRational, usize, Step)> = None;
        let mut consider = |ratio: BigRational, var: usize, step: Step| {
            let better = match &best {
                None => true,
                Some((r, v, _)) => match ratio.cmp(r) {
                    Ordering::Less => true,
                    Ordering::Equal => var < *v,
                    Ordering::Greater => false,
                },
            };
            if better {
                best = Some((ratio, var, step));
            }
        };

        if let (Some(l), Some(u)) = (&self.lower[entering], &self.upper[entering]) {
            consider(u - l, entering, Step::Flip);
        }

        for (row, &var) in self.head.iter().enumerate() {
            let t = &self.tableau[row][entering];
            if t.is_zero() {
                continue;
            }
            // rate of change of the basic variable per unit step
            let alpha = if increase { -t.clone() } else { t.clone() };
            let value = &self.values[var];
            let limit = if phase_one && self.below_lower(var) {
                match &self.lower[var] {
                    Some(l) if alpha.is_positive() => Some((l - value, BasisStatus::AtLower)),
                    _ => None,
                }
            } else if phase_one && self.above_upper(var) {
                match &self.upper[var] {
                    Some(u) if alpha.is_negative() => Some((u - value, BasisStatus::AtUpper)),
                    _ => None,
                }
            } else if alpha.is_positive() {
                self.upper[var]
                    .as_ref()
                    .map(|u| (u - value, BasisStatus::AtUpper))
            } else {
                self.lower[var]
                    .as_ref()
                    .map(|l| (l - value, BasisStatus::AtLower))
            };
            if let Some((gap, leave)) = limit {
                consider(gap / &alpha, var, Step::Pivot { row, leave });
            }
        }

        best.map(|(_, _, step)| step)
    }

    fn run_primal(&mut self, start: Instant) -> Result<LpStatus, LpError> {
        loop {
            if let Some(status) = self.limit_reached(self.last_iterations, start) {
                return Ok(status);
            }
            let phase_one = self.has_primal_infeasibility();
            let costs = if phase_one {
                self.phase_one_costs()
            } else {
                self.phase_two_costs()
            };
            let d = self.reduced_costs_for(&costs);

            let entering = (0..self.nvars())
                .filter(|&j| self.status[j] != BasisStatus::Basic)
                .find_map(|j| {
                    if d[j].is_negative() && self.can_increase(j) {
                        Some((j, true))
                    } else if d[j].is_positive() && self.can_decrease(j) {
                        Some((j, false))
                    } else {
                        None
                    }
                });
            let Some((entering, increase)) = entering else {
                return Ok(if phase_one {
                    LpStatus::Infeasible
                } else {
                    LpStatus::Optimal
                });
            };

            match self.ratio_test(entering, increase, phase_one) {
                None if phase_one => {
                    return Err(LpError::Internal(
                        "phase one found an improving ray".to_string(),
                    ));
                }
                None => return Ok(LpStatus::Unbounded),
                Some(Step::Flip) => {
                    self.status[entering] = if increase {
                        BasisStatus::AtUpper
                    } else {
                        BasisStatus::AtLower
                    };
                    self.stats.bound_flips += 1;
                    self.compute_values();
                }
                Some(Step::Pivot { row, leave }) => self.pivot(row, entering, leave),
            }
            self.last_iterations += 1;
            self.stats.iterations += 1;
        }
    }

    fn run_dual(&mut self, start: Instant) -> Result<LpStatus, LpError> {
        let costs = self.phase_two_costs();
        if !self.basis_is_dual_feasible(&self.reduced_costs_for(&costs)) {
            tracing::debug!("basis not dual feasible, switching to primal simplex");
            return self.run_primal(start);
        }
        loop {
            if let Some(status) = self.limit_reached(self.last_iterations, start) {
                return Ok(status);
            }
            if let Some(limit) = &self.objective_limit
                && &self.current_objective() >= limit
            {
                return Ok(LpStatus::ObjLimitExceeded);
            }
            let d = self.reduced_costs_for(&costs);

            let leaving_row = (0..self.head.len())
                .filter(|&r| {
                    let var = self.head[r];
                    self.below_lower(var) || self.above_upper(var)
                })
                .min_by_key(|&r| self.head[r]);
            let Some(row) = leaving_row else {
                return Ok(LpStatus::Optimal);
            };
            let to_lower = self.below_lower(self.head[row]);

            let mut best: Option<(BigRational, usize)> = None;
            for j in 0..self.nvars() {
                if self.status[j] == BasisStatus::Basic || self.is_fixed(j) {
                    continue;
                }
                let t = &self.tableau[row][j];
                if t.is_zero() {
                    continue;
                }
                // x_leaving moves by -t per unit increase of x_j
                let up_helps = if to_lower { t.is_negative() } else { t.is_positive() };
                let eligible = match self.status[j] {
                    BasisStatus::AtLower => up_helps,
                    BasisStatus::AtUpper => !up_helps,
                    BasisStatus::Zero => true,
                    BasisStatus::Basic => false,
                };
                if !eligible {
                    continue;
                }
                let ratio = d[j].abs() / t.abs();
                if best.as_ref().is_none_or(|(r, _)| &ratio < r) {
                    best = Some((ratio, j));
                }
            }
            let Some((_, entering)) = best else {
                return Ok(LpStatus::Infeasible);
            };
            let leave = if to_lower {
                BasisStatus::AtLower
            } else {
                BasisStatus::AtUpper
            };
            self.pivot(row, entering, leave);
            self.last_iterations += 1;
            self.stats.iterations += 1;
        }
    }

    fn check_col(&self, col: usize) -> Result<(), LpError> {
        if col < self.ncols() {
            Ok(())
        } else {
            Err(LpError::InvalidIndex {
                index: col,
                size: self.ncols(),
            })
        }
    }
}

impl ExactLp for RationalSimplex {
    fn num_cols(&self) -> usize {
        self.ncols()
    }

    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn reserve(&mut self, cols: usize, rows: usize) -> Result<(), LpError> {
        let alloc = |e: std::collections::TryReserveError| LpError::Allocation(e.to_string());
        self.obj.try_reserve(cols).map_err(alloc)?;
        self.rows.try_reserve(rows).map_err(alloc)?;
        self.lower.try_reserve(cols + rows).map_err(alloc)?;
        self.upper.try_reserve(cols + rows).map_err(alloc)?;
        self.status.try_reserve(cols + rows).map_err(alloc)?;
        self.head.try_reserve(rows).map_err(alloc)?;
        Ok(())
    }

    fn add_col(
        &mut self,
        obj: BigRational,
        lb: Option<BigRational>,
        ub: Option<BigRational>,
    ) -> Result<usize, LpError> {
        let col = self.ncols();
        if let (Some(l), Some(u)) = (&lb, &ub)
            && l > u
        {
            return Err(LpError::InconsistentBounds(col));
        }
        let status = Self::default_status(&lb, &ub);
        // row variables shift up by one
        for var in self.head.iter_mut() {
            if *var >= col {
                *var += 1;
            }
        }
        self.obj.push(obj);
        self.lower.insert(col, lb);
        self.upper.insert(col, ub);
        self.status.insert(col, status);
        self.factored = false;
        Ok(col)
    }

    fn add_row(
        &mut self,
        entries: &[(usize, BigRational)],
        lhs: Option<BigRational>,
        rhs: Option<BigRational>,
    ) -> Result<usize, LpError> {
        let row = self.rows.len();
        for (col, _) in entries {
            self.check_col(*col)?;
        }
        if let (Some(l), Some(u)) = (&lhs, &rhs)
            && l > u
        {
            return Err(LpError::InconsistentBounds(self.ncols() + row));
        }
        let mut sparse: Vec<(usize, BigRational)> = Vec::new();
        sparse
            .try_reserve(entries.len())
            .map_err(|e| LpError::Allocation(e.to_string()))?;
        sparse.extend(entries.iter().filter(|(_, a)| !a.is_zero()).cloned());
        self.rows.push(sparse);
        self.lower.push(lhs);
        self.upper.push(rhs);
        self.status.push(BasisStatus::Basic);
        self.head.push(self.ncols() + row);
        self.factored = false;
        Ok(row)
    }

    fn change_bounds(
        &mut self,
        col: usize,
        lb: Option<BigRational>,
        ub: Option<BigRational>,
    ) -> Result<(), LpError> {
        self.check_col(col)?;
        if let (Some(l), Some(u)) = (&lb, &ub)
            && l > u
        {
            return Err(LpError::InconsistentBounds(col));
        }
        self.lower[col] = lb;
        self.upper[col] = ub;
        self.normalize_status(col);
        if self.factored {
            self.compute_values();
        }
        Ok(())
    }

    fn set_iteration_limit(&mut self, limit: Option<u64>) {
        self.iteration_limit = limit;
    }

    fn set_time_limit(&mut self, limit: Option<Duration>) {
        self.time_limit = limit;
    }

    fn set_objective_limit(&mut self, limit: Option<BigRational>) {
        self.objective_limit = limit;
    }

    fn solve(&mut self, algorithm: SimplexAlgorithm) -> Result<LpStatus, LpError> {
        let start = Instant::now();
        for var in 0..self.nvars() {
            self.normalize_status(var);
        }
        self.ensure_factored()?;
        self.compute_values();
        self.last_iterations = 0;
        self.stats.solves += 1;
        let status = match algorithm {
            SimplexAlgorithm::Primal => self.run_primal(start)?,
            SimplexAlgorithm::Dual => self.run_dual(start)?,
        };
        tracing::debug!(
            ?status,
            iterations = self.last_iterations,
            rows = self.rows.len(),
            cols = self.ncols(),
            "exact simplex finished"
        );
        Ok(status)
    }

    fn objective_value(&mut self) -> Result<BigRational, LpError> {
        self.ensure_factored()?;
        Ok(self.current_objective())
    }

    fn primal(&mut self) -> Result<Vec<BigRational>, LpError> {
        self.ensure_factored()?;
        Ok(self.values[..self.ncols()].to_vec())
    }

    fn duals(&mut self) -> Result<Vec<BigRational>, LpError> {
        self.ensure_factored()?;
        let n = self.ncols();
        let d = self.reduced_costs_for(&self.phase_two_costs());
        // reduced cost of s_i = A_i x is exactly the row dual
        Ok(d[n..].to_vec())
    }

    fn reduced_costs(&mut self) -> Result<Vec<BigRational>, LpError> {
        self.ensure_factored()?;
        let mut d = self.reduced_costs_for(&self.phase_two_costs());
        d.truncate(self.ncols());
        Ok(d)
    }

    fn is_primal_feasible(&mut self) -> Result<bool, LpError> {
        self.ensure_factored()?;
        Ok(!self.has_primal_infeasibility())
    }

    fn is_dual_feasible(&mut self) -> Result<bool, LpError> {
        self.ensure_factored()?;
        let d = self.reduced_costs_for(&self.phase_two_costs());
        Ok(self.basis_is_dual_feasible(&d))
    }

    fn basis(&self) -> LpBasis {
        let n = self.ncols();
        LpBasis {
            cols: self.status[..n].to_vec(),
            rows: self.status[n..].to_vec(),
        }
    }

    fn set_basis(&mut self, basis: &LpBasis) -> Result<(), LpError> {
        let n = self.ncols();
        let m = self.rows.len();
        if basis.cols.len() != n || basis.rows.len() != m {
            return Err(LpError::InvalidBasis(format!(
                "basis is {}x{}, LP is {}x{}",
                basis.rows.len(),
                basis.cols.len(),
                m,
                n
            )));
        }
        if basis.num_basic() != m {
            return Err(LpError::InvalidBasis(format!(
                "{} basic entries for {} rows",
                basis.num_basic(),
                m
            )));
        }

        let saved = (self.status.clone(), self.head.clone(), self.factored);
        self.status = basis.cols.iter().chain(&basis.rows).copied().collect();
        self.head = (0..n + m)
            .filter(|&var| self.status[var] == BasisStatus::Basic)
            .collect();
        for var in 0..n + m {
            self.normalize_status(var);
        }
        if let Err(err) = self.refactor() {
            (self.status, self.head, self.factored) = saved;
            if self.factored {
                self.factored = false;
                self.refactor()?;
            }
            return Err(err);
        }
        Ok(())
    }

    fn iterations(&self) -> u64 {
        self.last_iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn rat(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    fn frac(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    /// min -x - y  s.t.  x + 2y <= 4, 3x + y <= 6, x, y >= 0
    fn small_lp() -> RationalSimplex {
        let mut lp = RationalSimplex::new();
        let x = lp.add_col(rat(-1), Some(rat(0)), None).unwrap();
        let y = lp.add_col(rat(-1), Some(rat(0)), None).unwrap();
        lp.add_row(&[(x, rat(1)), (y, rat(2))], None, Some(rat(4)))
            .unwrap();
        lp.add_row(&[(x, rat(3)), (y, rat(1))], None, Some(rat(6)))
            .unwrap();
        lp
    }

    #[test]
    fn test_primal_optimum() {
        let mut lp = small_lp();
        assert_eq!(lp.solve(SimplexAlgorithm::Primal), Ok(LpStatus::Optimal));
        // optimum at x = 8/5, y = 6/5
        assert_eq!(lp.objective_value().unwrap(), frac(-14, 5));
        assert_eq!(lp.primal().unwrap(), vec![frac(8, 5), frac(6, 5)]);
        assert!(lp.is_dual_feasible().unwrap());
    }

    #[test]
    fn test_duals_certify_objective() {
        let mut lp = small_lp();
        lp.solve(SimplexAlgorithm::Primal).unwrap();
        let y = lp.duals().unwrap();
        // both rows are tight at their rhs, so the duals are non-positive
        assert!(y.iter().all(|v| !v.is_positive()));
        let bound = &y[0] * rat(4) + &y[1] * rat(6);
        assert_eq!(bound, frac(-14, 5));
        let d = lp.reduced_costs().unwrap();
        assert!(d.iter().all(|v| v.is_zero()));
    }

    #[test]
    fn test_infeasible() {
        let mut lp = RationalSimplex::new();
        let x = lp.add_col(rat(1), Some(rat(0)), Some(rat(1))).unwrap();
        lp.add_row(&[(x, rat(1))], Some(rat(2)), None).unwrap();
        assert_eq!(lp.solve(SimplexAlgorithm::Primal), Ok(LpStatus::Infeasible));
    }

    #[test]
    fn test_unbounded() {
        let mut lp = RationalSimplex::new();
        let x = lp.add_col(rat(-1), Some(rat(0)), None).unwrap();
        let y = lp.add_col(rat(0), Some(rat(0)), None).unwrap();
        lp.add_row(&[(x, rat(1)), (y, rat(-1))], None, Some(rat(1)))
            .unwrap();
        assert_eq!(lp.solve(SimplexAlgorithm::Primal), Ok(LpStatus::Unbounded));
    }

    #[test]
    fn test_equality_with_free_variable() {
        let mut lp = RationalSimplex::new();
        let x = lp.add_col(rat(1), None, None).unwrap();
        lp.add_row(&[(x, rat(1))], Some(rat(1)), Some(rat(1)))
            .unwrap();
        assert_eq!(lp.solve(SimplexAlgorithm::Primal), Ok(LpStatus::Optimal));
        assert_eq!(lp.objective_value().unwrap(), rat(1));
        assert_eq!(lp.duals().unwrap(), vec![rat(1)]);
    }

    #[test]
    fn test_dual_simplex_after_bound_change() {
        let mut lp = small_lp();
        lp.solve(SimplexAlgorithm::Primal).unwrap();
        lp.change_bounds(0, Some(rat(0)), Some(rat(1))).unwrap();
        assert!(lp.is_dual_feasible().unwrap());
        assert_eq!(lp.solve(SimplexAlgorithm::Dual), Ok(LpStatus::Optimal));
        // x = 1, y = 3/2
        assert_eq!(lp.objective_value().unwrap(), frac(-5, 2));
    }

    #[test]
    fn test_objective_limit_stops_dual() {
        let mut lp = small_lp();
        lp.solve(SimplexAlgorithm::Primal).unwrap();
        lp.change_bounds(0, Some(rat(0)), Some(rat(1))).unwrap();
        lp.set_objective_limit(Some(rat(-3)));
        assert_eq!(
            lp.solve(SimplexAlgorithm::Dual),
            Ok(LpStatus::ObjLimitExceeded)
        );
    }

    #[test]
    fn test_iteration_limit() {
        let mut lp = small_lp();
        lp.set_iteration_limit(Some(0));
        assert_eq!(lp.solve(SimplexAlgorithm::Primal), Ok(LpStatus::IterLimit));
        lp.set_iteration_limit(None);
        assert_eq!(lp.solve(SimplexAlgorithm::Primal), Ok(LpStatus::Optimal));
    }

    #[test]
    fn test_warm_start_from_optimal_basis() {
        let mut lp = small_lp();
        lp.solve(SimplexAlgorithm::Primal).unwrap();
        let basis = lp.basis();

        let mut warm = small_lp();
        warm.set_basis(&basis).unwrap();
        assert!(warm.is_dual_feasible().unwrap());
        assert!(warm.is_primal_feasible().unwrap());
        assert_eq!(warm.solve(SimplexAlgorithm::Dual), Ok(LpStatus::Optimal));
        assert_eq!(warm.iterations(), 0);
    }

    #[test]
    fn test_singular_basis_rejected() {
        let mut lp = RationalSimplex::new();
        let x = lp.add_col(rat(1), Some(rat(0)), None).unwrap();
        let y = lp.add_col(rat(1), Some(rat(0)), None).unwrap();
        lp.add_row(&[(x, rat(1)), (y, rat(1))], Some(rat(1)), None)
            .unwrap();
        lp.add_row(&[(x, rat(2)), (y, rat(2))], Some(rat(2)), None)
            .unwrap();
        let before = lp.basis();
        let singular = LpBasis {
            cols: vec![BasisStatus::Basic, BasisStatus::AtLower],
            rows: vec![BasisStatus::AtLower, BasisStatus::Basic],
        };
        // column x alone can pivot on either row; basis {x, s_1} is regular
        assert!(lp.set_basis(&singular).is_ok());
        let bad = LpBasis {
            cols: vec![BasisStatus::Basic, BasisStatus::Basic],
            rows: vec![BasisStatus::AtLower, BasisStatus::AtLower],
        };
        assert_eq!(lp.set_basis(&bad), Err(LpError::SingularBasis));
        assert_ne!(lp.basis(), before);
        assert_eq!(lp.basis(), singular);
    }

    #[test]
    fn test_add_col_after_rows_keeps_row_basis() {
        let mut lp = RationalSimplex::new();
        let x = lp.add_col(rat(1), Some(rat(0)), None).unwrap();
        lp.add_row(&[(x, rat(1))], Some(rat(2)), None).unwrap();
        let y = lp.add_col(rat(3), Some(rat(0)), None).unwrap();
        assert_eq!(y, 1);
        assert_eq!(lp.solve(SimplexAlgorithm::Primal), Ok(LpStatus::Optimal));
        assert_eq!(lp.objective_value().unwrap(), rat(2));
    }
}
