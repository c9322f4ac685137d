//! Extended dual columns.
//!
//! The dual of `min c^T x, lhs <= Ax <= rhs, lb <= x <= ub` has one
//! non-negative variable per side of every row and every column bound, so
//! `2m + 2n` columns in total, laid out as
//!
//! | index        | column        | coefficients | cost     |
//! |--------------|---------------|--------------|----------|
//! | `i`          | lhs of row i  | `+A_i`       | `lhs_i`  |
//! | `m + i`      | rhs of row i  | `-A_i`       | `-rhs_i` |
//! | `2m + j`     | lb of var j   | `+e_j`       | `lb_j`   |
//! | `2m + n + j` | ub of var j   | `-e_j`       | `-ub_j`  |
//!
//! A vector `w >= 0` with `D w = c`, zero on every column whose side is
//! infinite, proves the lower bound `d^T w` on the LP.

use crate::problem::{BoundScope, RationalProblem};
use exip_core::rational::from_f64;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

/// One extended dual column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtColumn {
    /// Left-hand side of a row
    Lhs(usize),
    /// Right-hand side of a row
    Rhs(usize),
    /// Lower bound of a variable
    Lower(usize),
    /// Upper bound of a variable
    Upper(usize),
}

/// Index arithmetic over the extended dual columns of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedLayout {
    nrows: usize,
    nvars: usize,
}

impl ExtendedLayout {
    /// Layout for a problem.
    pub fn new(problem: &RationalProblem) -> Self {
        Self {
            nrows: problem.num_rows(),
            nvars: problem.num_vars(),
        }
    }

    /// Number of extended columns, `2m + 2n`.
    pub fn len(&self) -> usize {
        2 * (self.nrows + self.nvars)
    }

    /// Whether the problem has neither rows nor variables.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of a column.
    pub fn index(&self, col: ExtColumn) -> usize {
        match col {
            ExtColumn::Lhs(i) => i,
            ExtColumn::Rhs(i) => self.nrows + i,
            ExtColumn::Lower(j) => 2 * self.nrows + j,
            ExtColumn::Upper(j) => 2 * self.nrows + self.nvars + j,
        }
    }

    /// Column at an index.
    pub fn column(&self, k: usize) -> ExtColumn {
        let m = self.nrows;
        let n = self.nvars;
        if k < m {
            ExtColumn::Lhs(k)
        } else if k < 2 * m {
            ExtColumn::Rhs(k - m)
        } else if k < 2 * m + n {
            ExtColumn::Lower(k - 2 * m)
        } else {
            ExtColumn::Upper(k - 2 * m - n)
        }
    }

    /// Dual cost of a column, `None` if its side is infinite.
    pub fn cost(
        &self,
        problem: &RationalProblem,
        k: usize,
        scope: BoundScope,
    ) -> Option<BigRational> {
        match self.column(k) {
            ExtColumn::Lhs(i) => problem.finite_lhs(i).cloned(),
            ExtColumn::Rhs(i) => problem.finite_rhs(i).map(|r| -r),
            ExtColumn::Lower(j) => problem.finite_lb(scope, j).cloned(),
            ExtColumn::Upper(j) => problem.finite_ub(scope, j).map(|u| -u),
        }
    }

    /// Whether the side of a column is finite.
    pub fn is_finite(&self, problem: &RationalProblem, k: usize, scope: BoundScope) -> bool {
        match self.column(k) {
            ExtColumn::Lhs(i) => problem.finite_lhs(i).is_some(),
            ExtColumn::Rhs(i) => problem.finite_rhs(i).is_some(),
            ExtColumn::Lower(j) => problem.finite_lb(scope, j).is_some(),
            ExtColumn::Upper(j) => problem.finite_ub(scope, j).is_some(),
        }
    }

    /// Sparse coefficients of a column in variable space.
    pub fn entries(&self, problem: &RationalProblem, k: usize) -> Vec<(usize, BigRational)> {
        match self.column(k) {
            ExtColumn::Lhs(i) => problem.row(i).to_vec(),
            ExtColumn::Rhs(i) => problem.row(i).iter().map(|(j, a)| (*j, -a)).collect(),
            ExtColumn::Lower(j) => vec![(j, BigRational::from_integer(1.into()))],
            ExtColumn::Upper(j) => vec![(j, BigRational::from_integer((-1).into()))],
        }
    }

    /// Equality residual `c - D w`.
    pub fn residual(&self, problem: &RationalProblem, w: &[BigRational]) -> Vec<BigRational> {
        let m = self.nrows;
        let mut res = problem.objective().to_vec();
        for i in 0..m {
            let y = &w[i] - &w[m + i];
            if y.is_zero() {
                continue;
            }
            for (j, a) in problem.row(i) {
                res[*j] -= a * &y;
            }
        }
        for (j, r) in res.iter_mut().enumerate() {
            let lb = &w[self.index(ExtColumn::Lower(j))];
            let ub = &w[self.index(ExtColumn::Upper(j))];
            *r -= lb - ub;
        }
        res
    }

    /// Dual objective `d^T w`, `None` if `w` is nonzero on an infinite side.
    pub fn objective(
        &self,
        problem: &RationalProblem,
        w: &[BigRational],
        scope: BoundScope,
    ) -> Option<BigRational> {
        let mut value = BigRational::zero();
        for (k, wk) in w.iter().enumerate() {
            if wk.is_zero() {
                continue;
            }
            value += self.cost(problem, k, scope)? * wk;
        }
        Some(value)
    }

    /// Split approximate row duals and reduced costs into an extended vector.
    ///
    /// Positive duals go to the lhs column, negative ones to the rhs column,
    /// and likewise reduced costs to the lb and ub columns. Components whose
    /// side is infinite in `scope` are clamped to zero. Returns `None` if a
    /// value is not finite.
    pub fn split(
        &self,
        problem: &RationalProblem,
        duals: &[f64],
        redcosts: &[f64],
        scope: BoundScope,
    ) -> Option<Vec<BigRational>> {
        let mut w = vec![BigRational::zero(); self.len()];
        let pairs = duals
            .iter()
            .enumerate()
            .map(|(i, &y)| (y, ExtColumn::Lhs(i), ExtColumn::Rhs(i)))
            .chain(
                redcosts
                    .iter()
                    .enumerate()
                    .map(|(j, &r)| (r, ExtColumn::Lower(j), ExtColumn::Upper(j))),
            );
        for (value, pos, neg) in pairs {
            let value = from_f64(value)?;
            let (col, magnitude) = if value.is_positive() {
                (pos, value)
            } else if value.is_negative() {
                (neg, -value)
            } else {
                continue;
            };
            let k = self.index(col);
            if self.is_finite(problem, k, scope) {
                w[k] = magnitude;
            }
        }
        Some(w)
    }

    /// Subtract the common part of opposing lhs/rhs and lb/ub components.
    ///
    /// `D w` is unchanged and the dual objective does not decrease.
    pub fn cancel_pairs(&self, w: &mut [BigRational]) {
        let m = self.nrows;
        let n = self.nvars;
        let pairs = (0..m)
            .map(|i| (i, m + i))
            .chain((0..n).map(|j| (2 * m + j, 2 * m + n + j)));
        for (a, b) in pairs {
            if w[a].is_zero() || w[b].is_zero() {
                continue;
            }
            let common = if w[a] < w[b] { w[a].clone() } else { w[b].clone() };
            w[a] -= &common;
            w[b] -= &common;
        }
    }
}
