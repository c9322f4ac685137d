//! Exact Rational Column Factorization.
//!
//! Selects a maximal linearly independent subset of a list of sparse columns
//! and solves linear systems restricted to that subset, all in exact
//! rational arithmetic.
//!
//! Columns are processed in the given order. Each candidate is reduced
//! against the pivots accepted so far; it is accepted if a nonzero entry
//! remains. This yields `A_B = U R` with `U` the reduced columns (each with a
//! distinct pivot row where all later reduced columns vanish) and `R` unit
//! upper triangular, so `A_B x = b` is solved by one forward reduction of
//! `b` followed by back-substitution in `R`.

use exip_core::CertError;
use num_rational::BigRational;
use num_traits::Zero;
use smallvec::SmallVec;
use thiserror::Error;

/// Errors raised by a column factorization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactorError {
    /// The right-hand side is not in the span of the basis columns.
    #[error("right-hand side is not in the column span")]
    Inconsistent,
    /// A vector has the wrong length.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },
    /// A column references a row outside the matrix.
    #[error("column {column} has entry in row {row}, matrix has {nrows} rows")]
    RowOutOfRange {
        /// Candidate column identifier
        column: usize,
        /// Offending row
        row: usize,
        /// Number of rows
        nrows: usize,
    },
}

impl From<FactorError> for CertError {
    fn from(err: FactorError) -> Self {
        CertError::Factorization(err.to_string())
    }
}

/// A factorized set of basis columns.
pub trait ColumnFactorization: std::fmt::Debug {
    /// Number of rows of the factorized matrix.
    fn num_rows(&self) -> usize;

    /// Identifiers of the accepted columns, in factorization order.
    fn basis(&self) -> &[usize];

    /// Number of accepted columns.
    fn rank(&self) -> usize {
        self.basis().len()
    }

    /// Whether the accepted columns span the full row space.
    fn is_full_rank(&self) -> bool {
        self.rank() == self.num_rows()
    }

    /// Solve `A_B x = rhs`; entry `k` of the result belongs to `basis()[k]`.
    fn solve(&self, rhs: &[BigRational]) -> Result<Vec<BigRational>, FactorError>;
}

/// Incremental Gaussian elimination over candidate columns.
#[derive(Debug, Clone, Default)]
pub struct RationalLu {
    nrows: usize,
    /// Identifiers of accepted columns.
    basis: Vec<usize>,
    /// Pivot row of each accepted column.
    pivot_rows: Vec<usize>,
    /// Reduced accepted columns, dense.
    reduced: Vec<Vec<BigRational>>,
    /// Above-diagonal entries of `R`, stored by column.
    upper: Vec<SmallVec<[(usize, BigRational); 4]>>,
}

impl RationalLu {
    /// Factorize the candidate columns of a matrix with `nrows` rows.
    ///
    /// Each candidate is `(id, entries)` with sparse `(row, value)` entries.
    /// Candidates that depend linearly on earlier ones are skipped.
    pub fn factor<'a, I>(nrows: usize, candidates: I) -> Result<Self, FactorError>
    where
        I: IntoIterator<Item = (usize, &'a [(usize, BigRational)])>,
    {
        let mut lu = Self {
            nrows,
            ..Self::default()
        };
        for (id, entries) in candidates {
            if lu.basis.len() == nrows {
                break;
            }
            let mut dense = vec![BigRational::zero(); nrows];
            for (row, value) in entries {
                if *row >= nrows {
                    return Err(FactorError::RowOutOfRange {
                        column: id,
                        row: *row,
                        nrows,
                    });
                }
                dense[*row] += value;
            }
            let coefs = lu.reduce(&mut dense);
            if let Some(pivot) = dense.iter().position(|v| !v.is_zero()) {
                lu.basis.push(id);
                lu.pivot_rows.push(pivot);
                lu.reduced.push(dense);
                lu.upper.push(
                    coefs
                        .into_iter()
                        .enumerate()
                        .filter(|(_, c)| !c.is_zero())
                        .collect(),
                );
            }
        }
        tracing::trace!(nrows, rank = lu.basis.len(), "rational factorization");
        Ok(lu)
    }

    /// Eliminate the accepted pivots from `v`; returns the multipliers.
    fn reduce(&self, v: &mut [BigRational]) -> Vec<BigRational> {
        let mut coefs = Vec::with_capacity(self.reduced.len());
        for (u, &p) in self.reduced.iter().zip(&self.pivot_rows) {
            if v[p].is_zero() {
                coefs.push(BigRational::zero());
                continue;
            }
            let coef = &v[p] / &u[p];
            for (vi, ui) in v.iter_mut().zip(u) {
                if !ui.is_zero() {
                    *vi -= &coef * ui;
                }
            }
            coefs.push(coef);
        }
        coefs
    }
}

impl ColumnFactorization for RationalLu {
    fn num_rows(&self) -> usize {
        self.nrows
    }

    fn basis(&self) -> &[usize] {
        &self.basis
    }

    fn solve(&self, rhs: &[BigRational]) -> Result<Vec<BigRational>, FactorError> {
        if rhs.len() != self.nrows {
            return Err(FactorError::DimensionMismatch {
                expected: self.nrows,
                got: rhs.len(),
            });
        }
        let mut rest = rhs.to_vec();
        let mut x = self.reduce(&mut rest);
        if rest.iter().any(|v| !v.is_zero()) {
            return Err(FactorError::Inconsistent);
        }
        for l in (0..x.len()).rev() {
            if x[l].is_zero() {
                continue;
            }
            let xl = x[l].clone();
            for (k, r) in &self.upper[l] {
                x[*k] -= r * &xl;
            }
        }
        Ok(x)
    }
}
