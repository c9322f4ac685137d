//! Project-and-shift precomputation.
//!
//! Built once per run from the global problem:
//!
//! 1. select the included extended dual columns `S`,
//! 2. factorize the included columns of `D` to get a projection basis,
//! 3. solve an auxiliary LP for a dual feasible point that is strictly
//!    positive on `S`, together with its smallest included component.
//!
//! The point only depends on `D` and `c`, so it stays feasible under any
//! local bounds; columns in `S` have finite global sides and therefore
//! finite local sides.

use crate::adapter::ExactLpAdapter;
use crate::certify::ExtendedLayout;
use crate::problem::{BoundScope, RationalProblem};
use exip_core::rational::rat;
use exip_core::{CertError, CertResult, CertifyConfig, PsDualColumns, PsInteriorPoint};
use exip_math::{
    ColumnFactorization, ExactLp, LpStatus, RationalLu, RationalSimplex, SimplexAlgorithm,
};
use num_rational::BigRational;
use num_traits::{Signed, Zero};

/// Artifacts shared by every project-and-shift certification of a run.
#[derive(Debug)]
pub struct PsData {
    layout: ExtendedLayout,
    interior: Vec<BigRational>,
    included: Vec<bool>,
    basis: Vec<usize>,
    factor: Box<dyn ColumnFactorization>,
    common_slack: BigRational,
}

fn unavailable(reason: impl Into<String>) -> CertError {
    CertError::ProjectShiftUnavailable(reason.into())
}

impl PsData {
    /// Build the data; any failure is reported as
    /// [`CertError::ProjectShiftUnavailable`].
    pub fn build(problem: &RationalProblem, config: &CertifyConfig) -> CertResult<Self> {
        let layout = ExtendedLayout::new(problem);
        let included = match config.ps_dual_columns {
            PsDualColumns::Finite => (0..layout.len())
                .map(|k| layout.is_finite(problem, k, BoundScope::Global))
                .collect(),
            PsDualColumns::Active => active_columns(problem, &layout)?,
        };
        let columns: Vec<(usize, Vec<(usize, BigRational)>)> = (0..layout.len())
            .filter(|&k| included[k])
            .map(|k| (k, layout.entries(problem, k)))
            .collect();
        tracing::debug!(included = columns.len(), "project-and-shift columns");

        let nvars = problem.num_vars();
        let factor = RationalLu::factor(
            nvars,
            columns.iter().map(|(k, entries)| (*k, entries.as_slice())),
        )
        .map_err(|e| unavailable(format!("factorization failed: {e}")))?;
        if !factor.is_full_rank() {
            return Err(unavailable(format!(
                "included columns have rank {} < {nvars}",
                factor.rank()
            )));
        }

        let (point, slack) = max_slack_point(problem, &columns)?;
        let point = match config.ps_interior {
            PsInteriorPoint::MaxSlack => point,
            PsInteriorPoint::OptimizeWithMargin => {
                let margin = slack / rat(2);
                match optimized_point(problem, &layout, &columns, &margin)? {
                    Some(better) => better,
                    None => {
                        tracing::debug!("margin LP failed, keeping max-slack point");
                        point
                    }
                }
            }
        };

        let mut interior = vec![BigRational::zero(); layout.len()];
        for ((k, _), value) in columns.iter().zip(point) {
            interior[*k] = value;
        }
        let common_slack = columns
            .iter()
            .map(|(k, _)| &interior[*k])
            .min()
            .cloned()
            .unwrap_or_else(BigRational::zero);
        if columns.is_empty() || !common_slack.is_positive() {
            return Err(unavailable("no strictly interior dual point"));
        }

        Ok(Self {
            layout,
            interior,
            included,
            basis: factor.basis().to_vec(),
            factor: Box::new(factor),
            common_slack,
        })
    }

    /// Extended column layout the data was built for.
    pub fn layout(&self) -> &ExtendedLayout {
        &self.layout
    }

    /// The interior dual point, indexed by extended column.
    pub fn interior(&self) -> &[BigRational] {
        &self.interior
    }

    /// Whether extended column `k` is included.
    pub fn is_included(&self, k: usize) -> bool {
        self.included.get(k).copied().unwrap_or(false)
    }

    /// Number of included columns.
    pub fn num_included(&self) -> usize {
        self.included.iter().filter(|b| **b).count()
    }

    /// Extended columns of the projection basis.
    pub fn basis(&self) -> &[usize] {
        &self.basis
    }

    /// Factorization of the projection basis.
    pub fn factor(&self) -> &dyn ColumnFactorization {
        self.factor.as_ref()
    }

    /// Smallest included component of the interior point.
    pub fn common_slack(&self) -> &BigRational {
        &self.common_slack
    }
}

/// Columns of sides active at an exact optimum of the global LP.
fn active_columns(problem: &RationalProblem, layout: &ExtendedLayout) -> CertResult<Vec<bool>> {
    let mut lp = ExactLpAdapter::construct_with(
        problem,
        Box::new(RationalSimplex::new()),
        BoundScope::Global,
    )?;
    let status = lp.solve(SimplexAlgorithm::Primal)?;
    if status != LpStatus::Optimal {
        return Err(unavailable(format!("reference LP ended with {status:?}")));
    }
    let x = lp.primal()?;
    let m = problem.num_rows();
    let mut active = vec![false; layout.len()];
    for i in 0..m {
        let activity = problem.row_activity(i, &x);
        active[i] = problem.finite_lhs(i) == Some(&activity);
        active[m + i] = problem.finite_rhs(i) == Some(&activity);
    }
    for (j, xj) in x.iter().enumerate() {
        active[2 * m + j] = problem.finite_lb(BoundScope::Global, j) == Some(xj);
        active[2 * m + problem.num_vars() + j] = problem.finite_ub(BoundScope::Global, j) == Some(xj);
    }
    Ok(active)
}

/// Rows `sum_k D_jk w_k = c_j` over the included columns.
fn equality_rows(
    problem: &RationalProblem,
    columns: &[(usize, Vec<(usize, BigRational)>)],
) -> Vec<Vec<(usize, BigRational)>> {
    let mut rows = vec![Vec::new(); problem.num_vars()];
    for (pos, (_, entries)) in columns.iter().enumerate() {
        for (j, value) in entries {
            rows[*j].push((pos, value.clone()));
        }
    }
    rows
}

/// Solve `max s  s.t.  D_S w = c, w_k >= s, 0 <= s <= 1`.
fn max_slack_point(
    problem: &RationalProblem,
    columns: &[(usize, Vec<(usize, BigRational)>)],
) -> CertResult<(Vec<BigRational>, BigRational)> {
    let nincl = columns.len();
    let mut lp = RationalSimplex::new();
    lp.reserve(nincl + 1, problem.num_vars() + nincl)?;
    for _ in 0..nincl {
        lp.add_col(BigRational::zero(), Some(BigRational::zero()), None)?;
    }
    let s = lp.add_col(rat(-1), Some(BigRational::zero()), Some(rat(1)))?;
    for (row, c) in equality_rows(problem, columns).iter().zip(problem.objective()) {
        lp.add_row(row, Some(c.clone()), Some(c.clone()))?;
    }
    for pos in 0..nincl {
        lp.add_row(&[(pos, rat(1)), (s, rat(-1))], Some(BigRational::zero()), None)?;
    }
    let status = lp.solve(SimplexAlgorithm::Primal)?;
    if status != LpStatus::Optimal {
        return Err(unavailable(format!("auxiliary LP ended with {status:?}")));
    }
    let mut values = lp.primal()?;
    let slack = values.pop().unwrap_or_else(BigRational::zero);
    if !slack.is_positive() {
        return Err(unavailable("auxiliary LP has no positive slack"));
    }
    Ok((values, slack))
}

/// Solve `max d_S^T w  s.t.  D_S w = c, w_k >= margin`.
///
/// Returns `None` if the LP has no optimum.
fn optimized_point(
    problem: &RationalProblem,
    layout: &ExtendedLayout,
    columns: &[(usize, Vec<(usize, BigRational)>)],
    margin: &BigRational,
) -> CertResult<Option<Vec<BigRational>>> {
    let mut lp = RationalSimplex::new();
    lp.reserve(columns.len(), problem.num_vars())?;
    for (k, _) in columns {
        let cost = layout
            .cost(problem, *k, BoundScope::Global)
            .ok_or_else(|| unavailable("included column has an infinite side"))?;
        lp.add_col(-cost, Some(margin.clone()), None)?;
    }
    for (row, c) in equality_rows(problem, columns).iter().zip(problem.objective()) {
        lp.add_row(row, Some(c.clone()), Some(c.clone()))?;
    }
    Ok(match lp.solve(SimplexAlgorithm::Primal)? {
        LpStatus::Optimal => Some(lp.primal()?),
        _ => None,
    })
}
