//! Builder for [`RationalProblem`].

use super::{BoundLog, BoundTrail, ObjSense, PseudoObjective, RationalProblem, VarKind};
use exip_core::{CertError, CertResult, CertifyConfig, RationalInfinity};
use num_rational::BigRational;
use num_traits::Zero;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct VarData {
    name: String,
    obj: BigRational,
    lb: Option<BigRational>,
    ub: Option<BigRational>,
    kind: VarKind,
}

#[derive(Debug, Clone)]
struct RowData {
    name: String,
    entries: Vec<(usize, BigRational)>,
    lhs: Option<BigRational>,
    rhs: Option<BigRational>,
}

/// Incremental builder of an exact problem.
///
/// Bounds and sides are given as `Option`, with `None` for infinite. Values
/// at or beyond the infinity sentinels are also treated as infinite.
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    sense: ObjSense,
    offset: BigRational,
    infinity: RationalInfinity,
    vars: Vec<VarData>,
    rows: Vec<RowData>,
}

impl ProblemBuilder {
    /// Create a builder with the default infinity sentinels.
    pub fn new(sense: ObjSense) -> Self {
        Self {
            sense,
            offset: BigRational::zero(),
            infinity: RationalInfinity::default(),
            vars: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Create a builder using the infinity of a configuration.
    pub fn with_config(sense: ObjSense, config: &CertifyConfig) -> CertResult<Self> {
        Ok(Self::new(sense).infinity(config.infinity_sentinels()?))
    }

    /// Set the infinity sentinels.
    pub fn infinity(mut self, infinity: RationalInfinity) -> Self {
        self.infinity = infinity;
        self
    }

    /// Set the constant objective offset (original space).
    pub fn objective_offset(mut self, offset: BigRational) -> Self {
        self.offset = offset;
        self
    }

    /// Add a variable; returns its index.
    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        obj: BigRational,
        lb: Option<BigRational>,
        ub: Option<BigRational>,
        kind: VarKind,
    ) -> usize {
        self.vars.push(VarData {
            name: name.into(),
            obj,
            lb,
            ub,
            kind,
        });
        self.vars.len() - 1
    }

    /// Add a row `lhs <= sum entries <= rhs`; returns its index.
    ///
    /// Repeated columns are merged and zero coefficients dropped.
    pub fn add_row(
        &mut self,
        name: impl Into<String>,
        entries: &[(usize, BigRational)],
        lhs: Option<BigRational>,
        rhs: Option<BigRational>,
    ) -> CertResult<usize> {
        let mut merged: FxHashMap<usize, BigRational> = FxHashMap::default();
        let mut order = Vec::with_capacity(entries.len());
        for (col, value) in entries {
            if *col >= self.vars.len() {
                return Err(CertError::InvalidVariable(*col));
            }
            let slot = merged.entry(*col).or_insert_with(|| {
                order.push(*col);
                BigRational::zero()
            });
            *slot += value;
        }
        let entries = order
            .into_iter()
            .filter_map(|col| merged.remove(&col).map(|v| (col, v)))
            .filter(|(_, v)| !v.is_zero())
            .collect();
        self.rows.push(RowData {
            name: name.into(),
            entries,
            lhs,
            rhs,
        });
        Ok(self.rows.len() - 1)
    }

    /// Number of variables added so far.
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    fn lower(&self, value: Option<BigRational>) -> BigRational {
        match value {
            Some(v) if !self.infinity.is_neg_inf(&v) => self.infinity.normalize(v),
            _ => self.infinity.neg().clone(),
        }
    }

    fn upper(&self, value: Option<BigRational>) -> BigRational {
        match value {
            Some(v) if !self.infinity.is_pos_inf(&v) => self.infinity.normalize(v),
            _ => self.infinity.pos().clone(),
        }
    }

    /// Validate the data and create the problem.
    ///
    /// Finite bounds of integer variables are rounded inward.
    pub fn build(self) -> CertResult<RationalProblem> {
        let nvars = self.vars.len();
        let mut obj = Vec::with_capacity(nvars);
        let mut kinds = Vec::with_capacity(nvars);
        let mut names = Vec::with_capacity(nvars);
        let mut lbs = Vec::with_capacity(nvars);
        let mut ubs = Vec::with_capacity(nvars);

        for (j, var) in self.vars.iter().enumerate() {
            let mut lb = self.lower(var.lb.clone());
            let mut ub = self.upper(var.ub.clone());
            if var.kind == VarKind::Integer {
                if !self.infinity.is_infinite(&lb) {
                    lb = lb.ceil();
                }
                if !self.infinity.is_infinite(&ub) {
                    ub = ub.floor();
                }
            }
            if lb > ub {
                return Err(CertError::InvalidProblem(format!(
                    "variable {} ({}) has empty domain [{lb}, {ub}]",
                    j, var.name
                )));
            }
            obj.push(match self.sense {
                ObjSense::Minimize => var.obj.clone(),
                ObjSense::Maximize => -var.obj.clone(),
            });
            kinds.push(var.kind);
            names.push(var.name.clone());
            lbs.push(lb);
            ubs.push(ub);
        }

        let nrows = self.rows.len();
        let mut row_begin = Vec::with_capacity(nrows);
        let mut row_len = Vec::with_capacity(nrows);
        let mut entries = Vec::new();
        let mut lhs = Vec::with_capacity(nrows);
        let mut rhs = Vec::with_capacity(nrows);
        let mut row_names = Vec::with_capacity(nrows);
        for (i, row) in self.rows.iter().enumerate() {
            let l = self.lower(row.lhs.clone());
            let r = self.upper(row.rhs.clone());
            if l > r {
                return Err(CertError::InvalidProblem(format!(
                    "row {} ({}) has lhs {l} above rhs {r}",
                    i, row.name
                )));
            }
            row_begin.push(entries.len());
            row_len.push(row.entries.len());
            entries.extend(row.entries.iter().cloned());
            lhs.push(l);
            rhs.push(r);
            row_names.push(row.name.clone());
        }

        let pseudo = PseudoObjective::compute(&obj, &lbs, &ubs, &self.infinity);
        tracing::debug!(nvars, nrows, nnonz = entries.len(), "built exact problem");
        Ok(RationalProblem {
            sense: self.sense,
            obj_offset: self.offset,
            obj,
            kinds,
            names,
            local_lb: lbs.clone(),
            local_ub: ubs.clone(),
            global_lb: lbs,
            global_ub: ubs,
            row_begin,
            row_len,
            entries,
            lhs,
            rhs,
            row_names,
            infinity: self.infinity,
            log: BoundLog::new(nvars),
            pseudo,
            trail: BoundTrail::new(),
        })
    }
}
