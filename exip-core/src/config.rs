//! Configuration for bound certification.

use crate::error::{CertError, CertResult};
use crate::rational::RationalInfinity;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Method used to turn an approximate dual solution into a certified bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DualBoundMethod {
    /// Load the approximate basis into the exact LP and verify or re-solve it.
    ExactResolve,
    /// Project onto the dual equalities and shift toward an interior point.
    #[default]
    ProjectShift,
    /// Neumaier-Shcherbina bound in directed-rounding interval arithmetic.
    IntervalNs,
    /// Neumaier-Shcherbina bound in exact rational arithmetic.
    ExactNs,
    /// Pick one of the above per node.
    Auto,
}

impl DualBoundMethod {
    /// Short lowercase name, used in log events and statistics.
    pub fn name(self) -> &'static str {
        match self {
            DualBoundMethod::ExactResolve => "exact_resolve",
            DualBoundMethod::ProjectShift => "project_shift",
            DualBoundMethod::IntervalNs => "interval_ns",
            DualBoundMethod::ExactNs => "exact_ns",
            DualBoundMethod::Auto => "auto",
        }
    }
}

/// Which extended dual columns the interior point must be positive on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PsDualColumns {
    /// Every column whose cost is finite in the global bounds.
    #[default]
    Finite,
    /// Columns of constraints active at a reference exact optimum.
    Active,
}

/// Auxiliary LP used to compute the interior point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PsInteriorPoint {
    /// Maximize the smallest included component.
    #[default]
    MaxSlack,
    /// Maximize the dual objective while keeping half the maximal slack.
    OptimizeWithMargin,
}

/// How the shift coefficient is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PsShift {
    /// Largest coefficient that keeps each negative component non-negative.
    #[default]
    PerComponent,
    /// Single ratio `slack / (slack - min component)`.
    Global,
}

/// How the exact resolve strategy treats the loaded basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    /// Accept the loaded basis only if it is dual feasible in exact arithmetic.
    Verify,
    /// Run the exact simplex from the loaded basis.
    #[default]
    Resolve,
}

/// Configuration for bound certification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertifyConfig {
    /// Certification method.
    pub method: DualBoundMethod,
    /// Try the remaining methods when the selected one is unavailable.
    pub fallback: bool,
    /// Magnitude treated as infinite in problem data.
    pub infinity: f64,
    /// Column selection for the project-and-shift interior point.
    pub ps_dual_columns: PsDualColumns,
    /// Auxiliary LP formulation for the interior point.
    pub ps_interior: PsInteriorPoint,
    /// Shift coefficient rule.
    pub ps_shift: PsShift,
    /// Cancel opposing lhs/rhs and lb/ub components after the shift.
    pub ps_cancel_pairs: bool,
    /// Exact resolve behavior.
    pub resolve_mode: ResolveMode,
    /// Simplex iteration limit for an exact resolve.
    pub resolve_iteration_limit: Option<u64>,
    /// Time limit for each exact LP solve, in seconds.
    pub lp_time_limit_secs: Option<f64>,
    /// Record the gap between certified and exact LP bounds.
    pub measure_quality: bool,
}

impl Default for CertifyConfig {
    fn default() -> Self {
        Self {
            method: DualBoundMethod::ProjectShift,
            fallback: true,
            infinity: 1e20,
            ps_dual_columns: PsDualColumns::Finite,
            ps_interior: PsInteriorPoint::MaxSlack,
            ps_shift: PsShift::PerComponent,
            ps_cancel_pairs: true,
            resolve_mode: ResolveMode::Resolve,
            resolve_iteration_limit: None,
            lp_time_limit_secs: None,
            measure_quality: false,
        }
    }
}

impl CertifyConfig {
    /// Configuration using `method` and defaults for everything else.
    pub fn with_method(method: DualBoundMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Check the configuration for consistency.
    pub fn validate(&self) -> CertResult<()> {
        RationalInfinity::new(self.infinity)?;
        if let Some(secs) = self.lp_time_limit_secs
            && !(secs.is_finite() && secs > 0.0)
        {
            return Err(CertError::InvalidConfig(format!(
                "lp_time_limit_secs must be positive, got {secs}"
            )));
        }
        Ok(())
    }

    /// Infinity sentinels derived from [`CertifyConfig::infinity`].
    pub fn infinity_sentinels(&self) -> CertResult<RationalInfinity> {
        RationalInfinity::new(self.infinity)
    }

    /// Exact LP time limit as a duration.
    pub fn lp_time_limit(&self) -> Option<Duration> {
        self.lp_time_limit_secs.map(Duration::from_secs_f64)
    }
}
