//! Statistics collection for bound certification.
//!
//! Statistics are gathered through the [`CertifyObserver`] trait. Every
//! method has an empty default body, so [`NoopObserver`] costs nothing and a
//! run collects statistics only when it is handed a recording observer such
//! as [`CertifyStats`].

use crate::config::DualBoundMethod;
use std::fmt;
use std::time::Duration;

/// Receives events from the certification layer.
pub trait CertifyObserver {
    /// A bound certification attempt finished.
    fn on_certify(&mut self, _method: DualBoundMethod, _success: bool, _elapsed: Duration) {}

    /// An infeasibility proof attempt finished.
    fn on_infeasibility_proof(
        &mut self,
        _method: DualBoundMethod,
        _success: bool,
        _elapsed: Duration,
    ) {
    }

    /// An exact LP solve finished.
    fn on_exact_solve(&mut self, _iterations: u64, _elapsed: Duration) {}

    /// Project-and-shift data was built (or failed to build).
    fn on_ps_build(&mut self, _success: bool, _elapsed: Duration) {}

    /// A method was unavailable and the next one is tried.
    fn on_fallback(&mut self, _from: DualBoundMethod, _to: DualBoundMethod) {}

    /// No method succeeded and the pseudo-objective was used.
    fn on_pseudo_objective(&mut self) {}

    /// Relative gap between a certified bound and the exact LP bound.
    fn on_bound_quality(&mut self, _relative_gap: f64) {}

    /// An LP solution claimed integral by the approximate solver was not.
    fn on_wrong_integral_claim(&mut self) {}
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CertifyObserver for NoopObserver {}

/// Per-method counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodStats {
    /// Certification calls.
    pub calls: u64,
    /// Calls that did not yield a bound.
    pub failures: u64,
    /// Total time spent.
    pub time: Duration,
    /// Infeasibility proof calls.
    pub infeas_calls: u64,
    /// Infeasibility proofs that failed.
    pub infeas_failures: u64,
    /// Total time spent on infeasibility proofs.
    pub infeas_time: Duration,
}

/// Gap buckets for certified bounds compared with exact LP bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundQuality {
    /// Relative gap exactly zero.
    pub zero: u64,
    /// Relative gap at most `1e-9`.
    pub small: u64,
    /// Relative gap at most `1e-3`.
    pub medium: u64,
    /// Larger relative gap.
    pub large: u64,
}

impl BoundQuality {
    /// Record one relative gap.
    pub fn record(&mut self, gap: f64) {
        if gap <= 0.0 {
            self.zero += 1;
        } else if gap <= 1e-9 {
            self.small += 1;
        } else if gap <= 1e-3 {
            self.medium += 1;
        } else {
            self.large += 1;
        }
    }

    /// Whether any gap has been recorded.
    pub fn is_measured(&self) -> bool {
        self.zero + self.small + self.medium + self.large > 0
    }
}

/// Recording observer with counters for every event.
#[derive(Debug, Clone, Default)]
pub struct CertifyStats {
    methods: [MethodStats; 5],
    /// Fallbacks taken.
    pub fallbacks: u64,
    /// Nodes where only the pseudo-objective was available.
    pub pseudo_objective_bounds: u64,
    /// Exact LP solves.
    pub exact_solves: u64,
    /// Exact simplex iterations.
    pub exact_iterations: u64,
    /// Time spent in exact LP solves.
    pub exact_time: Duration,
    /// Project-and-shift build outcome, if a build was attempted.
    pub ps_built: Option<bool>,
    /// Time spent building project-and-shift data.
    pub ps_build_time: Duration,
    /// Approximate integral claims that were fractional in exact arithmetic.
    pub wrong_integral_claims: u64,
    /// Bound quality buckets.
    pub quality: BoundQuality,
}

fn method_slot(method: DualBoundMethod) -> usize {
    match method {
        DualBoundMethod::ExactResolve => 0,
        DualBoundMethod::ProjectShift => 1,
        DualBoundMethod::IntervalNs => 2,
        DualBoundMethod::ExactNs => 3,
        DualBoundMethod::Auto => 4,
    }
}

impl CertifyStats {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for one method.
    pub fn method(&self, method: DualBoundMethod) -> &MethodStats {
        &self.methods[method_slot(method)]
    }

    /// Total certification calls over all methods.
    pub fn total_calls(&self) -> u64 {
        self.methods.iter().map(|m| m.calls).sum()
    }

    /// Reset all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl CertifyObserver for CertifyStats {
    fn on_certify(&mut self, method: DualBoundMethod, success: bool, elapsed: Duration) {
        let slot = &mut self.methods[method_slot(method)];
        slot.calls += 1;
        slot.time += elapsed;
        if !success {
            slot.failures += 1;
        }
    }

    fn on_infeasibility_proof(&mut self, method: DualBoundMethod, success: bool, elapsed: Duration) {
        let slot = &mut self.methods[method_slot(method)];
        slot.infeas_calls += 1;
        slot.infeas_time += elapsed;
        if !success {
            slot.infeas_failures += 1;
        }
    }

    fn on_exact_solve(&mut self, iterations: u64, elapsed: Duration) {
        self.exact_solves += 1;
        self.exact_iterations += iterations;
        self.exact_time += elapsed;
    }

    fn on_ps_build(&mut self, success: bool, elapsed: Duration) {
        self.ps_built = Some(success);
        self.ps_build_time += elapsed;
    }

    fn on_fallback(&mut self, _from: DualBoundMethod, _to: DualBoundMethod) {
        self.fallbacks += 1;
    }

    fn on_pseudo_objective(&mut self) {
        self.pseudo_objective_bounds += 1;
    }

    fn on_bound_quality(&mut self, relative_gap: f64) {
        self.quality.record(relative_gap);
    }

    fn on_wrong_integral_claim(&mut self) {
        self.wrong_integral_claims += 1;
    }
}

impl fmt::Display for CertifyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Certification      :      calls   failures       time")?;
        for method in [
            DualBoundMethod::ExactResolve,
            DualBoundMethod::ProjectShift,
            DualBoundMethod::IntervalNs,
            DualBoundMethod::ExactNs,
        ] {
            let m = self.method(method);
            writeln!(
                f,
                "  {:<17}: {:>10} {:>10} {:>9.3}s",
                method.name(),
                m.calls,
                m.failures,
                m.time.as_secs_f64()
            )?;
        }
        writeln!(
            f,
            "  exact LP         : {:>10} solves, {} iterations",
            self.exact_solves, self.exact_iterations
        )?;
        write!(
            f,
            "  fallbacks        : {:>10} (pseudo-objective {})",
            self.fallbacks, self.pseudo_objective_bounds
        )?;
        if self.quality.is_measured() {
            write!(
                f,
                "\n  bound quality    : zero {} small {} medium {} large {}",
                self.quality.zero, self.quality.small, self.quality.medium, self.quality.large
            )?;
        }
        Ok(())
    }
}
