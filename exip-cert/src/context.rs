//! Per-run certification state.
//!
//! A [`CertificationContext`] is created once per solver run and passed by
//! reference to every node-level call. It owns the single exact LP, the
//! project-and-shift artifacts, the interval enclosures of the problem data
//! and the certified incumbent. The exact LP and the precomputations are
//! built lazily on first use.

use crate::adapter::ExactLpAdapter;
use crate::certify::IntervalData;
use crate::problem::RationalProblem;
use crate::psdata::PsData;
use crate::solution::SolutionStore;
use exip_core::{
    CertError, CertResult, CertifyConfig, CertifyObserver, NoopObserver, RationalInfinity,
};
use std::time::Instant;

/// Lifecycle of the project-and-shift data.
#[derive(Debug)]
pub(crate) enum PsState {
    /// Not built yet.
    Pending,
    /// Built and usable.
    Ready(Box<PsData>),
    /// Building failed; never retried in this run.
    Failed(String),
}

/// State shared by every certification call of a run.
#[derive(Debug)]
pub struct CertificationContext<O: CertifyObserver = NoopObserver> {
    pub(crate) config: CertifyConfig,
    pub(crate) infinity: RationalInfinity,
    /// Tree node whose bounds are currently applied
    pub(crate) node: Option<u64>,
    pub(crate) lp: Option<ExactLpAdapter>,
    pub(crate) ps: PsState,
    pub(crate) interval: Option<IntervalData>,
    pub(crate) solutions: SolutionStore,
    pub(crate) observer: O,
}

impl CertificationContext<NoopObserver> {
    /// Create a context that collects no statistics.
    pub fn new(config: CertifyConfig) -> CertResult<Self> {
        Self::with_observer(config, NoopObserver)
    }
}

impl<O: CertifyObserver> CertificationContext<O> {
    /// Create a context reporting to `observer`.
    pub fn with_observer(config: CertifyConfig, observer: O) -> CertResult<Self> {
        config.validate()?;
        let infinity = config.infinity_sentinels()?;
        tracing::debug!(method = config.method.name(), "certification context created");
        Ok(Self {
            config,
            infinity,
            node: None,
            lp: None,
            ps: PsState::Pending,
            interval: None,
            solutions: SolutionStore::new(),
            observer,
        })
    }

    /// The configuration.
    pub fn config(&self) -> &CertifyConfig {
        &self.config
    }

    /// The observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Mutable access to the observer.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// The certified incumbent store.
    pub fn solutions(&self) -> &SolutionStore {
        &self.solutions
    }

    /// Fail unless `problem` uses the configured infinity sentinels.
    pub fn check_problem(&self, problem: &RationalProblem) -> CertResult<()> {
        if *problem.infinity() != self.infinity {
            return Err(CertError::InvalidConfig(format!(
                "problem infinity {} differs from configured {}",
                problem.infinity().pos(),
                self.infinity.pos()
            )));
        }
        Ok(())
    }

    /// Whether the exact LP has been built.
    pub fn has_exact_lp(&self) -> bool {
        self.lp.is_some()
    }

    /// The exact LP, built from the current local bounds on first use.
    pub fn adapter_mut(&mut self, problem: &RationalProblem) -> CertResult<&mut ExactLpAdapter> {
        problem.ensure_drained()?;
        let lp = match self.lp.take() {
            Some(lp) => lp,
            None => ExactLpAdapter::construct(problem)?,
        };
        Ok(self.lp.insert(lp))
    }

    /// Whether project-and-shift failed to build in this run.
    pub fn ps_failed(&self) -> bool {
        matches!(self.ps, PsState::Failed(_))
    }

    /// Build the project-and-shift data unless already attempted.
    ///
    /// A failed build is sticky: this and every later call return
    /// [`CertError::ProjectShiftUnavailable`].
    pub fn ensure_ps(&mut self, problem: &RationalProblem) -> CertResult<&PsData> {
        if matches!(self.ps, PsState::Pending) {
            let start = Instant::now();
            let built = PsData::build(problem, &self.config);
            let elapsed = start.elapsed();
            self.observer.on_ps_build(built.is_ok(), elapsed);
            self.ps = match built {
                Ok(data) => {
                    tracing::info!(
                        included = data.num_included(),
                        slack = %data.common_slack(),
                        ?elapsed,
                        "project-and-shift data built"
                    );
                    PsState::Ready(Box::new(data))
                }
                Err(err) => {
                    tracing::warn!(%err, "project-and-shift disabled for this run");
                    PsState::Failed(err.to_string())
                }
            };
        }
        match &self.ps {
            PsState::Ready(data) => Ok(data.as_ref()),
            PsState::Failed(reason) => Err(CertError::ProjectShiftUnavailable(reason.clone())),
            PsState::Pending => Err(CertError::ProjectShiftUnavailable("not built".into())),
        }
    }

    /// Interval enclosures of the problem data, built on first use.
    pub fn interval_data(&mut self, problem: &RationalProblem) -> &IntervalData {
        let data = match self.interval.take() {
            Some(data) if data.matches(problem) => data,
            _ => IntervalData::new(problem),
        };
        self.interval.insert(data)
    }

    /// Apply pending bound changes and push them into the exact LP.
    ///
    /// Returns the sorted indices of variables whose bounds changed.
    pub fn drain_bound_changes(&mut self, problem: &mut RationalProblem) -> CertResult<Vec<usize>> {
        let touched = problem.drain_bound_changes();
        if let Some(lp) = self.lp.as_mut() {
            lp.sync_bounds(problem, &touched)?;
        }
        Ok(touched)
    }

    /// Open a new tree level.
    pub fn push_level(&mut self, problem: &mut RationalProblem) {
        problem.push_level();
    }

    /// Return to the local bounds of `depth`, keeping the exact LP in sync.
    pub fn backtrack_to(
        &mut self,
        problem: &mut RationalProblem,
        depth: usize,
    ) -> CertResult<Vec<usize>> {
        self.node = None;
        let touched = problem.backtrack_to(depth)?;
        if let Some(lp) = self.lp.as_mut() {
            lp.sync_bounds(problem, &touched)?;
        }
        Ok(touched)
    }
}
