//! Node-level entry points.
//!
//! The surrounding tree search calls these once per node:
//!
//! - [`CertificationContext::enter_node`] aligns the bound trail with the
//!   node depth before the node's bound changes are recorded; trees that
//!   report node identity are followed automatically instead,
//! - [`CertificationContext::process_node`] certifies a lower bound and
//!   reports it to the tree (or prunes the node),
//! - [`CertificationContext::certify_infeasibility`] proves an approximately
//!   infeasible node infeasible,
//! - [`CertificationContext::enforce_integrality`] solves the node LP exactly
//!   and either accepts an integral solution or branches.

use crate::approx::ApproxLp;
use crate::branch::{BranchDecision, check_integrality};
use crate::certify::{
    CertifiedBound, CertifyOutcome, exact_ns, interval_ns, project_shift, resolve,
};
use crate::context::{CertificationContext, PsState};
use crate::problem::{PendingChange, RationalProblem};
use crate::solution::CertifiedSolution;
use crate::tree::TreeManager;
use exip_core::rational::{to_f64_checked, to_f64_down, to_f64_nearest};
use exip_core::{CertError, CertResult, CertifyObserver, DualBoundMethod};
use exip_math::{LpStatus, SimplexAlgorithm};
use num_rational::BigRational;
use num_traits::{One, Signed};
use std::time::Instant;

/// Fixed order in which unavailable methods are replaced.
const FALLBACK_ORDER: [DualBoundMethod; 4] = [
    DualBoundMethod::ProjectShift,
    DualBoundMethod::IntervalNs,
    DualBoundMethod::ExactNs,
    DualBoundMethod::ExactResolve,
];

/// Lower bound information for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeBound {
    /// A bound certified by one strategy.
    Certified(CertifiedBound),
    /// The node LP is proven infeasible.
    Infeasible {
        /// Strategy that proved it
        method: DualBoundMethod,
    },
    /// No strategy succeeded; the finite pseudo-objective bounds the node.
    PseudoObjective(BigRational),
    /// Nothing is known.
    Unknown,
}

impl NodeBound {
    /// Largest float that is a valid lower bound, if any.
    ///
    /// Infeasible nodes have bound `+inf`.
    pub fn safe_lower_bound(&self) -> Option<f64> {
        match self {
            NodeBound::Certified(bound) => Some(bound.safe_lower()),
            NodeBound::Infeasible { .. } => Some(f64::INFINITY),
            NodeBound::PseudoObjective(value) => Some(to_f64_down(value)),
            NodeBound::Unknown => None,
        }
    }

    /// Exact bound value, if finite.
    pub fn exact_value(&self) -> Option<&BigRational> {
        match self {
            NodeBound::Certified(bound) => Some(&bound.value),
            NodeBound::PseudoObjective(value) => Some(value),
            NodeBound::Infeasible { .. } | NodeBound::Unknown => None,
        }
    }
}

/// Result of enforcing integrality at a node.
#[derive(Debug, Clone, PartialEq)]
pub enum EnforceResult {
    /// Two children were created on a fractional variable.
    Branched {
        /// Branching variable
        var: usize,
    },
    /// The exact LP optimum is integral; it was stored and the node closed.
    Integral {
        /// Objective of the solution in original space
        objective: BigRational,
        /// Internal objective rounded up to a float
        safe_objective: f64,
    },
    /// The node LP is infeasible or cannot beat the incumbent.
    Cutoff,
    /// The exact solve stopped early.
    Unresolved(LpStatus),
}

impl<O: CertifyObserver> CertificationContext<O> {
    /// Method to start with at this node.
    pub fn select_method(&self, problem: &RationalProblem) -> DualBoundMethod {
        match self.config.method {
            DualBoundMethod::Auto => {
                if problem.pseudo_objective().infinite_count() == 0 {
                    DualBoundMethod::IntervalNs
                } else if !self.ps_failed() {
                    DualBoundMethod::ProjectShift
                } else {
                    DualBoundMethod::ExactResolve
                }
            }
            method => method,
        }
    }

    fn method_chain(&self, start: DualBoundMethod) -> Vec<DualBoundMethod> {
        let mut chain = vec![start];
        if self.config.fallback {
            chain.extend(FALLBACK_ORDER.iter().copied().filter(|m| *m != start));
        }
        chain
    }

    fn attempt(
        &mut self,
        method: DualBoundMethod,
        problem: &RationalProblem,
        approx: &mut dyn ApproxLp,
        infeasible: bool,
    ) -> CertResult<CertifyOutcome> {
        match method {
            DualBoundMethod::ExactResolve => {
                self.adapter_mut(problem)?;
                let Some(lp) = self.lp.as_mut() else {
                    return Ok(CertifyOutcome::unavailable("no exact LP"));
                };
                if infeasible {
                    resolve::certify_infeasible(problem, lp, approx, &self.config, &mut self.observer)
                } else {
                    resolve::certify(problem, lp, approx, &self.config, &mut self.observer)
                }
            }
            DualBoundMethod::ProjectShift => {
                self.ensure_ps(problem)?;
                let PsState::Ready(ps) = &self.ps else {
                    return Ok(CertifyOutcome::unavailable("no project-and-shift data"));
                };
                if infeasible {
                    project_shift::certify_infeasible(problem, ps, approx)
                } else {
                    project_shift::certify(problem, ps, approx, &self.config)
                }
            }
            DualBoundMethod::IntervalNs => {
                let data = self.interval_data(problem);
                if infeasible {
                    interval_ns::certify_infeasible(problem, data, approx)
                } else {
                    interval_ns::certify(problem, data, approx)
                }
            }
            DualBoundMethod::ExactNs => {
                if infeasible {
                    exact_ns::certify_infeasible(problem, approx)
                } else {
                    exact_ns::certify(problem, approx)
                }
            }
            DualBoundMethod::Auto => {
                let method = self.select_method(problem);
                self.attempt(method, problem, approx, infeasible)
            }
        }
    }

    /// Run the method chain; returns the first successful outcome.
    fn run_chain(
        &mut self,
        problem: &mut RationalProblem,
        approx: &mut dyn ApproxLp,
        infeasible: bool,
    ) -> CertResult<Option<(DualBoundMethod, CertifyOutcome)>> {
        self.check_problem(problem)?;
        self.drain_bound_changes(problem)?;
        let chain = self.method_chain(self.select_method(problem));
        for (pos, &method) in chain.iter().enumerate() {
            let start = Instant::now();
            let outcome = match self.attempt(method, problem, approx, infeasible) {
                Ok(outcome) => outcome,
                Err(err) if err.is_recoverable() => CertifyOutcome::Unavailable(err.to_string()),
                Err(err) => return Err(err),
            };
            let elapsed = start.elapsed();
            let success = match &outcome {
                CertifyOutcome::Bound(_) => !infeasible,
                CertifyOutcome::Infeasible => true,
                CertifyOutcome::Unavailable(_) => false,
            };
            if infeasible {
                self.observer.on_infeasibility_proof(method, success, elapsed);
            } else {
                self.observer.on_certify(method, success, elapsed);
            }
            if success {
                return Ok(Some((method, outcome)));
            }
            if let CertifyOutcome::Unavailable(reason) = &outcome {
                tracing::debug!(method = method.name(), %reason, "certification unavailable");
            }
            if let Some(&next) = chain.get(pos + 1) {
                tracing::debug!(from = method.name(), to = next.name(), "falling back");
                self.observer.on_fallback(method, next);
            }
        }
        Ok(None)
    }

    /// Certify a lower bound for the current node.
    ///
    /// Pending bound changes are drained first. Without a certified bound
    /// the finite pseudo-objective is used.
    pub fn certify_bound(
        &mut self,
        problem: &mut RationalProblem,
        approx: &mut dyn ApproxLp,
    ) -> CertResult<NodeBound> {
        match self.run_chain(problem, approx, false)? {
            Some((_, CertifyOutcome::Bound(bound))) => {
                if self.config.measure_quality {
                    self.measure_quality(problem, &bound.value)?;
                }
                Ok(NodeBound::Certified(bound))
            }
            Some((method, _)) => Ok(NodeBound::Infeasible { method }),
            None => match problem.pseudo_objective().value() {
                Some(value) => {
                    tracing::warn!(%value, "no certified bound, using pseudo-objective");
                    self.observer.on_pseudo_objective();
                    Ok(NodeBound::PseudoObjective(value.clone()))
                }
                None => Ok(NodeBound::Unknown),
            },
        }
    }

    /// Prove the current node infeasible from the approximate Farkas ray.
    pub fn certify_infeasibility(
        &mut self,
        problem: &mut RationalProblem,
        approx: &mut dyn ApproxLp,
    ) -> CertResult<NodeBound> {
        Ok(match self.run_chain(problem, approx, true)? {
            Some((method, _)) => NodeBound::Infeasible { method },
            None => NodeBound::Unknown,
        })
    }

    /// Compare a certified bound with the exact LP optimum.
    fn measure_quality(&mut self, problem: &RationalProblem, bound: &BigRational) -> CertResult<()> {
        let lp = self.adapter_mut(problem)?;
        lp.set_limits(None, None, None);
        let status = lp.solve(SimplexAlgorithm::Dual)?;
        let (iterations, elapsed) = lp.last_solve();
        let exact = match status {
            LpStatus::Optimal => Some(lp.objective_value()?),
            _ => None,
        };
        self.observer.on_exact_solve(iterations, elapsed);
        if let Some(exact) = exact {
            let scale = exact.abs().max(BigRational::one());
            let gap = (&exact - bound).abs() / scale;
            self.observer.on_bound_quality(to_f64_nearest(&gap));
        }
        Ok(())
    }

    /// Align the bound trail with a node at `depth`.
    ///
    /// Bounds of deeper levels are restored and a fresh level is opened for
    /// the node, so its bound changes are undone when the search leaves it.
    pub fn enter_node(&mut self, problem: &mut RationalProblem, depth: usize) -> CertResult<()> {
        let keep = depth.saturating_sub(1).min(problem.depth());
        self.backtrack_to(problem, keep)?;
        while problem.depth() < depth {
            self.push_level(problem);
        }
        Ok(())
    }

    /// Switch the local bounds to the tree's current node.
    ///
    /// With node identity the bounds are rebuilt from the node path on every
    /// node change; without it only the depth is aligned. Pending changes
    /// are kept for the node being entered.
    fn sync_node(&mut self, problem: &mut RationalProblem, tree: &dyn TreeManager) -> CertResult<()> {
        self.check_problem(problem)?;
        let depth = tree.depth();
        match tree.node_id() {
            Some(id) if self.node == Some(id) => Ok(()),
            Some(id) => {
                let path = tree.node_path();
                if path.len() != depth {
                    return Err(CertError::InvalidProblem(format!(
                        "node {id} at depth {depth} has a path of {} levels",
                        path.len()
                    )));
                }
                let pending = problem.take_pending_changes();
                self.backtrack_to(problem, 0)?;
                for level in path {
                    self.push_level(problem);
                    for (var, side, value) in level {
                        problem.record_bound_change(var, side, value)?;
                    }
                    self.drain_bound_changes(problem)?;
                }
                restore_pending(problem, pending)?;
                tracing::trace!(node = id, depth, "switched to node");
                self.node = Some(id);
                Ok(())
            }
            None if problem.depth() != depth => {
                let pending = problem.take_pending_changes();
                self.enter_node(problem, depth)?;
                restore_pending(problem, pending)
            }
            None => Ok(()),
        }
    }

    /// Certify the node bound and report it to the tree.
    ///
    /// The local bounds are first switched to the tree's current node. The
    /// node is pruned when it is infeasible or its bound reaches the
    /// certified incumbent. Probing nodes are skipped.
    pub fn process_node(
        &mut self,
        problem: &mut RationalProblem,
        approx: &mut dyn ApproxLp,
        tree: &mut dyn TreeManager,
    ) -> CertResult<NodeBound> {
        if tree.in_probing() {
            return Ok(NodeBound::Unknown);
        }
        self.sync_node(problem, tree)?;
        let bound = self.certify_bound(problem, approx)?;
        if let NodeBound::Infeasible { .. } = bound {
            tree.cutoff_node();
            return Ok(bound);
        }
        if let Some(value) = bound.exact_value() {
            if self
                .solutions
                .best_objective()
                .is_some_and(|incumbent| value >= incumbent)
            {
                tracing::debug!(%value, "node bound reaches incumbent");
                tree.cutoff_node();
            } else if let Some(safe) = bound.safe_lower_bound()
                && safe > tree.node_lower_bound()
            {
                tree.set_node_lower_bound(safe);
            }
        }
        Ok(bound)
    }

    /// Solve the node LP exactly and accept or branch.
    ///
    /// `claimed_integral` tells whether the approximate solver considered
    /// its solution integral; a fractional exact optimum is then counted as
    /// a wrong claim.
    ///
    /// An improving solution is reported to the tree as a cutoff bound,
    /// rounded up so that no better node is pruned.
    pub fn enforce_integrality(
        &mut self,
        problem: &mut RationalProblem,
        approx: &mut dyn ApproxLp,
        tree: &mut dyn TreeManager,
        claimed_integral: bool,
    ) -> CertResult<EnforceResult> {
        self.sync_node(problem, tree)?;
        self.drain_bound_changes(problem)?;
        let incumbent = self.solutions.best_objective().cloned();
        let time_limit = self.config.lp_time_limit();
        let iteration_limit = self.config.resolve_iteration_limit;
        let lp = self.adapter_mut(problem)?;
        match lp.load_approximate_state(approx) {
            Ok(_) => {}
            Err(err) if err.is_recoverable() => {
                tracing::debug!(%err, "cold exact solve");
            }
            Err(err) => return Err(err),
        }
        lp.set_limits(iteration_limit, time_limit, incumbent);
        let status = lp.solve(SimplexAlgorithm::Dual)?;
        let (iterations, elapsed) = lp.last_solve();
        let solved = match status {
            LpStatus::Optimal => Some((lp.objective_value()?, lp.primal()?)),
            _ => None,
        };
        self.observer.on_exact_solve(iterations, elapsed);

        let Some((objective, primal)) = solved else {
            return Ok(match status {
                LpStatus::Infeasible | LpStatus::ObjLimitExceeded => {
                    tree.cutoff_node();
                    EnforceResult::Cutoff
                }
                status => {
                    tracing::debug!(?status, "exact solve did not finish");
                    EnforceResult::Unresolved(status)
                }
            });
        };
        if problem.infinity().is_infinite(&objective) {
            return Err(CertError::UnsafeObjective(objective.to_string()));
        }
        for (j, value) in primal.iter().enumerate() {
            to_f64_checked(j, value)?;
        }

        let decision = check_integrality(problem, &primal);
        match &decision {
            BranchDecision::Branch { var, .. } => {
                if claimed_integral {
                    tracing::warn!("approximate solution claimed integral is fractional");
                    self.observer.on_wrong_integral_claim();
                }
                if let Some((down, up)) = decision.children() {
                    tree.create_child(down)?;
                    tree.create_child(up)?;
                }
                Ok(EnforceResult::Branched { var: *var })
            }
            BranchDecision::Integral => {
                let solution = CertifiedSolution::new(problem, primal);
                let safe_objective = solution.safe_objective;
                if !safe_objective.is_finite() {
                    return Err(CertError::UnsafeObjective(solution.objective.to_string()));
                }
                let original = solution.original_objective(problem);
                if self.solutions.try_add(solution) {
                    tracing::info!(
                        objective = %original,
                        safe_objective,
                        "certified integral solution"
                    );
                    tree.set_cutoff_bound(safe_objective);
                }
                tree.cutoff_node();
                Ok(EnforceResult::Integral {
                    objective: original,
                    safe_objective,
                })
            }
        }
    }
}

/// Record changes taken from the log before a node switch.
fn restore_pending(problem: &mut RationalProblem, pending: Vec<PendingChange>) -> CertResult<()> {
    for change in pending {
        problem.record_bound_change(change.var, change.side, change.value)?;
    }
    Ok(())
}
