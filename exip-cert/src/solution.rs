//! Certified solutions.
//!
//! A solution is stored only after its integrality and objective were
//! checked in exact arithmetic, so its objective is exact as well. The
//! float reported to the tree search is rounded upwards, so it never cuts
//! off a node that could still improve on the incumbent.

use crate::problem::RationalProblem;
use exip_core::CertResult;
use exip_core::rational::to_f64_up;
use num_rational::BigRational;
use num_traits::Zero;
use std::io::Write;

/// An exact primal solution with its internal (minimization) objective.
#[derive(Debug, Clone, PartialEq)]
pub struct CertifiedSolution {
    /// Exact column values
    pub values: Vec<BigRational>,
    /// Objective in the internal minimization form
    pub objective: BigRational,
    /// Smallest float not below `objective`
    pub safe_objective: f64,
}

impl CertifiedSolution {
    /// Create a solution, evaluating its objective on `problem`.
    pub fn new(problem: &RationalProblem, values: Vec<BigRational>) -> Self {
        let objective = problem.objective_value(&values);
        let safe_objective = to_f64_up(&objective);
        Self {
            values,
            objective,
            safe_objective,
        }
    }

    /// Objective in the original sense, including the offset.
    pub fn original_objective(&self, problem: &RationalProblem) -> BigRational {
        problem.to_original(&self.objective)
    }
}

/// Keeps the best certified solution found so far.
#[derive(Debug, Clone, Default)]
pub struct SolutionStore {
    best: Option<CertifiedSolution>,
    found: usize,
    improvements: usize,
}

impl SolutionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a solution; returns whether it became the incumbent.
    pub fn try_add(&mut self, solution: CertifiedSolution) -> bool {
        self.found += 1;
        let better = self
            .best
            .as_ref()
            .is_none_or(|best| solution.objective < best.objective);
        if better {
            tracing::debug!(objective = %solution.objective, "new certified incumbent");
            self.improvements += 1;
            self.best = Some(solution);
        }
        better
    }

    /// The incumbent.
    pub fn best(&self) -> Option<&CertifiedSolution> {
        self.best.as_ref()
    }

    /// Internal objective of the incumbent.
    pub fn best_objective(&self) -> Option<&BigRational> {
        self.best.as_ref().map(|s| &s.objective)
    }

    /// Safe-rounded internal objective of the incumbent.
    pub fn best_safe_objective(&self) -> Option<f64> {
        self.best.as_ref().map(|s| s.safe_objective)
    }

    /// Number of solutions offered.
    pub fn num_found(&self) -> usize {
        self.found
    }

    /// Number of solutions that improved the incumbent.
    pub fn num_improvements(&self) -> usize {
        self.improvements
    }
}

/// Write a solution in original space: sense and offset applied.
///
/// Only nonzero values are listed unless `print_zeros` is set.
pub fn print_solution<W: Write>(
    problem: &RationalProblem,
    solution: &CertifiedSolution,
    out: &mut W,
    print_zeros: bool,
) -> CertResult<()> {
    writeln!(
        out,
        "objective value: {:>20}",
        solution.original_objective(problem).to_string()
    )?;
    for (j, value) in solution.values.iter().enumerate() {
        if !print_zeros && value.is_zero() {
            continue;
        }
        writeln!(
            out,
            "{:<32} {:>20} \t(obj:{})",
            problem.var_name(j),
            value.to_string(),
            problem.obj(j)?
        )?;
    }
    Ok(())
}

/// Write a solution in the internal minimization space.
pub fn print_transformed_solution<W: Write>(
    problem: &RationalProblem,
    solution: &CertifiedSolution,
    out: &mut W,
    print_zeros: bool,
) -> CertResult<()> {
    writeln!(
        out,
        "objective value: {:>20}",
        solution.objective.to_string()
    )?;
    for (j, (value, coef)) in solution.values.iter().zip(problem.objective()).enumerate() {
        if !print_zeros && value.is_zero() {
            continue;
        }
        let name = format!("t_{}", problem.var_name(j));
        writeln!(out, "{:<32} {:>20} \t(obj:{})", name, value.to_string(), coef)?;
    }
    Ok(())
}
