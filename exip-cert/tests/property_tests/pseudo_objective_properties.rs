//! Property-based tests for the pseudo-objective cache

use exip_cert::{BoundSide, ObjSense, ProblemBuilder, RationalProblem, VarKind};
use exip_core::rational::rat;
use proptest::prelude::*;

/// One step of a search: a bound change, a new level or a backtrack.
#[derive(Debug, Clone)]
enum Step {
    Change { var: usize, upper: bool, value: i64 },
    Push,
    Backtrack(usize),
}

fn step_strategy(nvars: usize) -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0..nvars, any::<bool>(), -8i64..9)
            .prop_map(|(var, upper, value)| Step::Change { var, upper, value }),
        1 => Just(Step::Push),
        1 => (0usize..4).prop_map(Step::Backtrack),
    ]
}

/// Variables with mixed finite and infinite global bounds.
fn build(obj: &[i64]) -> RationalProblem {
    let mut b = ProblemBuilder::new(ObjSense::Minimize);
    for (j, &c) in obj.iter().enumerate() {
        let lb = (j % 3 != 1).then(|| rat(-10));
        let ub = (j % 3 != 2).then(|| rat(10));
        b.add_var(format!("x{j}"), rat(c), lb, ub, VarKind::Integer);
    }
    b.build().unwrap()
}

#[cfg(test)]
mod pseudo_objective_consistency {
    use super::*;

    proptest! {
        /// The incrementally maintained value matches a recomputation
        #[test]
        fn cache_matches_recomputation(
            obj in prop::collection::vec(-3i64..4, 1..6),
            steps in prop::collection::vec(step_strategy(5), 0..30)
        ) {
            let mut problem = build(&obj);
            let nvars = problem.num_vars();
            for step in steps {
                match step {
                    Step::Change { var, upper, value } => {
                        let side = if upper { BoundSide::Upper } else { BoundSide::Lower };
                        // crossing changes are rejected and leave the log untouched
                        let _ = problem.record_bound_change(var % nvars, side, rat(value));
                    }
                    Step::Push => {
                        problem.drain_bound_changes();
                        problem.push_level();
                    }
                    Step::Backtrack(depth) => {
                        if depth <= problem.depth() {
                            problem.backtrack_to(depth).unwrap();
                        }
                    }
                }
                problem.drain_bound_changes();
                prop_assert_eq!(problem.pseudo_objective(), &problem.recompute_pseudo_objective());
            }
        }

        /// Backtracking to the root restores the global pseudo-objective
        #[test]
        fn root_is_restored(
            obj in prop::collection::vec(-3i64..4, 1..6),
            steps in prop::collection::vec(step_strategy(5), 0..30)
        ) {
            let mut problem = build(&obj);
            let root = problem.pseudo_objective().clone();
            problem.push_level();
            let nvars = problem.num_vars();
            for step in steps {
                if let Step::Change { var, upper, value } = step {
                    let side = if upper { BoundSide::Upper } else { BoundSide::Lower };
                    let _ = problem.record_bound_change(var % nvars, side, rat(value));
                    problem.drain_bound_changes();
                }
            }
            problem.backtrack_to(0).unwrap();
            prop_assert_eq!(problem.pseudo_objective(), &root);
        }
    }
}
