//! ExIP Cert - Certified dual bounds for exact branch-and-bound
//!
//! A floating-point LP solver drives the tree search; this crate turns its
//! approximate node solutions into statements that hold in exact rational
//! arithmetic:
//! - [`RationalProblem`], the exact problem with deferred local bound
//!   changes, a pseudo-objective and a backtrackable bound trail
//! - [`ExactLpAdapter`], the exact LP of the current node
//! - The strategies in [`certify`] and the precomputed [`PsData`]
//! - [`CertificationContext`], which picks a strategy per node, falls back
//!   on failure and reports to the [`TreeManager`]
//! - Exact integrality enforcement, certified solutions and single-row
//!   bound tightening
//!
//! # Examples
//!
//! ```
//! use exip_cert::{
//!     ApproxLpSnapshot, CertificationContext, NodeBound, ObjSense, ProblemBuilder, VarKind,
//! };
//! use exip_core::{CertifyConfig, DualBoundMethod, rational::rat};
//!
//! // min x  s.t.  x = 1, x free
//! let mut b = ProblemBuilder::new(ObjSense::Minimize);
//! let x = b.add_var("x", rat(1), None, None, VarKind::Continuous);
//! b.add_row("e", &[(x, rat(1))], Some(rat(1)), Some(rat(1))).unwrap();
//! let mut problem = b.build().unwrap();
//!
//! let config = CertifyConfig::with_method(DualBoundMethod::ProjectShift);
//! let mut ctx = CertificationContext::new(config).unwrap();
//! // the approximate dual is slightly off; the certified bound is exact
//! let mut approx = ApproxLpSnapshot::new(vec![0.9999999], vec![0.0]);
//! let bound = ctx.certify_bound(&mut problem, &mut approx).unwrap();
//! assert!(matches!(bound, NodeBound::Certified(b) if b.value == rat(1)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod approx;
pub mod branch;
pub mod certify;
pub mod context;
pub mod engine;
pub mod problem;
pub mod psdata;
pub mod solution;
pub mod tighten;
pub mod tree;

pub use adapter::{AdapterStats, ExactLpAdapter};
pub use approx::{ApproxLp, ApproxLpSnapshot};
pub use branch::{BranchDecision, check_integrality};
pub use certify::{CertifiedBound, CertifyOutcome};
pub use context::CertificationContext;
pub use engine::{EnforceResult, NodeBound};
pub use problem::{
    BoundScope, BoundSide, ObjSense, ProblemBuilder, ProblemStats, RationalProblem, VarKind,
};
pub use psdata::PsData;
pub use solution::{CertifiedSolution, SolutionStore, print_solution, print_transformed_solution};
pub use tighten::{BoundTightener, TightenResult, TighteningStats};
pub use tree::{ChildBound, RecordingTree, TreeManager};
