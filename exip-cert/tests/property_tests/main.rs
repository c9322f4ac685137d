//! Property-based tests for exip-cert
//!
//! This module contains property tests for:
//! - Soundness of every bound certification strategy
//! - Project-and-shift producing exactly feasible duals
//! - Consistency of the cached pseudo-objective under bound changes

mod pseudo_objective_properties;
mod soundness_properties;
