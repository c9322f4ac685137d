//! Property-based tests for exip-math
//!
//! This module contains property tests for:
//! - Exact simplex correctness and strong duality
//! - Column factorization solves

mod lu_properties;
mod simplex_properties;
