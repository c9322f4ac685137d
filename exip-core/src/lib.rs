//! ExIP Core - Foundations for exact dual bound certification
//!
//! This crate provides the shared building blocks of the certification layer:
//! - [`CertError`], the error taxonomy shared by all crates
//! - Exact rational helpers and the [`RationalInfinity`] sentinels
//! - [`SafeInterval`], directed-rounding interval arithmetic
//! - [`CertifyConfig`] and the method/strategy selectors
//! - The [`CertifyObserver`] statistics interface
//!
//! # Examples
//!
//! ```
//! use exip_core::{SafeInterval, rational::ratio};
//!
//! let tenth = SafeInterval::from_rational(&ratio(1, 10));
//! let sum = tenth.add(tenth).add(tenth);
//! assert!(sum.inf < 0.3 + 1e-15 && sum.sup > 0.3 - 1e-15);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod interval;
pub mod rational;
pub mod stats;

pub use config::{
    CertifyConfig, DualBoundMethod, PsDualColumns, PsInteriorPoint, PsShift, ResolveMode,
};
pub use error::{CertError, CertResult};
pub use interval::SafeInterval;
pub use rational::RationalInfinity;
pub use stats::{BoundQuality, CertifyObserver, CertifyStats, MethodStats, NoopObserver};
