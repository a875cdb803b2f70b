//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! FNOL claim client test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built claim results, submissions and stream bodies
//! - `builders`: Builder patterns for test data construction
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use generators::*;
