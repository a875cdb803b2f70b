//! Core Kernel - Foundational types for the FNOL claim client
//!
//! This crate provides the building blocks shared by every other crate:
//! - Claim identifiers
//! - Port infrastructure (error type, health checks, operation metadata)
//! - Common error type

pub mod error;
pub mod identifiers;
pub mod ports;

pub use error::CoreError;
pub use identifiers::{ClaimKey, CLAIM_KEY_PREFIX};
pub use ports::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PortError,
};
