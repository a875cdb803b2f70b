//! Store error types

use thiserror::Error;

use core_kernel::PortError;

/// Errors raised by the claim result store
///
/// The store keeps serving from memory when these occur; they are returned
/// so callers can decide whether to log or surface them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage adapter failed
    #[error("Storage error: {0}")]
    Storage(#[from] PortError),

    /// The durable document is not a JSON object of claim results
    #[error("Stored claim results are malformed: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The in-memory results could not be serialized
    #[error("Failed to encode claim results: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, StoreError::Malformed(_))
    }

    /// Returns true when the storage adapter reported a retryable failure
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Storage(e) if e.is_transient())
    }
}
