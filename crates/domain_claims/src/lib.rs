//! Claims Domain
//!
//! Data model for claims processed by the multi-agent FNOL backend.
//!
//! # Processing Pipeline
//!
//! ```text
//! submission -> intake -> risk assessment -> routing -> ClaimProcessingResult
//! ```
//!
//! The non-streaming endpoint returns the aggregate in one response. The
//! streaming endpoint emits one `StreamResult` per stage, which
//! [`assemble_result`] folds back into the same aggregate.

pub mod claim;
pub mod error;
pub mod stream;
pub mod submission;
pub mod summary;

pub use claim::{ClaimFacts, ClaimProcessingResult, RiskLevel, RiskReport, RoutingDecision};
pub use error::ClaimError;
pub use stream::{assemble_result, try_assemble_result, PipelineStage, StreamResult};
pub use submission::{ClaimSubmission, StreamClaimRequest};
pub use summary::{ClaimDisposition, ClaimSummary};
