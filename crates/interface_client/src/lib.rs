//! FNOL Claim Client
//!
//! Client side of the multi-agent claim processing backend.
//!
//! # Components
//!
//! - [`HttpClaimsBackend`]: reqwest adapter for the backend's HTTP API
//! - [`ClaimProcessor`]: streaming submission with incremental NDJSON decoding
//! - [`ClaimIntakeService`]: non-streaming submission persisted to the claim store
//! - [`ClientConfig`]: `FNOL_`-prefixed environment configuration
//!
//! The `fnol` binary wires these together behind a small CLI.

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod intake;
pub mod ndjson;
pub mod notify;
pub mod processor;

pub use backend::{ByteStream, ClaimsBackendPort};
pub use config::{ClientConfig, LogFormat};
pub use error::ClientError;
pub use http::HttpClaimsBackend;
pub use intake::{ClaimIntakeService, SubmissionOutcome};
pub use ndjson::{DecodedLine, NdjsonDecoder};
pub use notify::{Notification, NotificationLevel, Notifier, TracingNotifier};
pub use processor::{ClaimProcessor, ProcessorSnapshot, StreamSummary};
