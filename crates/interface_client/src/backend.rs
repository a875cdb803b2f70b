//! Claims Backend Port
//!
//! The multi-agent processing backend is reached through this port. The
//! HTTP adapter lives in [`crate::http`]; a scripted mock is available for
//! tests behind the `mock` feature.
//!
//! # Usage
//!
//! ```rust,ignore
//! use interface_client::{ClaimsBackendPort, HttpClaimsBackend};
//! use std::sync::Arc;
//!
//! let backend: Arc<dyn ClaimsBackendPort> = Arc::new(HttpClaimsBackend::new(config)?);
//! let result = backend.process_claim("My car was rear-ended...", None).await?;
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use core_kernel::{DomainPort, HealthCheckable, OperationMetadata};
use domain_claims::{ClaimProcessingResult, StreamClaimRequest};

use crate::error::ClientError;

/// Raw response body of the streaming endpoint
pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// Port to the claim processing backend
#[async_trait]
pub trait ClaimsBackendPort: DomainPort + HealthCheckable {
    /// Runs the full pipeline on a natural-language claim description
    async fn process_claim(
        &self,
        claim_text: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ClaimProcessingResult, ClientError>;

    /// Starts a streaming run and returns the NDJSON body as raw chunks
    async fn open_claim_stream(
        &self,
        request: &StreamClaimRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<ByteStream, ClientError>;
}

/// Mock implementation for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use core_kernel::{AdapterHealth, HealthCheckResult};
    use futures::StreamExt;
    use std::collections::VecDeque;
    use tokio::sync::{mpsc, Mutex};

    /// Failure a mock call should produce
    #[derive(Debug, Clone)]
    pub enum MockFailure {
        Status { status: u16, body: String },
        Connection(String),
        MissingBody,
    }

    impl MockFailure {
        fn to_error(&self) -> ClientError {
            match self {
                MockFailure::Status { status, body } => ClientError::status(*status, body),
                MockFailure::Connection(message) => ClientError::Connection(message.clone()),
                MockFailure::MissingBody => ClientError::MissingBody,
            }
        }
    }

    enum ScriptedStream {
        Items(Vec<Result<Bytes, MockFailure>>),
        Channel(mpsc::UnboundedReceiver<Result<Bytes, ClientError>>),
        Fail(MockFailure),
    }

    /// Scripted backend
    ///
    /// Each `open_claim_stream` call consumes the next scripted stream; with
    /// nothing scripted the stream is empty.
    #[derive(Default)]
    pub struct MockClaimsBackend {
        result: Option<ClaimProcessingResult>,
        process_failure: Option<MockFailure>,
        streams: Mutex<VecDeque<ScriptedStream>>,
        unhealthy: bool,
        texts: Mutex<Vec<String>>,
        requests: Mutex<Vec<StreamClaimRequest>>,
    }

    impl MockClaimsBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Result returned by `process_claim`
        pub fn with_result(mut self, result: ClaimProcessingResult) -> Self {
            self.result = Some(result);
            self
        }

        pub fn with_process_failure(mut self, failure: MockFailure) -> Self {
            self.process_failure = Some(failure);
            self
        }

        /// Queues a stream delivering `chunks` in order
        pub fn with_stream_chunks<I, C>(mut self, chunks: I) -> Self
        where
            I: IntoIterator<Item = C>,
            C: Into<Bytes>,
        {
            let items = chunks.into_iter().map(|c| Ok(c.into())).collect();
            self.streams.get_mut().push_back(ScriptedStream::Items(items));
            self
        }

        /// Queues a stream that delivers `chunks` and then fails
        pub fn with_stream_interrupted<I, C>(mut self, chunks: I, failure: MockFailure) -> Self
        where
            I: IntoIterator<Item = C>,
            C: Into<Bytes>,
        {
            let mut items: Vec<_> = chunks.into_iter().map(|c| Ok(c.into())).collect();
            items.push(Err(failure));
            self.streams.get_mut().push_back(ScriptedStream::Items(items));
            self
        }

        /// Queues a stream that fails before any byte arrives
        pub fn with_stream_failure(mut self, failure: MockFailure) -> Self {
            self.streams.get_mut().push_back(ScriptedStream::Fail(failure));
            self
        }

        /// Queues a stream fed by the returned sender; it ends when the sender is dropped
        pub fn with_stream_channel(
            mut self,
        ) -> (Self, mpsc::UnboundedSender<Result<Bytes, ClientError>>) {
            let (sender, receiver) = mpsc::unbounded_channel();
            self.streams
                .get_mut()
                .push_back(ScriptedStream::Channel(receiver));
            (self, sender)
        }

        pub fn unhealthy(mut self) -> Self {
            self.unhealthy = true;
            self
        }

        /// Claim texts received by `process_claim`
        pub async fn submitted_texts(&self) -> Vec<String> {
            self.texts.lock().await.clone()
        }

        /// Requests received by `open_claim_stream`
        pub async fn stream_requests(&self) -> Vec<StreamClaimRequest> {
            self.requests.lock().await.clone()
        }
    }

    impl DomainPort for MockClaimsBackend {}

    #[async_trait]
    impl HealthCheckable for MockClaimsBackend {
        async fn health_check(&self) -> HealthCheckResult {
            let status = if self.unhealthy {
                AdapterHealth::Unhealthy
            } else {
                AdapterHealth::Healthy
            };
            HealthCheckResult {
                adapter_id: "mock-claims-backend".to_string(),
                status,
                latency_ms: 0,
                message: Some("Mock backend".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl ClaimsBackendPort for MockClaimsBackend {
        async fn process_claim(
            &self,
            claim_text: &str,
            _metadata: Option<OperationMetadata>,
        ) -> Result<ClaimProcessingResult, ClientError> {
            self.texts.lock().await.push(claim_text.to_string());
            if let Some(failure) = &self.process_failure {
                return Err(failure.to_error());
            }
            self.result
                .clone()
                .ok_or_else(|| ClientError::Connection("no result scripted".to_string()))
        }

        async fn open_claim_stream(
            &self,
            request: &StreamClaimRequest,
            _metadata: Option<OperationMetadata>,
        ) -> Result<ByteStream, ClientError> {
            self.requests.lock().await.push(request.clone());
            match self.streams.lock().await.pop_front() {
                None => Ok(futures::stream::empty().boxed()),
                Some(ScriptedStream::Fail(failure)) => Err(failure.to_error()),
                Some(ScriptedStream::Items(items)) => Ok(futures::stream::iter(
                    items
                        .into_iter()
                        .map(|item| item.map_err(|failure| failure.to_error())),
                )
                .boxed()),
                Some(ScriptedStream::Channel(receiver)) => Ok(futures::stream::unfold(
                    receiver,
                    |mut receiver| async move { receiver.recv().await.map(|item| (item, receiver)) },
                )
                .boxed()),
            }
        }
    }
}
