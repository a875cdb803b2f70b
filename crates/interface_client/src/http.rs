//! HTTP adapter for the claim processing backend

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Instant;
use tracing::{debug, error, info, instrument};

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata};
use domain_claims::{ClaimProcessingResult, StreamClaimRequest};

use crate::backend::{ByteStream, ClaimsBackendPort};
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Header carrying the operation's correlation id
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// reqwest-backed implementation of [`ClaimsBackendPort`]
#[derive(Debug, Clone)]
pub struct HttpClaimsBackend {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpClaimsBackend {
    /// Creates the adapter after validating `config`
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn post(&self, path: &str, metadata: Option<OperationMetadata>) -> RequestBuilder {
        let request = self.client.post(self.config.endpoint(path));
        match metadata.and_then(|m| m.correlation_id) {
            Some(id) => request.header(CORRELATION_HEADER, id),
            None => request,
        }
    }
}

/// Turns a non-2xx response into [`ClientError::Status`] carrying a body snippet
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    error!(status = status.as_u16(), body = %body, "Backend returned an error");
    Err(ClientError::status(status.as_u16(), body))
}

impl DomainPort for HttpClaimsBackend {}

#[async_trait]
impl HealthCheckable for HttpClaimsBackend {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let url = self.config.endpoint(&self.config.health_path);
        let response = self
            .client
            .get(&url)
            .timeout(self.config.health_timeout())
            .send()
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match response {
            Ok(response) if response.status().is_success() => (AdapterHealth::Healthy, None),
            Ok(response) => (
                AdapterHealth::Unhealthy,
                Some(format!("Backend returned {}", response.status())),
            ),
            Err(e) => (
                AdapterHealth::Unhealthy,
                Some(format!("Backend unreachable: {e}")),
            ),
        };

        HealthCheckResult {
            adapter_id: "http-claims-backend".to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl ClaimsBackendPort for HttpClaimsBackend {
    #[instrument(skip(self, claim_text, metadata), fields(chars = claim_text.len()))]
    async fn process_claim(
        &self,
        claim_text: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ClaimProcessingResult, ClientError> {
        info!(url = %self.config.endpoint(&self.config.process_path), "Submitting claim");

        let response = self
            .post(&self.config.process_path, metadata)
            .timeout(self.config.request_timeout())
            .json(claim_text)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body = response.text().await?;
        debug!(bytes = body.len(), "Received processing result");
        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self, request, metadata))]
    async fn open_claim_stream(
        &self,
        request: &StreamClaimRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<ByteStream, ClientError> {
        info!(url = %self.config.endpoint(&self.config.stream_path), "Opening claim stream");

        let response = self
            .post(&self.config.stream_path, metadata)
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Err(ClientError::MissingBody);
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from))
            .boxed())
    }
}
