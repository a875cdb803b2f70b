//! Non-streaming claim intake
//!
//! Sends one claim to the processing endpoint, keys the aggregate result
//! and saves it in the claim result store for later lookup.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use core_kernel::{ClaimKey, HealthCheckResult, OperationMetadata};
use domain_claims::{ClaimProcessingResult, ClaimSubmission, ClaimSummary};
use infra_store::ClaimResultStore;

use crate::backend::ClaimsBackendPort;
use crate::error::ClientError;
use crate::notify::{failure_message, Notifier, SUCCESS_MESSAGE};

/// Result of a processed submission
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub key: ClaimKey,
    pub result: ClaimProcessingResult,
    /// History row for the submission
    pub summary: ClaimSummary,
    /// False when the result could not be written to durable storage
    pub persisted: bool,
    /// True when the backend returned no claim id and one was generated
    pub generated_key: bool,
}

pub struct ClaimIntakeService {
    backend: Arc<dyn ClaimsBackendPort>,
    store: Arc<ClaimResultStore>,
    notifier: Arc<dyn Notifier>,
}

impl ClaimIntakeService {
    pub fn new(
        backend: Arc<dyn ClaimsBackendPort>,
        store: Arc<ClaimResultStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            store,
            notifier,
        }
    }

    pub fn store(&self) -> &Arc<ClaimResultStore> {
        &self.store
    }

    /// Submits a claim form as its narrative text
    #[instrument(skip(self, submission), fields(customer_id = %submission.customer_id))]
    pub async fn submit(&self, submission: &ClaimSubmission) -> Result<SubmissionOutcome, ClientError> {
        let text = submission.narrative(Utc::now());
        let (key, result, generated_key, persisted) = self.process_and_store(&text).await?;
        let summary = ClaimSummary::for_submission(
            key.clone(),
            submission,
            &result,
            Utc::now().date_naive(),
        );
        Ok(SubmissionOutcome {
            key,
            result,
            summary,
            persisted,
            generated_key,
        })
    }

    /// Submits free claim text
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn submit_text(&self, text: &str) -> Result<SubmissionOutcome, ClientError> {
        let (key, result, generated_key, persisted) = self.process_and_store(text).await?;
        let summary = ClaimSummary::from_result(key.clone(), &result, Utc::now().date_naive());
        Ok(SubmissionOutcome {
            key,
            result,
            summary,
            persisted,
            generated_key,
        })
    }

    /// Stored result for `key`, if any
    pub async fn details(&self, key: &str) -> Option<ClaimProcessingResult> {
        self.store.get(key).await
    }

    pub async fn health(&self) -> HealthCheckResult {
        self.backend.health_check().await
    }

    async fn process_and_store(
        &self,
        text: &str,
    ) -> Result<(ClaimKey, ClaimProcessingResult, bool, bool), ClientError> {
        let metadata = OperationMetadata::generated().initiated_by("claim-intake");
        let result = match self.backend.process_claim(text, Some(metadata)).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Claim processing failed");
                self.notifier.failure(&failure_message(&e));
                return Err(e);
            }
        };

        let (key, generated_key) = match result.claim_key() {
            Some(key) => (key, false),
            None => (self.unused_key().await, true),
        };
        if generated_key {
            warn!(claim_id = %key, "Backend returned no claim id, generated one");
        }

        let persisted = match self.store.set(key.clone(), result.clone()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(claim_id = %key, error = %e, "Claim processed but not persisted");
                false
            }
        };

        info!(
            claim_id = %key,
            risk_score = result.risk_report.risk_score,
            path = %result.routing_decision.processing_path,
            persisted,
            "Claim processed"
        );
        self.notifier.success(SUCCESS_MESSAGE);
        Ok((key, result, generated_key, persisted))
    }

    /// Generates a key that no stored result uses yet
    async fn unused_key(&self) -> ClaimKey {
        loop {
            let key = ClaimKey::generate();
            match self.store.lookup(key.as_str()).await {
                Ok(None) => return key,
                Ok(Some(_)) => continue,
                // Storage is unreadable; fall back to what memory knows
                Err(_) if !self.store.contains(key.as_str()).await => return key,
                Err(_) => continue,
            }
        }
    }
}
