//! Streaming claim processor
//!
//! Submits a claim description to the streaming endpoint and folds the
//! NDJSON events into an observable [`ProcessorSnapshot`].
//!
//! # States
//!
//! ```text
//! Idle ──process_claim──► Processing ──stream end / error──► Idle
//!   ▲                          │
//!   └──────── reset ───────────┘
//! ```
//!
//! Each submission runs in an epoch. `reset` (also done at the start of
//! every submission) opens a new epoch; a submission whose epoch is no
//! longer current stops reading, applies nothing more and leaves the
//! processing flag to whoever owns the current epoch.

use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use core_kernel::OperationMetadata;
use domain_claims::{StreamClaimRequest, StreamResult};

use crate::backend::ClaimsBackendPort;
use crate::error::ClientError;
use crate::ndjson::{DecodedLine, NdjsonDecoder};
use crate::notify::{failure_message, Notifier, SUCCESS_MESSAGE};

/// Client-visible processing state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessorSnapshot {
    pub is_processing: bool,
    /// Events in arrival order
    pub results: Vec<StreamResult>,
    /// Distinct node names in first-seen order
    pub completed_nodes: Vec<String>,
}

/// Outcome of one streaming submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub events: usize,
    pub skipped_lines: usize,
    /// Distinct node names in first-seen order
    pub completed_nodes: Vec<String>,
    /// A reset happened while this submission was running
    pub superseded: bool,
}

pub struct ClaimProcessor {
    backend: Arc<dyn ClaimsBackendPort>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<ProcessorSnapshot>,
    epoch: AtomicU64,
}

impl ClaimProcessor {
    pub fn new(backend: Arc<dyn ClaimsBackendPort>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(ProcessorSnapshot::default());
        Self {
            backend,
            notifier,
            state,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> ProcessorSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<ProcessorSnapshot> {
        self.state.subscribe()
    }

    pub fn is_processing(&self) -> bool {
        self.state.borrow().is_processing
    }

    /// Clears results, completed nodes and the processing flag
    ///
    /// Any submission still running is superseded.
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(ProcessorSnapshot::default());
    }

    /// Streams one claim through the pipeline
    ///
    /// Non-2xx responses, transport failures and a missing body fail the
    /// submission. Malformed lines are skipped.
    #[instrument(skip(self, claim_text), fields(chars = claim_text.len()))]
    pub async fn process_claim(&self, claim_text: &str) -> Result<StreamSummary, ClientError> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(ProcessorSnapshot {
            is_processing: true,
            ..Default::default()
        });

        let outcome = self.run(epoch, claim_text).await;

        let current = self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            state.is_processing = false;
            true
        });

        match &outcome {
            Ok(summary) if summary.superseded || !current => {
                info!(events = summary.events, "Claim stream superseded by reset");
            }
            Ok(summary) => {
                info!(
                    events = summary.events,
                    skipped = summary.skipped_lines,
                    nodes = ?summary.completed_nodes,
                    "Claim stream completed"
                );
                self.notifier.success(SUCCESS_MESSAGE);
            }
            Err(e) if current => {
                error!(error = %e, "Claim stream failed");
                self.notifier.failure(&failure_message(e));
            }
            Err(e) => {
                info!(error = %e, "Superseded claim stream failed");
            }
        }

        outcome.map(|summary| StreamSummary {
            superseded: summary.superseded || !current,
            ..summary
        })
    }

    async fn run(&self, epoch: u64, claim_text: &str) -> Result<StreamSummary, ClientError> {
        let request = StreamClaimRequest::from_description(claim_text);
        let metadata = OperationMetadata::generated().initiated_by("claim-processor");
        let mut stream = self
            .backend
            .open_claim_stream(&request, Some(metadata))
            .await?;

        let mut decoder = NdjsonDecoder::new();
        let mut summary = StreamSummary::default();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for line in decoder.push(&chunk) {
                if !self.apply(epoch, line, &mut summary) {
                    summary.superseded = true;
                    return Ok(summary);
                }
            }
        }

        if let Some(line) = decoder.finish() {
            if !self.apply(epoch, line, &mut summary) {
                summary.superseded = true;
            }
        }
        Ok(summary)
    }

    /// Applies one decoded line; returns false once the epoch is stale
    fn apply(&self, epoch: u64, line: DecodedLine, summary: &mut StreamSummary) -> bool {
        match line {
            DecodedLine::Event(event) => {
                let node = event.node.clone();
                // Checked under the channel lock so a concurrent reset cannot interleave
                let applied = self.state.send_if_modified(|state| {
                    if self.epoch.load(Ordering::SeqCst) != epoch {
                        return false;
                    }
                    record_node(&mut state.completed_nodes, &event.node);
                    state.results.push(event);
                    true
                });
                if applied {
                    debug!(node = %node, "Pipeline stage completed");
                    summary.events += 1;
                    record_node(&mut summary.completed_nodes, &node);
                }
                applied
            }
            DecodedLine::Malformed { line, error } => {
                warn!(line = %line, error = %error, "Skipping malformed stream line");
                summary.skipped_lines += 1;
                self.epoch.load(Ordering::SeqCst) == epoch
            }
        }
    }
}

/// Appends `node` unless it was already seen
fn record_node(nodes: &mut Vec<String>, node: &str) {
    if !nodes.iter().any(|seen| seen == node) {
        nodes.push(node.to_string());
    }
}
