//! Claims domain errors

use thiserror::Error;

use crate::stream::PipelineStage;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Stage {node} carried data that does not decode as {section}: {source}")]
    InvalidStageData {
        node: String,
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stream ended without {}", format_stages(.missing))]
    IncompleteStream { missing: Vec<PipelineStage> },
}

fn format_stages(stages: &[PipelineStage]) -> String {
    stages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
