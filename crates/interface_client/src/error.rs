//! Client error types

use thiserror::Error;

use core_kernel::CoreError;

/// Longest response body kept in a status error
pub const BODY_SNIPPET_LIMIT: usize = 512;

/// Errors raised while talking to the processing backend
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("HTTP error! status: {status}, details: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response body is not readable")]
    MissingBody,

    #[error(transparent)]
    Config(#[from] CoreError),
}

impl ClientError {
    /// Creates a status error, keeping at most [`BODY_SNIPPET_LIMIT`] characters of the body
    pub fn status(status: u16, body: impl AsRef<str>) -> Self {
        let body = body.as_ref().trim();
        let body = match body.char_indices().nth(BODY_SNIPPET_LIMIT) {
            Some((cut, _)) => format!("{}...", &body[..cut]),
            None => body.to_string(),
        };
        ClientError::Status { status, body }
    }

    /// Returns true for failures that say nothing about the claim itself
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_) | ClientError::Connection(_) | ClientError::MissingBody
        )
    }
}
