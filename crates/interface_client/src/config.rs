//! Client configuration

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use core_kernel::CoreError;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => f.write_str("pretty"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the claim processing backend
    pub backend_url: String,
    /// Path of the non-streaming processing endpoint
    pub process_path: String,
    /// Path of the NDJSON streaming endpoint
    pub stream_path: String,
    /// Path the health check requests
    pub health_path: String,
    /// Timeout for the non-streaming call, in seconds
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub health_timeout_secs: u64,
    /// Directory holding persisted claim results
    pub storage_dir: PathBuf,
    /// Storage key of the claim results document
    pub storage_key: String,
    /// Log level
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            process_path: "/actual_claim".to_string(),
            stream_path: "/process-claim-stream/".to_string(),
            health_path: "/".to_string(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
            health_timeout_secs: 5,
            storage_dir: PathBuf::from(".fnol"),
            storage_key: "fnol_claim_results".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from `FNOL_`-prefixed environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("FNOL").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Rejects settings the client cannot work with
    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.backend_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::configuration(format!(
                "backend_url must be an http(s) URL, got '{}'",
                self.backend_url
            )));
        }
        if self.storage_key.trim().is_empty() {
            return Err(CoreError::configuration("storage_key must not be empty"));
        }
        Ok(())
    }

    /// Joins the backend URL and `path` with exactly one `/`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.backend_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}
