//! File-backed key-value storage
//!
//! Each key is one `<dir>/<key>.json` file. Writes go to a temporary file
//! in the same directory and are renamed into place, so a reader sees
//! either the old document or the new one.
//!
//! Change notifications only reach handles created from the same
//! [`FileKeyValueStore`] via [`FileKeyValueStore::handle`]; other processes
//! sharing the directory are not notified.

use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};

use crate::ports::{KeyValuePort, StorageChange, StorageEvents, StorageSubscription};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Key-value storage in a directory of JSON files
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
    origin: Uuid,
    changes: broadcast::Sender<StorageChange>,
}

impl FileKeyValueStore {
    /// Creates a store rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            dir: dir.into(),
            origin: Uuid::new_v4(),
            changes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Another view onto the same directory that shares change notifications
    pub fn handle(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            origin: Uuid::new_v4(),
            changes: self.changes.clone(),
        }
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf, PortError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(PortError::validation_field(
                format!("Storage key '{key}' may only contain letters, digits, '.', '_' and '-'"),
                "key",
            ));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn notify(&self, key: &str) {
        let _ = self.changes.send(StorageChange::key(key, self.origin));
    }
}

/// Interrupted or timed-out I/O is transient; anything else needs attention
fn io_error(action: &str, path: &Path, error: std::io::Error) -> PortError {
    let message = format!("Failed to {action} {}", path.display());
    match error.kind() {
        ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock => {
            PortError::connection_with_source(message, error)
        }
        _ => PortError::internal_with_source(message, error),
    }
}

impl DomainPort for FileKeyValueStore {}

#[async_trait]
impl HealthCheckable for FileKeyValueStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let metadata = tokio::fs::metadata(&self.dir).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match metadata {
            Ok(meta) if meta.is_dir() => (AdapterHealth::Healthy, None),
            Ok(_) => (
                AdapterHealth::Unhealthy,
                Some(format!("{} is not a directory", self.dir.display())),
            ),
            Err(e) if e.kind() == ErrorKind::NotFound => (
                AdapterHealth::Degraded,
                Some(format!("{} will be created on first write", self.dir.display())),
            ),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Storage error: {e}"))),
        };

        HealthCheckResult {
            adapter_id: "file-key-value-store".to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl KeyValuePort for FileKeyValueStore {
    #[instrument(skip(self))]
    async fn load(&self, key: &str) -> Result<Option<String>, PortError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No stored document");
                Ok(None)
            }
            Err(e) => Err(io_error("read", &path, e)),
        }
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn save(&self, key: &str, value: &str) -> Result<(), PortError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error("create", &self.dir, e))?;

        let staging = self
            .dir
            .join(format!(".{key}.{}.tmp", self.origin.simple()));
        tokio::fs::write(&staging, value)
            .await
            .map_err(|e| io_error("write", &staging, e))?;
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(io_error("replace", &path, e));
        }

        self.notify(key);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self, key: &str) -> Result<(), PortError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                self.notify(key);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &path, e)),
        }
    }
}

impl StorageEvents for FileKeyValueStore {
    fn subscribe(&self) -> StorageSubscription {
        StorageSubscription::new(self.changes.subscribe(), self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unsafe_keys() {
        let store = FileKeyValueStore::new("/tmp/unused");
        for key in ["", "../etc/passwd", "a/b", "with space"] {
            let err = store.path_for(key).unwrap_err();
            assert!(matches!(err, PortError::Validation { .. }), "key {key:?}");
        }
        assert!(store.path_for("fnol_claim_results").is_ok());
        assert!(store.path_for("v1.claims-backup").is_ok());
    }

    #[test]
    fn test_io_error_classification() {
        let path = Path::new("/tmp/claims.json");

        let busy = io_error("read", path, std::io::Error::from(ErrorKind::TimedOut));
        assert!(busy.is_transient());

        let denied = io_error("write", path, std::io::Error::from(ErrorKind::PermissionDenied));
        assert!(matches!(denied, PortError::Internal { .. }));
        assert!(!denied.is_transient());
        assert!(denied.to_string().contains("/tmp/claims.json"));
    }

    #[test]
    fn test_path_is_key_with_json_extension() {
        let store = FileKeyValueStore::new("/var/lib/fnol");
        assert_eq!(
            store.path_for("fnol_claim_results").unwrap(),
            PathBuf::from("/var/lib/fnol/fnol_claim_results.json")
        );
    }

    #[test]
    fn test_handles_have_distinct_origins() {
        let store = FileKeyValueStore::new("/tmp/unused");
        let other = store.handle();
        assert_ne!(store.origin, other.origin);
        assert_eq!(store.dir(), other.dir());
    }
}
