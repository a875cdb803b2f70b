//! Storage Ports
//!
//! The claim result store never touches a storage technology directly. It
//! reads and writes whole documents through [`KeyValuePort`] and learns
//! about writes made by other views through [`StorageEvents`].
//!
//! # Views and origins
//!
//! Every adapter handle carries an origin id. A change notification names
//! the origin that caused it, and a subscription never yields changes from
//! its own origin, so a view only hears about writes made elsewhere.
//!
//! ```rust,ignore
//! let storage = LocalStorage::new();
//! let first = Arc::new(storage.tab());
//! let second = storage.tab();
//!
//! let mut changes = second.subscribe();
//! first.save("fnol_claim_results", "{}").await?;
//! assert!(changes.recv().await.is_some());
//! ```

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use core_kernel::{DomainPort, HealthCheckable, PortError};

/// Durable string storage addressed by key
#[async_trait]
pub trait KeyValuePort: DomainPort + HealthCheckable {
    /// Returns the stored document, or `None` if the key was never written
    async fn load(&self, key: &str) -> Result<Option<String>, PortError>;

    /// Replaces the stored document
    async fn save(&self, key: &str, value: &str) -> Result<(), PortError>;

    /// Removes the stored document; clearing a missing key is not an error
    async fn clear(&self, key: &str) -> Result<(), PortError>;
}

/// Source of storage change notifications
pub trait StorageEvents: Send + Sync {
    fn subscribe(&self) -> StorageSubscription;
}

/// A write observed on shared storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    /// Key that changed; `None` when everything may have changed
    pub key: Option<String>,
    /// Handle that made the change
    pub origin: Uuid,
}

impl StorageChange {
    pub fn key(key: impl Into<String>, origin: Uuid) -> Self {
        Self {
            key: Some(key.into()),
            origin,
        }
    }

    pub fn everything(origin: Uuid) -> Self {
        Self { key: None, origin }
    }

    /// Returns true if a view of `key` has to reload after this change
    pub fn affects(&self, key: &str) -> bool {
        self.key.as_deref().map_or(true, |changed| changed == key)
    }
}

/// Receiving half of a storage change channel
#[derive(Debug)]
pub struct StorageSubscription {
    receiver: broadcast::Receiver<StorageChange>,
    origin: Uuid,
}

impl StorageSubscription {
    pub fn new(receiver: broadcast::Receiver<StorageChange>, origin: Uuid) -> Self {
        Self { receiver, origin }
    }

    /// Origin whose own changes this subscription ignores
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// Waits for the next change made by another handle
    ///
    /// A subscriber that fell behind gets a single key-less change. Returns
    /// `None` once the storage is gone.
    pub async fn recv(&mut self) -> Option<StorageChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.origin == self.origin => continue,
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Storage subscriber lagged, forcing full reload");
                    return Some(StorageChange::everything(Uuid::nil()));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
