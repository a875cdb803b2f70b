//! Shared in-memory storage
//!
//! `LocalStorage` is one storage area shared by any number of views, the
//! way browser tabs of the same origin share local storage. Each view gets
//! its own [`LocalStorageTab`] handle; writes through one tab notify the
//! subscriptions of every other tab.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};

use crate::ports::{KeyValuePort, StorageChange, StorageEvents, StorageSubscription};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
struct SharedArea {
    entries: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<StorageChange>,
}

/// Storage area shared between tabs
#[derive(Debug, Clone)]
pub struct LocalStorage {
    area: Arc<SharedArea>,
}

impl Default for LocalStorage {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            area: Arc::new(SharedArea {
                entries: RwLock::new(HashMap::new()),
                changes,
            }),
        }
    }
}

impl LocalStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new view onto this storage area
    pub fn tab(&self) -> LocalStorageTab {
        LocalStorageTab {
            area: Arc::clone(&self.area),
            origin: Uuid::new_v4(),
        }
    }

    /// Empties the whole area and tells every tab to reload
    pub async fn clear_all(&self) {
        self.area.entries.write().await.clear();
        let _ = self.area.changes.send(StorageChange::everything(Uuid::nil()));
    }

    /// Reads a raw document without going through a tab
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.area.entries.read().await.get(key).cloned()
    }

    /// Writes a raw document from outside any tab and notifies every tab
    pub async fn put_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.area
            .entries
            .write()
            .await
            .insert(key.clone(), value.into());
        let _ = self.area.changes.send(StorageChange::key(key, Uuid::nil()));
    }
}

/// One view onto a [`LocalStorage`] area
#[derive(Debug, Clone)]
pub struct LocalStorageTab {
    area: Arc<SharedArea>,
    origin: Uuid,
}

impl LocalStorageTab {
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    fn notify(&self, key: &str) {
        // Nobody listening is fine
        let _ = self.area.changes.send(StorageChange::key(key, self.origin));
    }
}

impl DomainPort for LocalStorageTab {}

#[async_trait]
impl HealthCheckable for LocalStorageTab {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "local-storage".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some(format!(
                "{} keys, {} subscribers",
                self.area.entries.read().await.len(),
                self.area.changes.receiver_count()
            )),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl KeyValuePort for LocalStorageTab {
    async fn load(&self, key: &str) -> Result<Option<String>, PortError> {
        Ok(self.area.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), PortError> {
        self.area
            .entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        self.notify(key);
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), PortError> {
        if self.area.entries.write().await.remove(key).is_some() {
            self.notify(key);
        }
        Ok(())
    }
}

impl StorageEvents for LocalStorageTab {
    fn subscribe(&self) -> StorageSubscription {
        StorageSubscription::new(self.area.changes.subscribe(), self.origin)
    }
}
