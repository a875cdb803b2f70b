//! Claim Result Store
//!
//! In-memory map from claim key to processing result, mirrored to a single
//! durable document (a JSON object keyed by claim id) behind a
//! [`KeyValuePort`].
//!
//! # Consistency
//!
//! Every mutation rewrites the whole document. Two views writing at the
//! same time race and the last write wins; there is no merge. Views learn
//! about each other's writes through a [`StorageSubscription`] and reload
//! the whole map when one arrives (see [`ClaimResultStore::spawn_sync`]).
//!
//! # Failures
//!
//! Storage and decode failures never poison the in-memory map. Operations
//! return them as [`StoreError`] so callers can log or surface them; the
//! `Option`-returning accessors log and degrade to "not found".

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use core_kernel::ClaimKey;
use domain_claims::ClaimProcessingResult;

use crate::error::StoreError;
use crate::ports::{KeyValuePort, StorageChange, StorageSubscription};

/// Storage key the results document lives under
pub const DEFAULT_STORAGE_KEY: &str = "fnol_claim_results";

type ResultMap = HashMap<ClaimKey, ClaimProcessingResult>;

/// Durable, cross-view mapping from claim key to processing result
pub struct ClaimResultStore {
    port: Arc<dyn KeyValuePort>,
    key: String,
    results: RwLock<ResultMap>,
}

impl std::fmt::Debug for ClaimResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimResultStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl ClaimResultStore {
    /// Opens the store under [`DEFAULT_STORAGE_KEY`]
    pub async fn open(port: Arc<dyn KeyValuePort>) -> Self {
        Self::with_key(port, DEFAULT_STORAGE_KEY).await
    }

    /// Opens the store under a custom storage key and loads what is there
    ///
    /// Unreadable durable data leaves the store empty.
    pub async fn with_key(port: Arc<dyn KeyValuePort>, key: impl Into<String>) -> Self {
        let store = Self {
            port,
            key: key.into(),
            results: RwLock::new(HashMap::new()),
        };
        if let Err(e) = store.reload().await {
            warn!(storage_key = %store.key, error = %e, "Starting with an empty claim store");
        }
        store
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Replaces the in-memory map with the durable document
    ///
    /// Returns the number of results loaded. A transient storage failure
    /// keeps the current map, so the next `set` does not overwrite durable
    /// results this view never saw. Any other failure (a malformed
    /// document, an unreadable file) leaves the map empty, and the next
    /// `set` replaces the durable document with what this view holds.
    pub async fn reload(&self) -> Result<usize, StoreError> {
        match self.read_durable().await {
            Ok(loaded) => {
                let count = loaded.len();
                *self.results.write().await = loaded;
                debug!(storage_key = %self.key, count, "Loaded claim results");
                Ok(count)
            }
            Err(e) if e.is_transient() => {
                warn!(storage_key = %self.key, error = %e, "Storage busy, keeping loaded claim results");
                Err(e)
            }
            Err(e) => {
                self.results.write().await.clear();
                Err(e)
            }
        }
    }

    /// Inserts or overwrites the result for `key`, then persists the map
    ///
    /// The in-memory entry stays even if persisting fails.
    pub async fn set(&self, key: ClaimKey, result: ClaimProcessingResult) -> Result<(), StoreError> {
        let mismatched = result.mismatched_ids();
        if !mismatched.is_empty() {
            warn!(
                claim_id = %key,
                records = ?mismatched,
                "Claim result sub-records carry a different claim id"
            );
        }

        let mut results = self.results.write().await;
        results.insert(key, result);
        self.persist(&results).await
    }

    /// Looks `key` up in memory, then in durable storage
    ///
    /// A result found only in durable storage is copied into memory.
    pub async fn lookup(&self, key: &str) -> Result<Option<ClaimProcessingResult>, StoreError> {
        let key = key.trim();
        if let Some(result) = self.results.read().await.get(key) {
            return Ok(Some(result.clone()));
        }

        let mut durable = self.read_durable().await?;
        match durable.remove_entry(key) {
            Some((claim_key, result)) => {
                debug!(claim_id = %claim_key, "Backfilled claim result from storage");
                self.results
                    .write()
                    .await
                    .insert(claim_key, result.clone());
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// Like [`lookup`](Self::lookup), logging failures as "not found"
    pub async fn get(&self, key: &str) -> Option<ClaimProcessingResult> {
        match self.lookup(key).await {
            Ok(result) => result,
            Err(e) => {
                warn!(claim_id = key, error = %e, "Claim lookup failed");
                None
            }
        }
    }

    /// Deletes the result for `key` and persists the map
    pub async fn remove(&self, key: &str) -> Result<Option<ClaimProcessingResult>, StoreError> {
        let mut results = self.results.write().await;
        let removed = results.remove(key.trim());
        self.persist(&results).await?;
        Ok(removed)
    }

    /// Drops every result, in memory and in durable storage
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut results = self.results.write().await;
        results.clear();
        self.port.clear(&self.key).await?;
        info!(storage_key = %self.key, "Cleared claim results");
        Ok(())
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.results.read().await.contains_key(key.trim())
    }

    /// Keys currently in memory, sorted
    pub async fn keys(&self) -> Vec<ClaimKey> {
        let mut keys: Vec<_> = self.results.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Entries currently in memory, sorted by key
    pub async fn entries(&self) -> Vec<(ClaimKey, ClaimProcessingResult)> {
        let mut entries: Vec<_> = self
            .results
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub async fn len(&self) -> usize {
        self.results.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.results.read().await.is_empty()
    }

    /// Reloads if `change` touches this store's key
    ///
    /// Returns whether a reload happened.
    pub async fn handle_change(&self, change: &StorageChange) -> Result<bool, StoreError> {
        if !change.affects(&self.key) {
            return Ok(false);
        }
        let count = self.reload().await?;
        info!(storage_key = %self.key, origin = %change.origin, count, "Reloaded claim results after external change");
        Ok(true)
    }

    /// Keeps this store in step with writes made by other views
    ///
    /// The task holds only a weak reference; it stops at the first change
    /// after the store is dropped, or when the subscription ends.
    pub fn spawn_sync(self: &Arc<Self>, mut subscription: StorageSubscription) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(change) = subscription.recv().await {
                let Some(store) = store.upgrade() else {
                    break;
                };
                if let Err(e) = store.handle_change(&change).await {
                    warn!(storage_key = %store.key, error = %e, "Failed to reload claim results");
                }
            }
            debug!("Claim store sync stopped");
        })
    }

    async fn read_durable(&self) -> Result<ResultMap, StoreError> {
        match self.port.load(&self.key).await? {
            Some(raw) => decode_results(&raw),
            None => Ok(HashMap::new()),
        }
    }

    async fn persist(&self, results: &ResultMap) -> Result<(), StoreError> {
        let ordered: BTreeMap<&ClaimKey, &ClaimProcessingResult> = results.iter().collect();
        let document = serde_json::to_string(&ordered).map_err(StoreError::Encode)?;
        if let Err(e) = self.port.save(&self.key, &document).await {
            warn!(storage_key = %self.key, error = %e, "Failed to persist claim results");
            return Err(e.into());
        }
        Ok(())
    }
}

/// Parses the durable document entry by entry
///
/// A document that is not a JSON object fails as a whole; a single entry
/// that does not decode is skipped.
fn decode_results(raw: &str) -> Result<ResultMap, StoreError> {
    let entries: HashMap<String, Value> = serde_json::from_str(raw).map_err(StoreError::Malformed)?;

    let mut results = HashMap::with_capacity(entries.len());
    for (id, value) in entries {
        let key = match ClaimKey::new(id.as_str()) {
            Ok(key) => key,
            Err(e) => {
                warn!(claim_id = %id, error = %e, "Skipping stored result with invalid key");
                continue;
            }
        };
        match serde_json::from_value::<ClaimProcessingResult>(value) {
            Ok(result) => {
                results.insert(key, result);
            }
            Err(e) => warn!(claim_id = %key, error = %e, "Skipping malformed stored result"),
        }
    }
    Ok(results)
}
