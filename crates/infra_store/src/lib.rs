//! Claim Result Persistence
//!
//! Durable, cross-view storage of claim processing results.
//!
//! # Architecture
//!
//! ```text
//! ClaimResultStore ──► KeyValuePort ◄── LocalStorageTab (shared memory area)
//!        ▲                          ◄── FileKeyValueStore (JSON file per key)
//!        │
//!  StorageSubscription ◄── StorageEvents (same adapters)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_store::{ClaimResultStore, LocalStorage, StorageEvents};
//! use std::sync::Arc;
//!
//! let storage = LocalStorage::new();
//! let tab = Arc::new(storage.tab());
//! let store = Arc::new(ClaimResultStore::open(tab.clone()).await);
//! store.spawn_sync(tab.subscribe());
//! ```

pub mod adapters;
pub mod error;
pub mod ports;
pub mod store;

pub use adapters::{FileKeyValueStore, LocalStorage, LocalStorageTab};
pub use error::StoreError;
pub use ports::{KeyValuePort, StorageChange, StorageEvents, StorageSubscription};
pub use store::{ClaimResultStore, DEFAULT_STORAGE_KEY};
