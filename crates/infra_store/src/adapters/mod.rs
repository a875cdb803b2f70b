//! Storage Adapters
//!
//! Implementations of [`KeyValuePort`](crate::ports::KeyValuePort):
//! - **LocalStorage**: in-memory area shared by several views (tabs)
//! - **FileKeyValueStore**: one JSON file per key in a directory

pub mod file;
pub mod memory;

pub use file::FileKeyValueStore;
pub use memory::{LocalStorage, LocalStorageTab};
