//! Tests for the claim result store over both storage adapters

use std::sync::Arc;
use std::time::Duration;

use infra_store::{
    ClaimResultStore, FileKeyValueStore, KeyValuePort, LocalStorage, StorageEvents, StoreError,
    DEFAULT_STORAGE_KEY,
};
use test_utils::{claim_result_strategy, ClaimFixtures, ClaimResultBuilder};

async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

// ============================================================================
// Single View Tests
// ============================================================================

mod single_view_tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get_returns_same_result() {
        let tab = Arc::new(LocalStorage::new().tab());
        let store = ClaimResultStore::open(tab).await;
        let result = ClaimFixtures::low_risk_result();

        store.set(ClaimFixtures::claim_key(), result.clone()).await.unwrap();

        assert_eq!(store.get(ClaimFixtures::CLAIM_ID).await, Some(result));
        assert!(store.contains(ClaimFixtures::CLAIM_ID).await);
    }

    #[tokio::test]
    async fn test_second_set_overwrites() {
        let store = ClaimResultStore::open(Arc::new(LocalStorage::new().tab())).await;
        let first = ClaimFixtures::low_risk_result();
        let second = ClaimResultBuilder::new().with_risk_score(9.0).build();

        store.set(ClaimFixtures::claim_key(), first).await.unwrap();
        store.set(ClaimFixtures::claim_key(), second.clone()).await.unwrap();

        assert_eq!(store.get(ClaimFixtures::CLAIM_ID).await, Some(second));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_deletes_from_memory_and_storage() {
        let storage = LocalStorage::new();
        let store = ClaimResultStore::open(Arc::new(storage.tab())).await;
        store
            .set(ClaimFixtures::claim_key(), ClaimFixtures::low_risk_result())
            .await
            .unwrap();
        store
            .set(ClaimFixtures::other_claim_key(), ClaimFixtures::high_risk_result())
            .await
            .unwrap();

        let removed = store.remove(ClaimFixtures::CLAIM_ID).await.unwrap();

        assert!(removed.is_some());
        assert!(store.get(ClaimFixtures::CLAIM_ID).await.is_none());
        let raw = storage.raw(DEFAULT_STORAGE_KEY).await.unwrap();
        let document: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(document.get(ClaimFixtures::CLAIM_ID).is_none());
        assert!(document.get(ClaimFixtures::OTHER_CLAIM_ID).is_some());
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_none() {
        let store = ClaimResultStore::open(Arc::new(LocalStorage::new().tab())).await;
        assert!(store.remove("CLM-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_unknown_key_is_none() {
        let store = ClaimResultStore::open(Arc::new(LocalStorage::new().tab())).await;
        assert!(store.get("CLM-404").await.is_none());
        assert!(store.lookup("CLM-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keys_and_entries_are_sorted() {
        let store = ClaimResultStore::open(Arc::new(LocalStorage::new().tab())).await;
        store
            .set(ClaimFixtures::other_claim_key(), ClaimFixtures::high_risk_result())
            .await
            .unwrap();
        store
            .set(ClaimFixtures::claim_key(), ClaimFixtures::low_risk_result())
            .await
            .unwrap();

        let keys: Vec<String> = store.keys().await.iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec![ClaimFixtures::CLAIM_ID, ClaimFixtures::OTHER_CLAIM_ID]);

        let entries = store.entries().await;
        assert_eq!(entries[0].0, ClaimFixtures::claim_key());
        assert_eq!(entries[1].1, ClaimFixtures::high_risk_result());
    }

    #[tokio::test]
    async fn test_clear_empties_storage() {
        let storage = LocalStorage::new();
        let store = ClaimResultStore::open(Arc::new(storage.tab())).await;
        store
            .set(ClaimFixtures::claim_key(), ClaimFixtures::low_risk_result())
            .await
            .unwrap();

        store.clear().await.unwrap();

        assert!(store.is_empty().await);
        assert!(storage.raw(DEFAULT_STORAGE_KEY).await.is_none());
    }

    #[tokio::test]
    async fn test_mismatched_ids_are_stored_as_is() {
        let store = ClaimResultStore::open(Arc::new(LocalStorage::new().tab())).await;
        let mut result = ClaimFixtures::low_risk_result();
        result.routing_decision.claim_id = "CLM-OTHER".to_string();

        store.set(ClaimFixtures::claim_key(), result.clone()).await.unwrap();
        assert_eq!(store.get(ClaimFixtures::CLAIM_ID).await, Some(result));
    }

    #[tokio::test]
    async fn test_custom_storage_key() {
        let storage = LocalStorage::new();
        let store = ClaimResultStore::with_key(Arc::new(storage.tab()), "claims_v2").await;
        store
            .set(ClaimFixtures::claim_key(), ClaimFixtures::low_risk_result())
            .await
            .unwrap();

        assert_eq!(store.storage_key(), "claims_v2");
        assert!(storage.raw("claims_v2").await.is_some());
        assert!(storage.raw(DEFAULT_STORAGE_KEY).await.is_none());
    }
}

// ============================================================================
// Durable Data Tests
// ============================================================================

mod durable_data_tests {
    use super::*;

    #[tokio::test]
    async fn test_malformed_document_loads_empty() {
        let storage = LocalStorage::new();
        storage.put_raw(DEFAULT_STORAGE_KEY, "{this is not json").await;

        let store = ClaimResultStore::open(Arc::new(storage.tab())).await;

        assert!(store.is_empty().await);
        let err = store.reload().await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_malformed_entry_is_skipped() {
        let storage = LocalStorage::new();
        let good = serde_json::to_value(ClaimFixtures::low_risk_result()).unwrap();
        let mut document = serde_json::Map::new();
        document.insert(ClaimFixtures::CLAIM_ID.to_string(), good);
        document.insert(
            "CLM-BROKEN".to_string(),
            serde_json::json!({ "risk_report": { "risk_score": "high" } }),
        );
        storage
            .put_raw(
                DEFAULT_STORAGE_KEY,
                serde_json::Value::Object(document).to_string(),
            )
            .await;

        let store = ClaimResultStore::open(Arc::new(storage.tab())).await;

        assert_eq!(store.reload().await.unwrap(), 1);
        assert!(store.get("CLM-BROKEN").await.is_none());
        assert!(store.get(ClaimFixtures::CLAIM_ID).await.is_some());
    }

    #[tokio::test]
    async fn test_get_backfills_from_storage() {
        let storage = LocalStorage::new();
        let reader = ClaimResultStore::open(Arc::new(storage.tab())).await;
        let writer = ClaimResultStore::open(Arc::new(storage.tab())).await;

        writer
            .set(ClaimFixtures::claim_key(), ClaimFixtures::low_risk_result())
            .await
            .unwrap();

        assert!(!reader.contains(ClaimFixtures::CLAIM_ID).await);
        assert_eq!(
            reader.get(ClaimFixtures::CLAIM_ID).await,
            Some(ClaimFixtures::low_risk_result())
        );
        assert!(reader.contains(ClaimFixtures::CLAIM_ID).await);
    }

    #[tokio::test]
    async fn test_fresh_instance_sees_persisted_results() {
        let storage = LocalStorage::new();
        {
            let store = ClaimResultStore::open(Arc::new(storage.tab())).await;
            store
                .set(ClaimFixtures::claim_key(), ClaimFixtures::low_risk_result())
                .await
                .unwrap();
        }

        let reopened = ClaimResultStore::open(Arc::new(storage.tab())).await;
        assert_eq!(reopened.len().await, 1);
    }
}

// ============================================================================
// Cross-View Sync Tests
// ============================================================================

mod sync_tests {
    use super::*;

    #[tokio::test]
    async fn test_change_notification_reloads_other_view() {
        let storage = LocalStorage::new();
        let first_tab = Arc::new(storage.tab());
        let second_tab = Arc::new(storage.tab());
        let first = Arc::new(ClaimResultStore::open(first_tab.clone()).await);
        let second = Arc::new(ClaimResultStore::open(second_tab.clone()).await);
        let _sync = second.spawn_sync(second_tab.subscribe());

        first
            .set(ClaimFixtures::claim_key(), ClaimFixtures::low_risk_result())
            .await
            .unwrap();

        let watched = second.clone();
        wait_until(|| {
            let store = watched.clone();
            async move { store.contains(ClaimFixtures::CLAIM_ID).await }
        })
        .await;

        first.remove(ClaimFixtures::CLAIM_ID).await.unwrap();
        let watched = second.clone();
        wait_until(|| {
            let store = watched.clone();
            async move { store.is_empty().await }
        })
        .await;
    }

    #[tokio::test]
    async fn test_handle_change_ignores_other_keys() {
        let storage = LocalStorage::new();
        let tab = Arc::new(storage.tab());
        let store = ClaimResultStore::open(tab.clone()).await;
        let other_tab = storage.tab();
        let mut changes = tab.subscribe();

        other_tab.save("unrelated", "{}").await.unwrap();
        let change = changes.recv().await.unwrap();

        assert!(!store.handle_change(&change).await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_all_empties_every_view() {
        let storage = LocalStorage::new();
        let tab = Arc::new(storage.tab());
        let store = Arc::new(ClaimResultStore::open(tab.clone()).await);
        store
            .set(ClaimFixtures::claim_key(), ClaimFixtures::low_risk_result())
            .await
            .unwrap();
        let _sync = store.spawn_sync(tab.subscribe());

        storage.clear_all().await;

        let watched = store.clone();
        wait_until(|| {
            let store = watched.clone();
            async move { store.is_empty().await }
        })
        .await;
    }

    #[tokio::test]
    async fn test_own_writes_do_not_trigger_reload() {
        let storage = LocalStorage::new();
        let tab = Arc::new(storage.tab());
        let store = ClaimResultStore::open(tab.clone()).await;
        let mut changes = tab.subscribe();

        store
            .set(ClaimFixtures::claim_key(), ClaimFixtures::low_risk_result())
            .await
            .unwrap();
        storage.put_raw("marker", "1").await;

        let change = changes.recv().await.unwrap();
        assert_eq!(change.key.as_deref(), Some("marker"));
    }
}

// ============================================================================
// File Adapter Tests
// ============================================================================

mod file_adapter_tests {
    use super::*;
    use core_kernel::AdapterHealth;
    use core_kernel::HealthCheckable;

    #[tokio::test]
    async fn test_results_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = Arc::new(FileKeyValueStore::new(dir.path()));
        let store = ClaimResultStore::open(adapter).await;
        store
            .set(ClaimFixtures::claim_key(), ClaimFixtures::low_risk_result())
            .await
            .unwrap();

        let reopened = ClaimResultStore::open(Arc::new(FileKeyValueStore::new(dir.path()))).await;
        assert_eq!(
            reopened.get(ClaimFixtures::CLAIM_ID).await,
            Some(ClaimFixtures::low_risk_result())
        );
        assert!(dir.path().join("fnol_claim_results.json").exists());
    }

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FileKeyValueStore::new(dir.path().join("not-yet"));
        assert!(adapter.load("fnol_claim_results").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FileKeyValueStore::new(dir.path());
        adapter.save("k", "{}").await.unwrap();
        adapter.clear("k").await.unwrap();
        adapter.clear("k").await.unwrap();

        assert!(!dir.path().join("k.json").exists());
    }

    #[tokio::test]
    async fn test_write_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FileKeyValueStore::new(dir.path());
        adapter.save("k", "one").await.unwrap();
        adapter.save("k", "two").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
        assert_eq!(adapter.load("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_handles_notify_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let first = Arc::new(FileKeyValueStore::new(dir.path()));
        let second = Arc::new(first.handle());
        let first_store = ClaimResultStore::open(first.clone()).await;
        let second_store = Arc::new(ClaimResultStore::open(second.clone()).await);
        let _sync = second_store.spawn_sync(second.subscribe());

        first_store
            .set(ClaimFixtures::claim_key(), ClaimFixtures::low_risk_result())
            .await
            .unwrap();

        let watched = second_store.clone();
        wait_until(|| {
            let store = watched.clone();
            async move { store.contains(ClaimFixtures::CLAIM_ID).await }
        })
        .await;
    }

    #[tokio::test]
    async fn test_health_reports_missing_directory_as_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FileKeyValueStore::new(dir.path().join("later"));
        assert_eq!(adapter.health_check().await.status, AdapterHealth::Degraded);

        let adapter = FileKeyValueStore::new(dir.path());
        assert_eq!(adapter.health_check().await.status, AdapterHealth::Healthy);
    }

    #[tokio::test]
    async fn test_invalid_key_surfaces_as_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = Arc::new(FileKeyValueStore::new(dir.path()));
        let store = ClaimResultStore::with_key(adapter, "bad/key").await;

        let err = store
            .set(ClaimFixtures::claim_key(), ClaimFixtures::low_risk_result())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        // The in-memory entry survives the failed write
        assert!(store.contains(ClaimFixtures::CLAIM_ID).await);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;
    use domain_claims::ClaimProcessingResult;
    use proptest::prelude::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn key_of(result: &ClaimProcessingResult) -> core_kernel::ClaimKey {
        result.claim_key().unwrap()
    }

    proptest! {
        #[test]
        fn set_then_get_returns_result_in_same_and_fresh_view(
            result in claim_result_strategy()
        ) {
            let (same, fresh) = block_on(async {
                let storage = LocalStorage::new();
                let writer = ClaimResultStore::open(Arc::new(storage.tab())).await;
                writer.set(key_of(&result), result.clone()).await.unwrap();
                let same = writer.get(key_of(&result).as_str()).await;

                let reader = ClaimResultStore::open(Arc::new(storage.tab())).await;
                let fresh = reader.get(key_of(&result).as_str()).await;
                (same, fresh)
            });

            prop_assert_eq!(same, Some(result.clone()));
            prop_assert_eq!(fresh, Some(result));
        }

        #[test]
        fn second_set_wins_after_reload(
            first in claim_result_strategy(),
            second in claim_result_strategy()
        ) {
            let key = key_of(&first);
            let stored = block_on(async {
                let storage = LocalStorage::new();
                let writer = ClaimResultStore::open(Arc::new(storage.tab())).await;
                writer.set(key.clone(), first).await.unwrap();
                writer.set(key.clone(), second.clone()).await.unwrap();

                let reader = ClaimResultStore::open(Arc::new(storage.tab())).await;
                (reader.len().await, reader.get(key.as_str()).await)
            });

            prop_assert_eq!(stored, (1, Some(second)));
        }
    }
}
