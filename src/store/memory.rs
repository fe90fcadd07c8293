//! In-memory store implementation using `DashMap`.
//!
//! Data is lost on process restart; this backend exists for tests and
//! ephemeral runs. For persistence, use `SqliteStore`.

use super::{ImpressionRecord, RecordId, ResultRecord, SurveyStore};
use crate::Result;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory append-only store backed by lock-free concurrent hashmaps.
///
/// Identifiers are assigned from a shared atomic counter, so results and
/// impressions never reuse an id. Snapshot accessors expose the appended
/// records for counting-style assertions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    results: DashMap<u64, ResultRecord>,
    impressions: DashMap<u64, ImpressionRecord>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of appended results.
    #[must_use]
    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    /// Number of appended impressions.
    #[must_use]
    pub fn impression_count(&self) -> usize {
        self.impressions.len()
    }

    /// Check if nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.impressions.is_empty()
    }

    /// Snapshot of appended results in append order.
    #[must_use]
    pub fn results(&self) -> Vec<ResultRecord> {
        let mut rows: Vec<(u64, ResultRecord)> = self
            .results
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        rows.sort_by_key(|(id, _)| *id);
        rows.into_iter().map(|(_, record)| record).collect()
    }

    /// Snapshot of appended impressions in append order.
    #[must_use]
    pub fn impressions(&self) -> Vec<ImpressionRecord> {
        let mut rows: Vec<(u64, ImpressionRecord)> = self
            .impressions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        rows.sort_by_key(|(id, _)| *id);
        rows.into_iter().map(|(_, record)| record).collect()
    }

    /// Count impressions recorded for one variant survey name.
    #[must_use]
    pub fn impressions_for(&self, survey_name: &str) -> usize {
        self.impressions
            .iter()
            .filter(|entry| entry.value().survey_name() == survey_name)
            .count()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl SurveyStore for MemoryStore {
    async fn append_result(&self, record: ResultRecord) -> Result<RecordId> {
        let id = self.allocate_id();
        self.results.insert(id, record);
        Ok(RecordId::new(id))
    }

    async fn append_impression(&self, record: ImpressionRecord) -> Result<RecordId> {
        let id = self.allocate_id();
        self.impressions.insert(id, record);
        Ok(RecordId::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_append_result() {
        let store = MemoryStore::new();

        let id = store
            .append_result(ResultRecord::new("s", "en", serde_json::json!({"q1": 5})))
            .await
            .unwrap();

        assert_eq!(id.value(), 1);
        assert_eq!(store.result_count(), 1);
        assert_eq!(store.results()[0].survey_data(), &serde_json::json!({"q1": 5}));
    }

    #[tokio::test]
    async fn test_memory_store_append_impression() {
        let store = MemoryStore::new();

        store
            .append_impression(ImpressionRecord::new("variant-a", "en"))
            .await
            .unwrap();
        store
            .append_impression(ImpressionRecord::new("variant-a", "en"))
            .await
            .unwrap();
        store
            .append_impression(ImpressionRecord::new("variant-b", "en"))
            .await
            .unwrap();

        assert_eq!(store.impression_count(), 3);
        assert_eq!(store.impressions_for("variant-a"), 2);
        assert_eq!(store.impressions_for("variant-b"), 1);
        assert_eq!(store.impressions_for("variant-c"), 0);
    }

    #[tokio::test]
    async fn test_ids_are_unique_across_relations() {
        let store = MemoryStore::new();

        let r = store
            .append_result(ResultRecord::new("s", "en", serde_json::json!({})))
            .await
            .unwrap();
        let i = store
            .append_impression(ImpressionRecord::new("v", "en"))
            .await
            .unwrap();

        assert_ne!(r, i);
    }

    #[tokio::test]
    async fn test_concurrent_appends() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStore::new());
        let mut handles = vec![];

        for i in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append_impression(ImpressionRecord::new(format!("v{i}"), "en"))
                    .await
                    .unwrap()
            }));
        }

        let mut ids = vec![];
        for handle in handles {
            ids.push(handle.await.unwrap().value());
        }
        ids.sort_unstable();
        ids.dedup();

        assert_eq!(ids.len(), 50);
        assert_eq!(store.impression_count(), 50);
    }

    #[test]
    fn test_memory_store_default() {
        let store = MemoryStore::default();
        assert!(store.is_empty());
    }
}
