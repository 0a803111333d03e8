use dashmap::DashMap;
use std::sync::Arc;

use crate::models::{OperationId, OperationStatus};

/// Process-lifetime map from operation id to status string.
///
/// Backed by a sharded concurrent map: writes to one key are linearizable and
/// writes to different keys never contend on a global lock. Cloning shares
/// the same map. Entries never expire; callers that need cleanup use
/// [`remove`](Self::remove).
#[derive(Clone, Debug, Default)]
pub struct OperationStatusStore {
    statuses: Arc<DashMap<String, String>>,
}

impl OperationStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the status for `operation_id`. Last writer wins.
    pub fn set_status(&self, operation_id: impl Into<String>, status: impl Into<String>) {
        self.statuses.insert(operation_id.into(), status.into());
    }

    /// Current status for `operation_id`, or `"Unknown"` if none was recorded.
    pub fn get_status(&self, operation_id: &str) -> String {
        self.statuses
            .get(operation_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| OperationStatus::Unknown.to_string())
    }

    /// Typed shorthand for [`set_status`](Self::set_status).
    pub fn record(&self, operation_id: &OperationId, status: OperationStatus) {
        tracing::debug!(operation_id = %operation_id, status = %status, "Operation status changed");
        self.set_status(operation_id.as_str(), status.to_string());
    }

    pub fn remove(&self, operation_id: &str) -> Option<String> {
        self.statuses.remove(operation_id).map(|(_, status)| status)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_id_is_unknown() {
        let store = OperationStatusStore::new();
        assert_eq!(store.get_status("never-written"), "Unknown");
        assert_eq!(store.get_status(""), "Unknown");
        assert!(store.is_empty());
    }

    #[test]
    fn test_read_after_write_returns_written_status() {
        let store = OperationStatusStore::new();
        store.set_status("op-1", "Pending");
        assert_eq!(store.get_status("op-1"), "Pending");

        store.set_status("op-1", "Completed");
        assert_eq!(store.get_status("op-1"), "Completed");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_accepts_open_ended_statuses() {
        let store = OperationStatusStore::new();
        store.set_status("op", "Halfway there");
        assert_eq!(store.get_status("op"), "Halfway there");
    }

    #[test]
    fn test_record_uses_string_form() {
        let store = OperationStatusStore::new();
        let id = OperationId::parse("op-typed").unwrap();
        store.record(&id, OperationStatus::Retrying);
        assert_eq!(store.get_status("op-typed"), "Retrying");
    }

    #[test]
    fn test_remove_resets_to_unknown() {
        let store = OperationStatusStore::new();
        store.set_status("op", "Failed");
        assert_eq!(store.remove("op").as_deref(), Some("Failed"));
        assert_eq!(store.get_status("op"), "Unknown");
        assert!(store.remove("op").is_none());
    }

    #[test]
    fn test_clones_share_entries() {
        let store = OperationStatusStore::new();
        let clone = store.clone();
        clone.set_status("shared", "Completed");
        assert_eq!(store.get_status("shared"), "Completed");
    }

    #[test]
    fn test_concurrent_writers_on_distinct_ids() {
        const THREADS: usize = 32;
        const PER_THREAD: usize = 100;

        let store = OperationStatusStore::new();

        std::thread::scope(|scope| {
            for t in 0..THREADS {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..PER_THREAD {
                        store.set_status(format!("op-{t}-{i}"), format!("status-{t}-{i}"));
                    }
                });
            }
        });

        assert_eq!(store.len(), THREADS * PER_THREAD);
        for t in 0..THREADS {
            for i in 0..PER_THREAD {
                assert_eq!(store.get_status(&format!("op-{t}-{i}")), format!("status-{t}-{i}"));
            }
        }
    }

    #[test]
    fn test_concurrent_writes_to_same_key_leave_a_whole_value() {
        let store = OperationStatusStore::new();
        let candidates: Vec<String> = (0..16).map(|i| format!("value-{i}-{}", "x".repeat(i))).collect();

        std::thread::scope(|scope| {
            for value in &candidates {
                let store = &store;
                scope.spawn(move || {
                    for _ in 0..200 {
                        store.set_status("contended", value.as_str());
                        let seen = store.get_status("contended");
                        assert!(seen.starts_with("value-"));
                    }
                });
            }
        });

        assert!(candidates.contains(&store.get_status("contended")));
    }
}
