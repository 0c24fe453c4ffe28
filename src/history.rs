use thiserror::Error;

use crate::models::{HistoryId, HistoryItem};
use crate::storage::KeyValueStore;

pub const HISTORY_KEY: &str = "analysis_history";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("history storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("history could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Owns the list of past analyses, newest first, mirrored to one storage slot.
///
/// Persistence is best-effort: failures are logged and the in-memory list stays
/// authoritative until the next successful write.
pub struct HistoryStore<S: KeyValueStore> {
    storage: S,
    items: Vec<HistoryItem>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Read the persisted slot. A missing slot gives an empty history; an unreadable
    /// or corrupted one is discarded.
    pub fn load(mut storage: S) -> Self {
        let items = match storage.get(HISTORY_KEY) {
            Ok(None) => Vec::new(),
            Ok(Some(data)) => match serde_json::from_str::<Vec<HistoryItem>>(&data) {
                Ok(items) => items,
                Err(e) => {
                    discard_corrupted(&mut storage, &e);
                    Vec::new()
                }
            },
            // Bytes that are not UTF-8 are as corrupt as bad JSON
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                discard_corrupted(&mut storage, &e);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Failed to read history, starting empty: {}", e);
                Vec::new()
            }
        };
        tracing::debug!("Loaded {} history entries", items.len());
        Self { storage, items }
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: HistoryId) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: HistoryId) -> bool {
        self.get(id).is_some()
    }

    /// Largest id on record, used to seed the id generator after a reload.
    pub fn latest_id(&self) -> Option<HistoryId> {
        self.items.iter().map(|item| item.id).max()
    }

    /// Prepend an entry and write the full list back.
    pub fn append(&mut self, item: HistoryItem) {
        self.items.insert(0, item);
        if let Err(e) = self.persist() {
            tracing::warn!("Failed to persist history: {}", e);
        }
    }

    /// Empty the list and delete the slot.
    pub fn clear(&mut self) {
        self.items.clear();
        if let Err(e) = self.storage.remove(HISTORY_KEY) {
            tracing::warn!("Failed to delete history slot: {}", e);
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.items)?;
        self.storage.set(HISTORY_KEY, &json)?;
        Ok(())
    }
}

fn discard_corrupted<S: KeyValueStore>(storage: &mut S, cause: &dyn std::fmt::Display) {
    tracing::warn!("Discarding corrupted history: {}", cause);
    if let Err(e) = storage.remove(HISTORY_KEY) {
        tracing::warn!("Failed to remove corrupted history slot: {}", e);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io;

    use super::*;
    use crate::models::{AnalysisResult, Metric, Recommendation};
    use crate::storage::{FileStore, MemoryStore};

    pub(crate) fn sample_item(id: u64, file_name: &str) -> HistoryItem {
        HistoryItem {
            id: HistoryId(id),
            file_name: file_name.to_string(),
            timestamp: format!("2024-01-01 00:00:{:02}", id % 60),
            result: AnalysisResult {
                overall_score: 70.0,
                recommendation: Recommendation::NeedsWork,
                summary: "Solid, a little quiet.".to_string(),
                metrics: vec![Metric {
                    name: "Loudness (LUFS)".to_string(),
                    value: "-15 LUFS".to_string(),
                    rating: 6.0,
                    explanation: "Below the radio target.".to_string(),
                }],
            },
        }
    }

    /// Reads fine, every write fails.
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> io::Result<Option<String>> {
            self.0.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }

        fn remove(&mut self, _key: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    /// Every read fails with a plain I/O error.
    struct UnreadableStore(MemoryStore);

    impl KeyValueStore for UnreadableStore {
        fn get(&self, _key: &str) -> io::Result<Option<String>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
        }

        fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
            self.0.set(key, value)
        }

        fn remove(&mut self, key: &str) -> io::Result<()> {
            self.0.remove(key)
        }
    }

    #[test]
    fn test_load_missing_slot_is_empty() {
        let store = HistoryStore::load(MemoryStore::new());
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupted_slot_discards_it() {
        let store = HistoryStore::load(MemoryStore::with_slot(HISTORY_KEY, "{not json"));
        assert!(store.is_empty());
        assert!(!store.storage().contains(HISTORY_KEY));
    }

    #[test]
    fn test_load_wrong_shape_is_corrupted() {
        let store = HistoryStore::load(MemoryStore::with_slot(
            HISTORY_KEY,
            r#"[{"id": 1, "fileName": "a.wav"}]"#,
        ));
        assert!(store.is_empty());
        assert!(!store.storage().contains(HISTORY_KEY));
    }

    #[test]
    fn test_load_non_utf8_slot_discards_it() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileStore::new(dir.path());
        let slot = files.slot_path(HISTORY_KEY);
        std::fs::write(&slot, [0xff, 0xfe, b'[', b']']).unwrap();

        let store = HistoryStore::load(files);
        assert!(store.is_empty());
        assert!(!slot.exists());
    }

    #[test]
    fn test_load_io_failure_keeps_slot() {
        let mut store = HistoryStore::load(UnreadableStore(MemoryStore::with_slot(HISTORY_KEY, "[]")));
        assert!(store.is_empty());
        assert!(store.storage().0.contains(HISTORY_KEY));
        store.append(sample_item(1, "a.wav"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_append_prepends_and_persists_snapshot() {
        let mut store = HistoryStore::load(MemoryStore::new());
        store.append(sample_item(1, "a.wav"));
        store.append(sample_item(2, "b.wav"));

        assert_eq!(store.items()[0].file_name, "b.wav");
        assert_eq!(store.items()[1].file_name, "a.wav");

        let persisted = store.storage().get(HISTORY_KEY).unwrap().unwrap();
        let decoded: Vec<HistoryItem> = serde_json::from_str(&persisted).unwrap();
        assert_eq!(decoded, store.items());
    }

    #[test]
    fn test_reload_keeps_storage_order() {
        let mut store = HistoryStore::load(MemoryStore::new());
        store.append(sample_item(1, "a.wav"));
        store.append(sample_item(2, "b.wav"));

        let reloaded = HistoryStore::load(store.storage().clone());
        let names: Vec<&str> = reloaded.items().iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["b.wav", "a.wav"]);
        assert_eq!(reloaded.latest_id(), Some(HistoryId(2)));
    }

    #[test]
    fn test_clear_removes_slot() {
        let mut store = HistoryStore::load(MemoryStore::new());
        store.append(sample_item(1, "a.wav"));
        store.clear();
        assert!(store.is_empty());
        assert!(!store.storage().contains(HISTORY_KEY));
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut store = HistoryStore::load(ReadOnlyStore(MemoryStore::new()));
        store.append(sample_item(1, "a.wav"));
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.is_empty());
    }
}
