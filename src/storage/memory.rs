//! In-memory storage backend.
//!
//! Thread-safe reference implementation of [`StudentStore`]. Intended for
//! tests, the console menu, and embedded use; data is lost on process exit.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::record::StudentRecord;
use crate::storage::traits::{StorageError, StudentStore};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Map of records plus an explicit insertion-order index, so `list` never
/// depends on map iteration order.
#[derive(Debug, Default)]
pub(crate) struct RecordIndex {
    by_id: HashMap<String, StudentRecord>,
    order: Vec<String>,
}

impl RecordIndex {
    pub(crate) fn insert(&mut self, record: StudentRecord) -> Result<(), StorageError> {
        if self.by_id.contains_key(&record.id) {
            return Err(StorageError::DuplicateKey(record.id.clone()));
        }
        self.order.push(record.id.clone());
        self.by_id.insert(record.id.clone(), record);
        Ok(())
    }

    pub(crate) fn get(&self, id: &str) -> Option<StudentRecord> {
        self.by_id.get(id).cloned()
    }

    pub(crate) fn list(&self) -> Vec<StudentRecord> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .cloned()
            .collect()
    }

    pub(crate) fn replace(&mut self, record: StudentRecord) -> Result<(), StorageError> {
        if !self.by_id.contains_key(&record.id) {
            return Err(StorageError::StudentNotFound(record.id.clone()));
        }
        self.by_id.insert(record.id.clone(), record);
        Ok(())
    }

    pub(crate) fn delete(&mut self, id: &str) -> Result<(), StorageError> {
        if self.by_id.remove(id).is_none() {
            return Err(StorageError::StudentNotFound(id.to_string()));
        }
        self.order.retain(|existing| existing != id);
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }
}

/// Thread-safe in-memory student store.
#[derive(Debug, Default)]
pub struct InMemoryStudentStore {
    state: RwLock<RecordIndex>,
}

impl InMemoryStudentStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    ///
    /// # Errors
    /// `BackendError` if the internal lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("memory.len"))?;
        Ok(state.len())
    }

    /// Whether the store holds no records.
    ///
    /// # Errors
    /// `BackendError` if the internal lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl StudentStore for InMemoryStudentStore {
    fn insert(&self, record: StudentRecord) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("memory.insert"))?;
        state.insert(record)
    }

    fn get(&self, id: &str) -> Result<Option<StudentRecord>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("memory.get"))?;
        Ok(state.get(id))
    }

    fn list(&self) -> Result<Vec<StudentRecord>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("memory.list"))?;
        Ok(state.list())
    }

    fn replace(&self, record: StudentRecord) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("memory.replace"))?;
        state.replace(record)
    }

    fn delete(&self, id: &str) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("memory.delete"))?;
        state.delete(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, english: i32) -> StudentRecord {
        let total = english + 80 + 80;
        StudentRecord {
            id: id.to_string(),
            name: format!("student {id}"),
            email: None,
            english,
            maths: 80,
            science: 80,
            total,
            average: f64::from(total) / 3.0,
            grade: 'B',
        }
    }

    #[test]
    fn insert_then_get_round_trips() {
        let store = InMemoryStudentStore::new();
        store.insert(record("S1", 90)).unwrap();

        let fetched = store.get("S1").unwrap().unwrap();
        assert_eq!(fetched.id, "S1");
        assert_eq!(fetched.english, 90);
    }

    #[test]
    fn get_missing_returns_none() {
        let store = InMemoryStudentStore::new();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn insert_duplicate_fails_and_preserves_original() {
        let store = InMemoryStudentStore::new();
        store.insert(record("S1", 90)).unwrap();

        let err = store.insert(record("S1", 10)).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateKey(id) if id == "S1"));

        // The original record is untouched.
        assert_eq!(store.get("S1").unwrap().unwrap().english, 90);
    }

    #[test]
    fn list_preserves_insertion_order() {
        let store = InMemoryStudentStore::new();
        for id in ["S3", "S1", "S2"] {
            store.insert(record(id, 75)).unwrap();
        }

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["S3", "S1", "S2"]);
    }

    #[test]
    fn replace_requires_existing_record() {
        let store = InMemoryStudentStore::new();
        let err = store.replace(record("S1", 50)).unwrap_err();
        assert!(matches!(err, StorageError::StudentNotFound(id) if id == "S1"));

        store.insert(record("S1", 50)).unwrap();
        store.replace(record("S1", 70)).unwrap();
        assert_eq!(store.get("S1").unwrap().unwrap().english, 70);
    }

    #[test]
    fn replace_keeps_insertion_position() {
        let store = InMemoryStudentStore::new();
        store.insert(record("S1", 50)).unwrap();
        store.insert(record("S2", 60)).unwrap();
        store.replace(record("S1", 95)).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["S1", "S2"]);
    }

    #[test]
    fn delete_removes_permanently() {
        let store = InMemoryStudentStore::new();
        store.insert(record("S1", 50)).unwrap();
        store.delete("S1").unwrap();

        assert!(store.get("S1").unwrap().is_none());
        assert!(store.is_empty().unwrap());

        let err = store.delete("S1").unwrap_err();
        assert!(matches!(err, StorageError::StudentNotFound(_)));
    }

    #[test]
    fn concurrent_inserts_all_land() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryStudentStore::new());
        let mut handles = Vec::new();

        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                store.insert(record(&format!("S{i}"), 80)).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len().unwrap(), 32);
    }
}
