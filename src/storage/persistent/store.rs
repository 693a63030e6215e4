//! Journal-backed student store.
//!
//! The store keeps the full record set in an in-memory index for fast reads
//! and writes every mutation to the journal before applying it, so a crash
//! at any point replays back to the last committed operation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::record::StudentRecord;
use crate::storage::memory::RecordIndex;
use crate::storage::traits::{StorageError, StudentStore};

use super::file_lock::StoreLock;
use super::journal::{Journal, JournalOp};
use super::JournalConfig;

/// Journal file name inside the store directory.
const JOURNAL_FILE: &str = "students.journal";

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

fn journal_err(context: &'static str, err: &std::io::Error) -> StorageError {
    StorageError::BackendError(format!("{context}: {err}"))
}

/// Durable single-process student store.
///
/// Opening acquires an exclusive lock on the directory; a second open fails
/// fast instead of corrupting the journal.
#[derive(Debug)]
pub struct PersistentStudentStore {
    dir: PathBuf,
    _lock: StoreLock,
    journal: Journal,
    state: RwLock<RecordIndex>,
    config: JournalConfig,
}

impl PersistentStudentStore {
    /// Open or create a store in the given directory.
    ///
    /// Replays the journal into the in-memory index. A torn tail write is
    /// trimmed off when the journal opens; corruption anywhere before the
    /// tail fails the open.
    pub(crate) fn open(dir: &Path, config: JournalConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).map_err(|e| {
            StorageError::ConnectionError(format!(
                "cannot create store directory {}: {e}",
                dir.display()
            ))
        })?;

        let lock = StoreLock::acquire(dir)
            .map_err(|e| StorageError::ConnectionError(format!("cannot lock store: {e}")))?;

        let journal = Journal::open(&dir.join(JOURNAL_FILE), config.sync_on_write)
            .map_err(|e| StorageError::ConnectionError(format!("cannot open journal: {e}")))?;

        let mut index = RecordIndex::default();
        let entries = journal
            .iter()
            .map_err(|e| StorageError::ConnectionError(format!("cannot read journal: {e}")))?;
        for entry in entries {
            let entry = entry.map_err(|e| {
                StorageError::ConnectionError(format!("journal replay failed: {e}"))
            })?;
            Self::apply(&mut index, entry.op)?;
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            _lock: lock,
            journal,
            state: RwLock::new(index),
            config,
        })
    }

    /// The directory this store lives in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rewrite the journal as a snapshot of the live records.
    ///
    /// Returns the number of records in the snapshot. Runs automatically
    /// when the journal outgrows the configured ceiling; exposed for
    /// explicit maintenance.
    pub fn compact(&self) -> Result<usize, StorageError> {
        let state = self.state.write().map_err(|_| lock_err("store.compact"))?;
        let records = state.list();
        self.journal
            .rewrite(&records)
            .map_err(|e| journal_err("journal compaction failed", &e))?;
        Ok(records.len())
    }

    /// Replay one journal operation into the index.
    ///
    /// Journal entries were validated when written, so a replay conflict
    /// means the journal itself is inconsistent.
    fn apply(index: &mut RecordIndex, op: JournalOp) -> Result<(), StorageError> {
        let result = match op {
            JournalOp::Insert(record) => index.insert(record),
            JournalOp::Replace(record) => index.replace(record),
            JournalOp::Delete { id } => index.delete(&id),
        };
        result.map_err(|e| StorageError::BackendError(format!("journal replay conflict: {e}")))
    }

    fn compact_if_oversized(&self, state: &RecordIndex) -> Result<(), StorageError> {
        let size = self
            .journal
            .size_bytes()
            .map_err(|e| journal_err("journal size check failed", &e))?;
        if size <= self.config.max_journal_size {
            return Ok(());
        }
        self.journal
            .rewrite(&state.list())
            .map_err(|e| journal_err("journal compaction failed", &e))
    }
}

impl StudentStore for PersistentStudentStore {
    fn insert(&self, record: StudentRecord) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("store.insert"))?;
        if state.get(&record.id).is_some() {
            return Err(StorageError::DuplicateKey(record.id));
        }

        self.journal
            .append(JournalOp::Insert(record.clone()))
            .map_err(|e| journal_err("journal append failed", &e))?;
        state.insert(record)?;
        self.compact_if_oversized(&state)
    }

    fn get(&self, id: &str) -> Result<Option<StudentRecord>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("store.get"))?;
        Ok(state.get(id))
    }

    fn list(&self) -> Result<Vec<StudentRecord>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("store.list"))?;
        Ok(state.list())
    }

    fn replace(&self, record: StudentRecord) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("store.replace"))?;
        if state.get(&record.id).is_none() {
            return Err(StorageError::StudentNotFound(record.id));
        }

        self.journal
            .append(JournalOp::Replace(record.clone()))
            .map_err(|e| journal_err("journal append failed", &e))?;
        state.replace(record)?;
        self.compact_if_oversized(&state)
    }

    fn delete(&self, id: &str) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("store.delete"))?;
        if state.get(id).is_none() {
            return Err(StorageError::StudentNotFound(id.to_string()));
        }

        self.journal
            .append(JournalOp::Delete { id: id.to_string() })
            .map_err(|e| journal_err("journal append failed", &e))?;
        state.delete(id)?;
        self.compact_if_oversized(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::persistent::open_store;
    use tempfile::tempdir;

    fn record(id: &str, english: i32) -> StudentRecord {
        let total = english + 80 + 80;
        StudentRecord {
            id: id.to_string(),
            name: format!("student {id}"),
            email: Some(format!("{id}@school.test")),
            english,
            maths: 80,
            science: 80,
            total,
            average: f64::from(total) / 3.0,
            grade: 'B',
        }
    }

    #[test]
    fn crud_round_trip() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path(), None).unwrap();

        store.insert(record("S1", 90)).unwrap();
        assert_eq!(store.get("S1").unwrap().unwrap().english, 90);

        store.replace(record("S1", 70)).unwrap();
        assert_eq!(store.get("S1").unwrap().unwrap().english, 70);

        store.delete("S1").unwrap();
        assert!(store.get("S1").unwrap().is_none());
    }

    #[test]
    fn duplicate_insert_is_rejected_before_journaling() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path(), None).unwrap();

        store.insert(record("S1", 90)).unwrap();
        let seq_after_insert = store.journal.current_sequence();

        let err = store.insert(record("S1", 10)).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateKey(_)));

        // The rejected insert must not have reached the journal.
        assert_eq!(store.journal.current_sequence(), seq_after_insert);
    }

    #[test]
    fn list_keeps_insertion_order_across_mutations() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path(), None).unwrap();

        for id in ["S2", "S1", "S3"] {
            store.insert(record(id, 60)).unwrap();
        }
        store.replace(record("S2", 99)).unwrap();
        store.delete("S1").unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["S2", "S3"]);
    }

    #[test]
    fn oversized_journal_compacts_automatically() {
        let dir = tempdir().unwrap();
        let config = JournalConfig {
            max_journal_size: JournalConfig::MIN_JOURNAL_SIZE,
            sync_on_write: false,
        };
        let store = open_store(dir.path(), Some(config)).unwrap();

        // Churn one record enough to cross the 4 KiB ceiling repeatedly.
        store.insert(record("S1", 50)).unwrap();
        for i in 0..100 {
            store.replace(record("S1", i % 100)).unwrap();
        }

        let size = store.journal.size_bytes().unwrap();
        assert!(
            size <= 2 * JournalConfig::MIN_JOURNAL_SIZE,
            "journal should stay near the ceiling, got {size}"
        );
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
