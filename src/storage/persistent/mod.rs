//! Persistent storage backend for student records.
//!
//! A durable single-process backend: reads come from an in-memory index,
//! every mutation is framed into an append-only journal first, and the
//! journal is replayed on open to rebuild the index. An exclusive directory
//! lock keeps a second process from opening the same store, CRC32 trailers
//! catch corruption, and snapshot-rewrite compaction bounds journal growth.

mod codec;
mod file_lock;
mod journal;
mod store;

pub use file_lock::StoreLock;
pub use journal::{Journal, JournalEntry, JournalOp, Replay};
pub use store::PersistentStudentStore;

use std::path::Path;

use crate::storage::traits::StorageError;

/// Configuration for persistent storage.
#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Journal size that triggers compaction (bytes).
    pub max_journal_size: u64,
    /// Whether to fsync after every write (slower but safer).
    pub sync_on_write: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            max_journal_size: 8 * 1024 * 1024, // 8 MB
            sync_on_write: true,
        }
    }
}

impl JournalConfig {
    /// Floor for the compaction ceiling. Below this a store with a handful
    /// of records would rewrite the journal on nearly every mutation.
    pub const MIN_JOURNAL_SIZE: u64 = 4 * 1024;

    /// Check the configuration for degenerate values.
    ///
    /// # Errors
    /// `BackendError` if `max_journal_size` is below [`Self::MIN_JOURNAL_SIZE`].
    pub fn validate(self) -> Result<Self, StorageError> {
        if self.max_journal_size < Self::MIN_JOURNAL_SIZE {
            return Err(StorageError::BackendError(format!(
                "max_journal_size {} is below the {}-byte floor",
                self.max_journal_size,
                Self::MIN_JOURNAL_SIZE
            )));
        }

        Ok(self)
    }
}

/// Open or create a persistent student store at the given directory.
///
/// Pass `None` for the default [`JournalConfig`].
///
/// # Errors
/// - `ConnectionError` if the directory cannot be created or accessed, if
///   another process holds the lock, or if journal replay fails due to
///   corruption
/// - `BackendError` for a degenerate configuration
///
/// # Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use gradebook::storage::{open_store, StudentStore};
///
/// # fn main() -> Result<(), gradebook::storage::StorageError> {
/// let store = open_store("./registry.db", None)?;
/// let all = store.list()?;
/// # Ok(())
/// # }
/// ```
pub fn open_store(
    path: impl AsRef<Path>,
    config: Option<JournalConfig>,
) -> Result<PersistentStudentStore, StorageError> {
    let cfg = config.unwrap_or_default().validate()?;
    PersistentStudentStore::open(path.as_ref(), cfg)
}
