//! Storage backends for student records.
//!
//! [`StudentStore`] is the abstract contract; [`InMemoryStudentStore`] is the
//! reference implementation. The `persistent` feature adds a durable
//! single-process backend.

mod memory;
mod traits;

#[cfg(feature = "persistent")]
pub mod persistent;

pub use memory::InMemoryStudentStore;
pub use traits::{StorageError, StudentStore};

#[cfg(feature = "persistent")]
pub use persistent::{open_store, JournalConfig, PersistentStudentStore};
