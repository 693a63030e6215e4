//! Abstract storage trait for student records.
//!
//! The trait defines the contract every storage backend must satisfy. By
//! using a trait, we enable:
//! - In-memory backends for testing and embedded use
//! - Durable backends for production
//! - Mock backends for failure-injection tests

use thiserror::Error;

use crate::record::StudentRecord;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No record exists under the given id.
    #[error("student not found: {0}")]
    StudentNotFound(String),

    /// A record already exists under the given id.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Backend error.
    #[error("storage backend error: {0}")]
    BackendError(String),

    /// Connection to the backend failed.
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// Serialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Storage contract for student records.
///
/// A record is either `Absent` or `Present`. `insert` is the only valid
/// transition out of `Absent`; `delete` is the only transition back.
/// `replace` and reads leave the state untouched.
///
/// # Safety Considerations
/// - Mutations on the same id must be serialized by the implementation
/// - Every read reflects the latest committed write; no hidden caching
pub trait StudentStore: Send + Sync {
    /// Insert a new record. Returns `DuplicateKey` if the id already exists.
    fn insert(&self, record: StudentRecord) -> Result<(), StorageError>;

    /// Get a record by id.
    fn get(&self, id: &str) -> Result<Option<StudentRecord>, StorageError>;

    /// All records, in insertion order.
    fn list(&self) -> Result<Vec<StudentRecord>, StorageError>;

    /// Replace an existing record wholesale. Returns `StudentNotFound` if
    /// the id is absent. The record's id selects the target.
    fn replace(&self, record: StudentRecord) -> Result<(), StorageError>;

    /// Delete a record by id. Returns `StudentNotFound` if absent.
    fn delete(&self, id: &str) -> Result<(), StorageError>;
}
