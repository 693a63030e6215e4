//! Error types for gradebook.
//!
//! All errors are strongly typed using thiserror. This enables pattern
//! matching on specific error conditions and lets transport layers translate
//! outcomes into protocol responses without string matching.

use thiserror::Error;

/// Validation errors that occur while checking caller-supplied input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A subject mark fell outside the accepted policy range.
    #[error("{subject} mark {value} is out of range [{min}, {max}]")]
    ScoreOutOfRange {
        /// Name of the failing subject field.
        subject: &'static str,
        /// The rejected mark.
        value: i32,
        /// Inclusive lower bound.
        min: i32,
        /// Inclusive upper bound.
        max: i32,
    },

    /// Record identifier was empty or whitespace.
    #[error("record id cannot be empty")]
    EmptyId,

    /// Student name was empty or whitespace.
    #[error("student name cannot be empty")]
    EmptyName,

    /// A string field exceeded its accepted length.
    #[error("field '{field}' exceeds maximum length of {max_length}")]
    FieldTooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum accepted length in bytes.
        max_length: usize,
    },

    /// An update draft carried an id different from the record it targets.
    #[error("record id is immutable: update targets '{target}' but the draft says '{supplied}'")]
    IdMismatch {
        /// The id the operation targets.
        target: String,
        /// The conflicting id found in the draft.
        supplied: String,
    },

    /// A grade scale configuration was rejected.
    #[error("invalid grade scale: {reason}")]
    InvalidGradeScale {
        /// Why the scale was rejected.
        reason: String,
    },
}

/// Execution errors that occur while applying an operation.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The targeted record does not exist.
    #[error("student not found: {id}")]
    StudentNotFound {
        /// The missing record id.
        id: String,
    },

    /// A create targeted an id that already exists.
    #[error("student already exists: {id}")]
    DuplicateStudent {
        /// The conflicting record id.
        id: String,
    },

    /// The caller abandoned the operation before it committed.
    #[error("operation cancelled by caller")]
    Cancelled,

    /// The storage backend failed the operation.
    #[error("storage error: {message}")]
    Storage {
        /// Backend failure description.
        message: String,
    },

    /// The storage backend could not be reached.
    #[error("storage unavailable: {message}")]
    StorageUnavailable {
        /// Connection failure description.
        message: String,
    },
}

/// Top-level error type for gradebook operations.
#[derive(Debug, Error)]
pub enum GradebookError {
    /// Input failed validation; retrying the same request cannot succeed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The operation failed while executing.
    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// An invariant broke inside the service itself.
    #[error("internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl GradebookError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if the operation targeted a missing record.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Execution(ExecutionError::StudentNotFound { .. })
        )
    }

    /// Returns true if the operation collided with an existing record.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Execution(ExecutionError::DuplicateStudent { .. })
        )
    }

    /// Returns true if the storage backend was unreachable.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Execution(ExecutionError::StorageUnavailable { .. })
        )
    }

    /// Returns true if retrying the same request might succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Execution(e) => matches!(
                e,
                ExecutionError::StorageUnavailable { .. } | ExecutionError::Cancelled
            ),
            Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for gradebook operations.
pub type GradebookResult<T> = Result<T, GradebookError>;
