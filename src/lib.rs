//! # Gradebook - Student Record Service
//!
//! Gradebook manages student academic records: callers supply raw subject
//! marks, the engine derives summary statistics (total, average, letter
//! grade), and records persist behind a backend-agnostic store contract.
//!
//! ## Core Concepts
//!
//! - **StudentRecord**: a student's stored entry, derived fields included
//! - **StudentDraft**: the only shape write paths accept (identity plus raw
//!   marks); derived fields are always recomputed server-side
//! - **GradeScale**: an explicit ordered threshold table mapping averages to
//!   letter grades
//! - **StudentStore**: the storage contract every backend satisfies
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use gradebook::{CancelToken, GradeScale, Gradebook, InMemoryStudentStore, StudentDraft};
//!
//! # fn main() -> gradebook::GradebookResult<()> {
//! let store = Arc::new(InMemoryStudentStore::new());
//! let gradebook = Gradebook::new(store, GradeScale::five_tier());
//!
//! let draft = StudentDraft {
//!     id: "S1".to_string(),
//!     name: "Amy".to_string(),
//!     email: None,
//!     english: 95,
//!     maths: 88,
//!     science: 92,
//! };
//!
//! let record = gradebook.create(&draft, &CancelToken::new())?;
//! assert_eq!(record.total, 275);
//! assert_eq!(record.grade, 'A');
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cancel;
pub mod engine;
pub mod error;
pub mod grading;
pub mod record;
pub mod storage;

#[cfg(feature = "transport-http")]
pub mod transport;

// Re-export primary types at crate root for convenience
pub use cancel::CancelToken;
pub use engine::Gradebook;
pub use error::{ExecutionError, GradebookError, GradebookResult, ValidationError};
pub use grading::{derive, Derived, GradeScale, GradeTier, MAX_SCORE, MIN_SCORE};
pub use record::{ScoreSheet, StudentDraft, StudentRecord};
pub use storage::{InMemoryStudentStore, StorageError, StudentStore};

#[cfg(feature = "persistent")]
pub use storage::{open_store, JournalConfig, PersistentStudentStore};
