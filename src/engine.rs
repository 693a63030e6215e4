//! Service engine for student records.
//!
//! `Gradebook` composes the three things the transports need: input
//! validation, grade derivation, and a storage backend. Every write path
//! recomputes the derived fields from the raw marks, so stored summaries can
//! never disagree with the marks they came from.

use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::error::{ExecutionError, GradebookError, GradebookResult, ValidationError};
use crate::grading::{derive, GradeScale};
use crate::record::{StudentDraft, StudentRecord};
use crate::storage::{StorageError, StudentStore};

/// Student record service.
///
/// Cheap to clone; clones share the same store handle and scale.
#[derive(Clone)]
pub struct Gradebook {
    store: Arc<dyn StudentStore>,
    scale: GradeScale,
}

impl Gradebook {
    /// Create a service over the given store and grade scale.
    #[must_use]
    pub fn new(store: Arc<dyn StudentStore>, scale: GradeScale) -> Self {
        Self { store, scale }
    }

    /// Create a service with the default grade scale.
    #[must_use]
    pub fn with_default_scale(store: Arc<dyn StudentStore>) -> Self {
        Self::new(store, GradeScale::default())
    }

    /// The grade scale this service derives with.
    #[must_use]
    pub fn scale(&self) -> &GradeScale {
        &self.scale
    }

    fn storage_err(err: StorageError) -> GradebookError {
        GradebookError::Execution(match err {
            StorageError::StudentNotFound(id) => ExecutionError::StudentNotFound { id },
            StorageError::DuplicateKey(id) => ExecutionError::DuplicateStudent { id },
            StorageError::ConnectionError(message) => {
                ExecutionError::StorageUnavailable { message }
            }
            other => ExecutionError::Storage {
                message: other.to_string(),
            },
        })
    }

    fn guard(cancel: &CancelToken) -> GradebookResult<()> {
        if cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled.into());
        }
        Ok(())
    }

    fn build_record(&self, id: String, draft: &StudentDraft) -> StudentRecord {
        let derived = derive(draft.scores(), &self.scale);
        StudentRecord {
            id,
            name: draft.name.clone(),
            email: draft.email.clone(),
            english: draft.english,
            maths: draft.maths,
            science: draft.science,
            total: derived.total,
            average: derived.average,
            grade: derived.grade,
        }
    }

    /// Create a record from a draft.
    ///
    /// # Errors
    /// - `Validation` if the draft fails its checks
    /// - `DuplicateStudent` if the id already exists (the stored record is
    ///   left untouched)
    /// - `Cancelled` if the token fires before the write commits
    pub fn create(
        &self,
        draft: &StudentDraft,
        cancel: &CancelToken,
    ) -> GradebookResult<StudentRecord> {
        Self::guard(cancel)?;
        draft.validate()?;

        let record = self.build_record(draft.id.clone(), draft);

        Self::guard(cancel)?;
        self.store
            .insert(record.clone())
            .map_err(Self::storage_err)?;
        Ok(record)
    }

    /// Fetch a record by id.
    ///
    /// # Errors
    /// `StudentNotFound` if the id is absent.
    pub fn fetch(&self, id: &str, cancel: &CancelToken) -> GradebookResult<StudentRecord> {
        Self::guard(cancel)?;
        self.store
            .get(id)
            .map_err(Self::storage_err)?
            .ok_or_else(|| {
                GradebookError::Execution(ExecutionError::StudentNotFound { id: id.to_string() })
            })
    }

    /// All records, in insertion order.
    ///
    /// # Errors
    /// `Storage` / `StorageUnavailable` on backend failure.
    pub fn list(&self, cancel: &CancelToken) -> GradebookResult<Vec<StudentRecord>> {
        Self::guard(cancel)?;
        self.store.list().map_err(Self::storage_err)
    }

    /// Replace the record under `id` with one rebuilt from the draft.
    ///
    /// The target id comes from the caller; a draft id must be empty or
    /// match it. Derived fields are recomputed from the draft's raw marks
    /// (a full replace, not a merge), so calling twice with the same draft
    /// stores the same record both times.
    ///
    /// # Errors
    /// - `Validation` on a conflicting draft id or failing content checks
    /// - `StudentNotFound` if the id is absent
    /// - `Cancelled` if the token fires before the write commits
    pub fn update(
        &self,
        id: &str,
        draft: &StudentDraft,
        cancel: &CancelToken,
    ) -> GradebookResult<StudentRecord> {
        Self::guard(cancel)?;
        if !draft.id.is_empty() && draft.id != id {
            return Err(ValidationError::IdMismatch {
                target: id.to_string(),
                supplied: draft.id.clone(),
            }
            .into());
        }
        draft.validate_content()?;

        let record = self.build_record(id.to_string(), draft);

        Self::guard(cancel)?;
        self.store
            .replace(record.clone())
            .map_err(Self::storage_err)?;
        Ok(record)
    }

    /// Delete the record under `id` permanently.
    ///
    /// # Errors
    /// - `StudentNotFound` if the id is absent
    /// - `Cancelled` if the token fires before the write commits
    pub fn remove(&self, id: &str, cancel: &CancelToken) -> GradebookResult<()> {
        Self::guard(cancel)?;
        self.store.delete(id).map_err(Self::storage_err)
    }
}
