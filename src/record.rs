//! Student record shapes shared by every layer.
//!
//! `StudentRecord` is the stored entity. `StudentDraft` is the only shape a
//! write path accepts: identity fields plus raw marks. The derived fields
//! (`total`, `average`, `grade`) do not exist on the draft, so a caller that
//! sends them in JSON simply has them dropped and recomputed server-side.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::grading;

/// Maximum accepted length of a record identifier, in bytes.
pub const MAX_ID_LEN: usize = 64;

/// Maximum accepted length of a student name, in bytes.
pub const MAX_NAME_LEN: usize = 256;

/// Maximum accepted length of an email address, in bytes.
pub const MAX_EMAIL_LEN: usize = 254;

/// Raw subject marks for one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSheet {
    /// English mark.
    pub english: i32,
    /// Mathematics mark.
    pub maths: i32,
    /// Science mark.
    pub science: i32,
}

impl ScoreSheet {
    /// Create a score sheet from the three subject marks.
    #[must_use]
    pub const fn new(english: i32, maths: i32, science: i32) -> Self {
        Self {
            english,
            maths,
            science,
        }
    }

    /// Subject name / mark pairs, in the fixed wire order.
    #[must_use]
    pub const fn subjects(&self) -> [(&'static str, i32); 3] {
        [
            ("english", self.english),
            ("maths", self.maths),
            ("science", self.science),
        ]
    }
}

/// A candidate record as supplied by a caller.
///
/// Unknown JSON fields, including spoofed `total`, `average`, or `grade`
/// values, are discarded during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDraft {
    /// Externally supplied identifier. May be omitted on update, where the
    /// target id comes from the request path instead.
    #[serde(default)]
    pub id: String,
    /// Display name. No uniqueness constraint.
    pub name: String,
    /// Optional contact address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// English mark.
    pub english: i32,
    /// Mathematics mark.
    pub maths: i32,
    /// Science mark.
    pub science: i32,
}

impl StudentDraft {
    /// The raw marks carried by this draft.
    #[must_use]
    pub const fn scores(&self) -> ScoreSheet {
        ScoreSheet::new(self.english, self.maths, self.science)
    }

    /// Validate the draft for record creation: identity plus content.
    ///
    /// # Errors
    /// Returns the first failing check, naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.id.len() > MAX_ID_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "id",
                max_length: MAX_ID_LEN,
            });
        }
        self.validate_content()
    }

    /// Validate everything except the identifier.
    ///
    /// Update paths pin the target id themselves and only need this half.
    ///
    /// # Errors
    /// Returns the first failing check, naming the offending field.
    pub fn validate_content(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.name.len() > MAX_NAME_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "name",
                max_length: MAX_NAME_LEN,
            });
        }
        if let Some(email) = self.email.as_deref() {
            if email.len() > MAX_EMAIL_LEN {
                return Err(ValidationError::FieldTooLong {
                    field: "email",
                    max_length: MAX_EMAIL_LEN,
                });
            }
        }
        grading::validate_scores(&self.scores())
    }
}

/// A stored student record, derived fields included.
///
/// Serializes to the service wire shape:
/// `id, name, email, english, maths, science, total, average, grade`,
/// with `email` omitted when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Unique identifier, immutable once the record exists.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional contact address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// English mark.
    pub english: i32,
    /// Mathematics mark.
    pub maths: i32,
    /// Science mark.
    pub science: i32,
    /// Derived: sum of the three marks.
    pub total: i32,
    /// Derived: `total / 3.0`, unrounded.
    pub average: f64,
    /// Derived: letter classification of `average`.
    pub grade: char,
}

impl StudentRecord {
    /// The raw marks stored on this record.
    #[must_use]
    pub const fn scores(&self) -> ScoreSheet {
        ScoreSheet::new(self.english, self.maths, self.science)
    }
}
