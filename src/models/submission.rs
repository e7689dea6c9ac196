use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use super::{Assignment, Department};
use crate::error::{validation_error, AppError};

pub const SUBMISSION_COLUMNS: &str =
    "id, assignment_id, intern_id, text, upload, submitted_at, reviewed, review_notes";

/// Submissions joined to their intern and assignment. Filter with `WHERE s.` predicates.
pub const SUBMISSION_DETAIL_SELECT: &str = "SELECT s.id, s.assignment_id, s.intern_id, s.text, \
     s.upload, s.submitted_at, s.reviewed, s.review_notes, i.name AS intern_name, \
     i.department AS intern_department, a.title AS assignment_title \
     FROM submissions s \
     JOIN interns i ON i.id = s.intern_id \
     JOIN assignments a ON a.id = s.assignment_id";

lazy_static! {
    // Stored upload references: relative paths made of safe segments.
    static ref UPLOAD_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9_\-][A-Za-z0-9_\-./]*$").unwrap();
}

/// An intern's response to an assignment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: i32,
    pub assignment_id: i32,
    pub intern_id: i32,
    pub text: String,
    /// Reference to the stored file, relative to the upload root.
    pub upload: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed: bool,
    pub review_notes: String,
}

/// Submission joined with intern and assignment names for staff review screens.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct SubmissionDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub submission: Submission,
    pub intern_name: String,
    pub intern_department: Department,
    pub assignment_title: String,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_has_content", skip_on_field_errors = false))]
pub struct SubmissionInput {
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub text: String,
    #[validate(length(max = 255), custom = "validate_upload_reference")]
    pub upload: Option<String>,
}

impl SubmissionInput {
    pub fn upload_ref(&self) -> Option<&str> {
        self.upload.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

fn validate_has_content(input: &SubmissionInput) -> Result<(), ValidationError> {
    if input.has_text() || input.upload_ref().is_some() {
        Ok(())
    } else {
        Err(validation_error(
            "empty_submission",
            "Provide text or upload a file.",
        ))
    }
}

fn validate_upload_reference(upload: &str) -> Result<(), ValidationError> {
    let upload = upload.trim();
    if upload.is_empty() {
        return Ok(());
    }
    if upload.split('/').any(|segment| segment == "..") || !UPLOAD_REGEX.is_match(upload) {
        return Err(validation_error(
            "invalid_upload",
            "Upload reference must be a relative file path.",
        ));
    }
    Ok(())
}

/// Checks that `input` may be submitted to `assignment` by an intern of `department`.
/// Runs field validation first, then the department scope and upload permission.
pub fn check_submission(
    assignment: &Assignment,
    department: Department,
    input: &SubmissionInput,
) -> Result<(), AppError> {
    input.validate()?;
    if !assignment.is_open_to(department) {
        return Err(AppError::Forbidden(format!(
            "Assignment is not open to the {} department",
            department
        )));
    }
    if input.upload_ref().is_some() && !assignment.allow_file_upload {
        return Err(AppError::field(
            "upload",
            "uploads_disabled",
            "This assignment does not accept file uploads.",
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewInput {
    #[serde(default = "default_reviewed")]
    pub reviewed: bool,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub review_notes: String,
}

fn default_reviewed() -> bool {
    true
}
