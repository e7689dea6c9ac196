use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{non_blank, Department};

pub const ASSIGNMENT_COLUMNS: &str =
    "id, title, description, departments, posted_by, due_date, allow_file_upload, created_at";

/// Work posted by staff for one or more departments.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Comma-delimited department names, e.g. `Engineering,HR`.
    pub departments: String,
    pub posted_by: Option<i32>,
    pub due_date: Option<NaiveDate>,
    pub allow_file_upload: bool,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// The stored department names, trimmed, blanks dropped.
    pub fn departments_list(&self) -> Vec<&str> {
        self.departments
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .collect()
    }

    pub fn is_open_to(&self, department: Department) -> bool {
        self.departments_list()
            .iter()
            .any(|d| *d == department.as_str())
    }
}

/// Listing row for staff: the assignment with its submission tallies.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct AssignmentSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub assignment: Assignment,
    pub submission_count: i64,
    pub unreviewed_count: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignmentInput {
    #[validate(length(min = 1, max = 200), custom = "non_blank")]
    pub title: String,
    #[validate(length(min = 1), custom = "non_blank")]
    pub description: String,
    #[validate(length(min = 1, message = "Select at least one department."))]
    pub departments: Vec<Department>,
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_allow_file_upload")]
    pub allow_file_upload: bool,
}

fn default_allow_file_upload() -> bool {
    true
}
