use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::{non_blank, Department};

pub const TASK_COLUMNS: &str = "id, intern_id, staff_id, staff_name, staff_identifier, \
     staff_phone, task_description, date, status, remarks, created_at, updated_at";

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    /// Work logged but not yet done.
    Pending,
    /// Work completed.
    Resolved,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Resolved => "Resolved",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(TaskStatus::Pending),
            "Resolved" => Ok(TaskStatus::Resolved),
            other => Err(format!("Unknown task status: {}", other)),
        }
    }
}

/// Input structure for logging a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    pub date: NaiveDate,
    #[validate(length(min = 1, max = 5000), custom = "non_blank")]
    pub task_description: String,
    /// Optional reference to a registered staff member.
    pub staff_id: Option<i32>,
    #[validate(length(max = 120))]
    pub staff_name: Option<String>,
    #[validate(length(max = 64))]
    pub staff_identifier: Option<String>,
    #[validate(length(max = 32))]
    pub staff_phone: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[validate(length(max = 5000))]
    pub remarks: Option<String>,
}

/// A task entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i32,
    pub intern_id: i32,
    pub staff_id: Option<i32>,
    pub staff_name: String,
    pub staff_identifier: String,
    pub staff_phone: String,
    pub task_description: String,
    pub date: NaiveDate,
    pub status: TaskStatus,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_owned_by(&self, intern_id: i32) -> bool {
        self.intern_id == intern_id
    }
}

/// A task joined with its intern and staff, as used by staff reports and the CSV export.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskReportRow {
    pub id: i32,
    pub intern_id: i32,
    pub intern_name: String,
    pub intern_email: String,
    pub intern_department: Department,
    pub staff_id: Option<i32>,
    /// Linked staff name, or the name the intern typed in.
    pub staff_name: Option<String>,
    pub task_description: String,
    pub date: NaiveDate,
    pub status: TaskStatus,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
}
