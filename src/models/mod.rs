pub mod assignment;
pub mod department;
pub mod intern;
pub mod staff;
pub mod submission;
pub mod task;
pub mod user;

pub use assignment::{Assignment, AssignmentInput, AssignmentSummary};
pub use department::Department;
pub use intern::{Intern, InternCreate, InternQuery, InternSignup, TaskCounts};
pub use staff::{Staff, StaffChoice, StaffCreate, StaffQuery};
pub use submission::{ReviewInput, Submission, SubmissionDetail, SubmissionInput};
pub use task::{Task, TaskInput, TaskReportRow, TaskStatus};
pub use user::{AuthUser, UserListing, UserQuery, UserUpdate};

use validator::ValidationError;

/// Rejects values made only of whitespace. Length checks still apply separately.
pub fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(crate::error::validation_error(
            "blank",
            "This field may not be blank.",
        ));
    }
    Ok(())
}
