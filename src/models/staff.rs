use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{non_blank, Department};

pub const STAFF_COLUMNS: &str = "id, name, department, position, user_id";

lazy_static! {
    // Login names for staff accounts: letters, digits and @ . + - _
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[\w.@+-]+$").unwrap();
}

/// A staff profile. Its elevated access comes from the linked user's flags.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Staff {
    pub id: i32,
    pub name: String,
    pub department: Department,
    pub position: String,
    pub user_id: Option<i32>,
}

/// Minimal staff entry offered to interns when they log a task.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct StaffChoice {
    pub id: i32,
    pub name: String,
    pub position: String,
}

/// Creates a staff login and its profile.
#[derive(Debug, Deserialize, Validate)]
pub struct StaffCreate {
    #[validate(
        length(min = 3, max = 150),
        regex(
            path = "USERNAME_REGEX",
            message = "Username may contain only letters, digits and @/./+/-/_"
        )
    )]
    pub username: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    #[validate(length(min = 1, max = 120), custom = "non_blank")]
    pub name: String,
    pub department: Department,
    #[validate(length(min = 1, max = 120), custom = "non_blank")]
    pub position: String,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Debug, Deserialize)]
pub struct StaffQuery {
    pub search: Option<String>,
    pub department: Option<Department>,
}
