use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{non_blank, Department};

/// Column list shared by every query that loads an `AuthUser`.
pub const AUTH_USER_COLUMNS: &str = "id, username, email, password_hash, first_name, \
     is_staff, is_superuser, is_active, date_joined, last_login";

/// The authentication record. Interns and staff profiles link to it via `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Row for the superuser listing: the user plus which profile (if any) is linked.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct UserListing {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub intern_id: Option<i32>,
    pub staff_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InternProfileUpdate {
    #[validate(length(min = 1, max = 120), custom = "non_blank")]
    pub name: Option<String>,
    pub department: Option<Department>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StaffProfileUpdate {
    #[validate(length(min = 1, max = 120), custom = "non_blank")]
    pub name: Option<String>,
    pub department: Option<Department>,
    #[validate(length(min = 1, max = 120), custom = "non_blank")]
    pub position: Option<String>,
}

/// Superuser edit of an auth record and its linked profile. Absent fields are left as is.
#[derive(Debug, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    #[validate]
    pub intern: Option<InternProfileUpdate>,
    #[validate]
    pub staff: Option<StaffProfileUpdate>,
}
