use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{non_blank, Department};

pub const INTERN_COLUMNS: &str = "id, name, email, password, department, user_id";

/// An intern profile. `user_id` links the login; without it the intern cannot sign in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Intern {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// bcrypt hash of the intern's password, copied from the linked login. Never plaintext.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub department: Department,
    pub user_id: Option<i32>,
}

/// Self-service signup. Creates the login and the profile together.
#[derive(Debug, Deserialize, Validate)]
pub struct InternSignup {
    #[validate(length(min = 1, max = 120), custom = "non_blank")]
    pub name: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub department: Department,
}

/// Staff-created intern. A password is generated when none is supplied.
#[derive(Debug, Deserialize, Validate)]
pub struct InternCreate {
    #[validate(length(min = 1, max = 120), custom = "non_blank")]
    pub name: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    pub department: Department,
}

#[derive(Debug, Deserialize)]
pub struct InternQuery {
    pub search: Option<String>,
    pub department: Option<Department>,
}

/// Per-intern task totals, used by the detail view and the comparison report.
#[derive(Debug, Default, Serialize, Deserialize, FromRow, PartialEq)]
pub struct TaskCounts {
    pub total: i64,
    pub pending: i64,
    pub resolved: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_signup_validation() {
        let valid = InternSignup {
            name: "Ann Lee".to_string(),
            email: "ann@example.com".to_string(),
            password: "password123".to_string(),
            department: Department::Engineering,
        };
        assert!(valid.validate().is_ok());

        let invalid = InternSignup {
            name: String::new(),
            email: "ann-at-example.com".to_string(),
            password: "short".to_string(),
            department: Department::Engineering,
        };
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_whitespace_name_is_rejected() {
        let signup = InternSignup {
            name: "   ".to_string(),
            email: "ann@example.com".to_string(),
            password: "password123".to_string(),
            department: Department::Hr,
        };
        let errors = signup.validate().unwrap_err();
        assert_eq!(errors.field_errors()["name"][0].code, "blank");

        let create = InternCreate {
            name: "\t".to_string(),
            email: "bo@example.com".to_string(),
            password: None,
            department: Department::Sales,
        };
        assert!(create.validate().unwrap_err().field_errors().contains_key("name"));
    }

    #[test]
    fn test_create_allows_missing_password() {
        let input = InternCreate {
            name: "Bo".to_string(),
            email: "bo@example.com".to_string(),
            password: None,
            department: Department::Sales,
        };
        assert!(input.validate().is_ok());

        let input = InternCreate {
            password: Some("tiny".to_string()),
            ..input
        };
        assert!(input.validate().is_err());
    }
}
