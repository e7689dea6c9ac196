pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub use extractors::{CurrentIntern, StaffUser, SuperUser};
pub use middleware::AuthMiddleware;
pub use password::{choose_password, generate_password, hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const SIGNUP_PATH: &str = "/api/auth/signup";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const STAFF_LOGIN_PATH: &str = "/api/staff/login";
pub const INTERN_DASHBOARD_PATH: &str = "/api/intern/dashboard";
pub const STAFF_DASHBOARD_PATH: &str = "/api/staff/dashboard";

/// Routes reachable without a session token.
pub const PUBLIC_PATHS: [&str; 4] = [LOGIN_PATH, SIGNUP_PATH, LOGOUT_PATH, STAFF_LOGIN_PATH];

// Path separators stay readable; `?`, `&`, `=` and the rest are escaped.
const NEXT_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.');

/// The login route with `next` pointing back at `target` (path plus optional query).
pub fn login_location(target: &str) -> String {
    format!("{}?next={}", LOGIN_PATH, utf8_percent_encode(target, NEXT_ESCAPES))
}

/// Represents the payload for a login request.
/// Interns log in with their email address as the username.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Response structure after successful authentication.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The JWT for session authentication.
    pub token: String,
    pub user_id: i32,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Set when the account has an intern profile.
    pub intern_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_login_request_validation() {
        let valid_login = LoginRequest {
            username: "ann@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_login.validate().is_ok());

        let missing_password = LoginRequest {
            username: "ann@example.com".to_string(),
            password: String::new(),
        };
        assert!(missing_password.validate().is_err());

        let missing_username = LoginRequest {
            username: String::new(),
            password: "password123".to_string(),
        };
        assert!(missing_username.validate().is_err());
    }

    #[test]
    fn test_public_paths_cover_login_routes() {
        assert!(PUBLIC_PATHS.contains(&LOGIN_PATH));
        assert!(PUBLIC_PATHS.contains(&STAFF_LOGIN_PATH));
        assert!(!PUBLIC_PATHS.contains(&INTERN_DASHBOARD_PATH));
    }

    #[test]
    fn test_login_location_escapes_query() {
        assert_eq!(
            login_location("/api/intern/dashboard"),
            "/api/auth/login?next=/api/intern/dashboard"
        );
        assert_eq!(
            login_location("/api/hr/dashboard?status=Resolved&intern_name=Ann Lee"),
            "/api/auth/login?next=/api/hr/dashboard%3Fstatus%3DResolved%26intern_name%3DAnn%20Lee"
        );
    }
}
