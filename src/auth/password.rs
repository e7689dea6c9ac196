use crate::error::AppError;
use bcrypt::{hash, verify};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Shortest password an operator may set by hand.
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Length of passwords generated for resets and staff-created accounts.
pub const GENERATED_PASSWORD_LENGTH: usize = 12;

const BCRYPT_COST: u32 = 12;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, BCRYPT_COST)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}

/// Draws a random alphanumeric secret from the operating system's CSPRNG.
pub fn generate_password(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// A password chosen for an account, and whether it was generated.
#[derive(Debug)]
pub struct NewPassword {
    pub value: String,
    pub generated: bool,
}

/// Uses the operator's value when given (enforcing the minimum length),
/// otherwise generates one.
pub fn choose_password(supplied: Option<&str>) -> Result<NewPassword, AppError> {
    match supplied.map(str::trim).filter(|p| !p.is_empty()) {
        Some(value) if value.chars().count() < MIN_PASSWORD_LENGTH => Err(AppError::field(
            "password",
            "too_short",
            "Password must be at least 8 characters.",
        )),
        Some(value) => Ok(NewPassword {
            value: value.to_string(),
            generated: false,
        }),
        None => Ok(NewPassword {
            value: generate_password(GENERATED_PASSWORD_LENGTH),
            generated: true,
        }),
    }
}
