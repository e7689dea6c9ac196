//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every handler returns `Result<_, AppError>`, so validation failures, permission refusals
//! and database problems all leave the service as a well-formed JSON response.
//!
//! `AppError` implements `actix_web::error::ResponseError`. Permission and missing-profile
//! conditions are expressed as [`AppError::Redirect`], which renders a `303 See Other`
//! with a `Location` header and a user-visible notice instead of a hard denial.

use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed (HTTP 401), e.g. wrong credentials at login.
    Unauthorized(String),
    /// The caller is known but the action is outside their scope (HTTP 403).
    Forbidden(String),
    /// A malformed request (HTTP 400).
    BadRequest(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// An unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// An error originating from database operations (HTTP 500).
    DatabaseError(String),
    /// Field-level validation failures (HTTP 422).
    Validation(ValidationErrors),
    /// Send the caller elsewhere with a notice (HTTP 303).
    Redirect { location: String, notice: String },
}

impl AppError {
    pub fn redirect(location: impl Into<String>, notice: impl Into<String>) -> Self {
        AppError::Redirect {
            location: location.into(),
            notice: notice.into(),
        }
    }

    /// A single-field validation failure.
    pub fn field(field: &'static str, code: &'static str, message: &'static str) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, validation_error(code, message));
        AppError::Validation(errors)
    }
}

/// Builds a `validator::ValidationError` carrying a human readable message.
pub fn validation_error(code: &'static str, message: &'static str) -> validator::ValidationError {
    let mut error = validator::ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Flattens `ValidationErrors` into `field -> [messages]`, falling back to the error code
/// when no message was attached. Nested payloads are keyed as `parent.field`.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut fields = BTreeMap::new();
    collect_messages("", errors, &mut fields);
    fields
}

fn collect_messages(
    prefix: &str,
    errors: &ValidationErrors,
    fields: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                let messages = errs
                    .iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                fields.insert(key, messages);
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(&key, nested, fields),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_messages(&format!("{}[{}]", key, index), nested, fields);
                }
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::Validation(errors) => write!(f, "Validation Error: {}", errors),
            AppError::Redirect { location, notice } => {
                write!(f, "Redirect to {}: {}", location, notice)
            }
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Redirect { .. } => StatusCode::SEE_OTHER,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg) => {
                HttpResponse::build(self.status_code()).json(json!({ "error": msg }))
            }
            // Internal details stay in the log.
            AppError::InternalServerError(msg) | AppError::DatabaseError(msg) => {
                log::error!("{}: {}", self.status_code(), msg);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }))
            }
            AppError::Validation(errors) => HttpResponse::UnprocessableEntity().json(json!({
                "error": "Validation failed",
                "fields": field_messages(errors),
            })),
            AppError::Redirect { location, notice } => HttpResponse::SeeOther()
                .insert_header((header::LOCATION, location.as_str()))
                .json(json!({
                    "redirect": location,
                    "notice": notice,
                })),
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound`, unique violations become `BadRequest`,
/// everything else is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some("23505") => {
                AppError::BadRequest("A record with these details already exists".into())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        AppError::Validation(errors)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(error: csv::Error) -> AppError {
        AppError::InternalServerError(format!("CSV encoding failed: {}", error))
    }
}
