use crate::{
    accounts::{self, NewIntern},
    auth::{generate_token, verify_password, AuthResponse, LoginRequest, LOGIN_PATH},
    config::Config,
    error::AppError,
    models::{user::AUTH_USER_COLUMNS, AuthUser, InternSignup},
};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use super::see_other;

/// Intern signup
///
/// Creates the intern's login and profile together. The intern logs in afterwards
/// with their email address.
#[post("/signup")]
pub async fn signup(
    pool: web::Data<PgPool>,
    signup_data: web::Json<InternSignup>,
) -> Result<impl Responder, AppError> {
    signup_data.validate()?;

    let intern = accounts::create_intern(
        &pool,
        NewIntern {
            name: signup_data.name.trim(),
            email: &signup_data.email,
            department: signup_data.department,
            password: &signup_data.password,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "notice": "Signup successful. You can now log in.",
        "intern": intern,
    })))
}

/// Login
///
/// Authenticates any active account and returns a session token.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let user = authenticate(&pool, &login_data).await?;
    Ok(HttpResponse::Ok().json(issue_session(&pool, &config, &user).await?))
}

/// Staff login
///
/// Same as `login`, but only accounts with staff access may use it.
#[post("/login")]
pub async fn staff_login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let user = authenticate(&pool, &login_data).await?;
    if !(user.is_staff || user.is_superuser) {
        log::warn!("Non-staff user {} attempted staff login", user.id);
        return Err(AppError::Unauthorized(
            "This account does not have staff access".into(),
        ));
    }
    Ok(HttpResponse::Ok().json(issue_session(&pool, &config, &user).await?))
}

/// Logout
///
/// Tokens are held by the client; this tells it to drop the token and return to login.
#[post("/logout")]
pub async fn logout() -> impl Responder {
    see_other(LOGIN_PATH, "You have been logged out.")
}

async fn authenticate(pool: &PgPool, login_data: &LoginRequest) -> Result<AuthUser, AppError> {
    let user = sqlx::query_as::<_, AuthUser>(&format!(
        "SELECT {} FROM users WHERE lower(username) = lower($1)",
        AUTH_USER_COLUMNS
    ))
    .bind(login_data.username.trim())
    .fetch_optional(pool)
    .await?;

    match user {
        Some(user) if user.is_active => {
            if verify_password(&login_data.password, &user.password_hash)? {
                Ok(user)
            } else {
                Err(AppError::Unauthorized("Invalid credentials".into()))
            }
        }
        _ => Err(AppError::Unauthorized("Invalid credentials".into())),
    }
}

async fn issue_session(
    pool: &PgPool,
    config: &Config,
    user: &AuthUser,
) -> Result<AuthResponse, AppError> {
    sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
        .bind(user.id)
        .execute(pool)
        .await?;

    let intern_id = sqlx::query_scalar::<_, i32>("SELECT id FROM interns WHERE user_id = $1")
        .bind(user.id)
        .fetch_optional(pool)
        .await?;

    Ok(AuthResponse {
        token: generate_token(user.id, &config.jwt)?,
        user_id: user.id,
        is_staff: user.is_staff,
        is_superuser: user.is_superuser,
        intern_id,
    })
}
