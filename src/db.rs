//! Pool construction, embedded migrations and the optional bootstrap superuser.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::auth::hash_password;
use crate::config::{AdminBootstrap, Config};
use crate::error::AppError;

pub async fn connect(config: &Config) -> Result<PgPool, AppError> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(AppError::from)
}

pub async fn migrate(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Migration failed: {}", e)))
}

/// Creates the configured superuser unless that username already exists.
/// Returns whether an account was created.
pub async fn ensure_superuser(pool: &PgPool, admin: &AdminBootstrap) -> Result<bool, AppError> {
    let existing = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE username = $1")
        .bind(&admin.username)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let password_hash = hash_password(&admin.password)?;
    sqlx::query(
        "INSERT INTO users (username, email, password_hash, is_staff, is_superuser) \
         VALUES ($1, $2, $3, TRUE, TRUE)",
    )
    .bind(&admin.username)
    .bind(&admin.email)
    .bind(password_hash)
    .execute(pool)
    .await?;

    log::info!("Created bootstrap superuser {}", admin.username);
    Ok(true)
}
