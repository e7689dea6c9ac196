//! Account creation and credential resets.
//!
//! A login (`users` row) and its profile (`interns` or `staff` row) are always written in
//! one transaction, so a failure part-way leaves neither behind.

use sqlx::PgPool;

use crate::auth::hash_password;
use crate::error::AppError;
use crate::models::intern::INTERN_COLUMNS;
use crate::models::staff::STAFF_COLUMNS;
use crate::models::{Department, Intern, Staff};

pub struct NewIntern<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub department: Department,
    pub password: &'a str,
}

pub struct NewStaff<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub department: Department,
    pub position: &'a str,
    pub password: &'a str,
    pub is_superuser: bool,
}

/// Rejects an email already used by an intern profile or as a login name.
pub async fn ensure_email_available(pool: &PgPool, email: &str) -> Result<(), AppError> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM interns WHERE lower(email) = lower($1)) \
             OR EXISTS (SELECT 1 FROM users WHERE lower(username) = lower($1))",
    )
    .bind(email)
    .fetch_one(pool)
    .await?;

    if taken {
        Err(AppError::field(
            "email",
            "unique",
            "An intern with this email already exists.",
        ))
    } else {
        Ok(())
    }
}

pub async fn ensure_username_available(pool: &PgPool, username: &str) -> Result<(), AppError> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM users WHERE lower(username) = lower($1))",
    )
    .bind(username)
    .fetch_one(pool)
    .await?;

    if taken {
        Err(AppError::field(
            "username",
            "unique",
            "A user with that username already exists.",
        ))
    } else {
        Ok(())
    }
}

/// Creates the intern's login (username = email) and profile together.
pub async fn create_intern(pool: &PgPool, new: NewIntern<'_>) -> Result<Intern, AppError> {
    let email = new.email.trim().to_lowercase();
    ensure_email_available(pool, &email).await?;
    let password_hash = hash_password(new.password)?;

    let mut tx = pool.begin().await?;
    let user_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO users (username, email, password_hash, first_name) \
         VALUES ($1, $1, $2, $3) RETURNING id",
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(new.name)
    .fetch_one(&mut *tx)
    .await?;

    let intern = sqlx::query_as::<_, Intern>(&format!(
        "INSERT INTO interns (name, email, password, department, user_id) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        INTERN_COLUMNS
    ))
    .bind(new.name)
    .bind(&email)
    .bind(&password_hash)
    .bind(new.department)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    log::info!("Created intern {} (user {})", intern.id, user_id);
    Ok(intern)
}

/// Creates a staff login (always `is_staff`) and its profile together.
pub async fn create_staff(pool: &PgPool, new: NewStaff<'_>) -> Result<Staff, AppError> {
    ensure_username_available(pool, new.username).await?;
    let password_hash = hash_password(new.password)?;

    let mut tx = pool.begin().await?;
    let user_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO users (username, email, password_hash, first_name, is_staff, is_superuser) \
         VALUES ($1, $2, $3, $4, TRUE, $5) RETURNING id",
    )
    .bind(new.username)
    .bind(new.email)
    .bind(&password_hash)
    .bind(new.name)
    .bind(new.is_superuser)
    .fetch_one(&mut *tx)
    .await?;

    let staff = sqlx::query_as::<_, Staff>(&format!(
        "INSERT INTO staff (name, department, position, user_id) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        STAFF_COLUMNS
    ))
    .bind(new.name)
    .bind(new.department)
    .bind(new.position)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    log::info!("Created staff member {} (user {})", staff.id, user_id);
    Ok(staff)
}

/// Sets a new password on the intern's login and its mirror field.
pub async fn reset_intern_password(
    pool: &PgPool,
    intern: &Intern,
    password: &str,
) -> Result<(), AppError> {
    let user_id = intern.user_id.ok_or_else(|| {
        AppError::field(
            "intern",
            "no_login",
            "This intern has no linked login account.",
        )
    })?;
    let password_hash = hash_password(password)?;

    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(&password_hash)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE interns SET password = $1 WHERE id = $2")
        .bind(&password_hash)
        .bind(intern.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    log::info!("Password reset for intern {} (user {})", intern.id, user_id);
    Ok(())
}
