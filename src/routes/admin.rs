use crate::{
    auth::SuperUser,
    error::AppError,
    models::{user::AUTH_USER_COLUMNS, AuthUser, UserListing, UserQuery, UserUpdate},
    reports::filters::contains_pattern,
};
use actix_web::{get, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

const USER_LISTING_SELECT: &str = "SELECT u.id, u.username, u.email, u.first_name, u.is_staff, \
     u.is_superuser, u.is_active, u.date_joined, i.id AS intern_id, s.id AS staff_id \
     FROM users u \
     LEFT JOIN interns i ON i.user_id = u.id \
     LEFT JOIN staff s ON s.user_id = u.id";

/// List auth users with their linked profiles
///
/// `search` matches username, email or first name.
#[get("/users")]
pub async fn list_users(
    pool: web::Data<PgPool>,
    _admin: SuperUser,
    query: web::Query<UserQuery>,
) -> Result<impl Responder, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(USER_LISTING_SELECT);
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        builder
            .push(" WHERE u.username ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.first_name ILIKE ")
            .push_bind(pattern);
    }
    builder.push(" ORDER BY u.username");

    let users: Vec<UserListing> = builder.build_query_as().fetch_all(&**pool).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Edit an auth user and its linked profile
///
/// Absent fields are left unchanged. Changing the email of an intern's login also changes
/// the intern's email and login name, since interns log in with their email.
#[put("/users/{id}")]
pub async fn update_user(
    pool: web::Data<PgPool>,
    admin: SuperUser,
    user_id: web::Path<i32>,
    update_data: web::Json<UserUpdate>,
) -> Result<impl Responder, AppError> {
    update_data.validate()?;
    let user_id = user_id.into_inner();

    if user_id == admin.user.id
        && (update_data.is_active == Some(false) || update_data.is_superuser == Some(false))
    {
        return Err(AppError::field(
            "is_superuser",
            "self_demotion",
            "You cannot deactivate or demote your own account.",
        ));
    }

    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, AuthUser>(&format!(
        "SELECT {} FROM users WHERE id = $1 FOR UPDATE",
        AUTH_USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let intern_id = sqlx::query_scalar::<_, i32>("SELECT id FROM interns WHERE user_id = $1")
        .bind(user.id)
        .fetch_optional(&mut *tx)
        .await?;
    let staff_id = sqlx::query_scalar::<_, i32>("SELECT id FROM staff WHERE user_id = $1")
        .bind(user.id)
        .fetch_optional(&mut *tx)
        .await?;

    let email = update_data
        .email
        .as_deref()
        .map(|email| email.trim().to_lowercase());

    sqlx::query(
        "UPDATE users SET email = COALESCE($1, email), first_name = COALESCE($2, first_name), \
         is_active = COALESCE($3, is_active), is_staff = COALESCE($4, is_staff), \
         is_superuser = COALESCE($5, is_superuser) WHERE id = $6",
    )
    .bind(email.as_deref())
    .bind(update_data.first_name.as_deref().map(str::trim))
    .bind(update_data.is_active)
    .bind(update_data.is_staff)
    .bind(update_data.is_superuser)
    .bind(user.id)
    .execute(&mut *tx)
    .await?;

    if let Some(intern_id) = intern_id {
        if let Some(email) = email.as_deref().filter(|email| *email != user.email) {
            sqlx::query("UPDATE users SET username = $1 WHERE id = $2")
                .bind(email)
                .bind(user.id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE interns SET email = $1 WHERE id = $2")
                .bind(email)
                .bind(intern_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    if let Some(profile) = &update_data.intern {
        let intern_id = intern_id.ok_or_else(|| {
            AppError::field("intern", "no_profile", "This user has no intern profile.")
        })?;
        sqlx::query(
            "UPDATE interns SET name = COALESCE($1, name), department = COALESCE($2, department) \
             WHERE id = $3",
        )
        .bind(profile.name.as_deref().map(str::trim))
        .bind(profile.department)
        .bind(intern_id)
        .execute(&mut *tx)
        .await?;
    }

    if let Some(profile) = &update_data.staff {
        let staff_id = staff_id.ok_or_else(|| {
            AppError::field("staff", "no_profile", "This user has no staff profile.")
        })?;
        sqlx::query(
            "UPDATE staff SET name = COALESCE($1, name), department = COALESCE($2, department), \
             position = COALESCE($3, position) WHERE id = $4",
        )
        .bind(profile.name.as_deref().map(str::trim))
        .bind(profile.department)
        .bind(profile.position.as_deref().map(str::trim))
        .bind(staff_id)
        .execute(&mut *tx)
        .await?;
    }

    let listing = sqlx::query_as::<_, UserListing>(&format!("{} WHERE u.id = $1", USER_LISTING_SELECT))
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;

    log::info!("Superuser {} updated user {}", admin.user.id, user.id);
    Ok(HttpResponse::Ok().json(json!({
        "notice": "User updated.",
        "user": listing,
    })))
}
