use crate::{
    accounts::{self, NewIntern, NewStaff},
    auth::{choose_password, StaffUser},
    error::AppError,
    models::{
        intern::INTERN_COLUMNS, staff::STAFF_COLUMNS, submission::SUBMISSION_DETAIL_SELECT,
        task::TASK_COLUMNS, Department, Intern, InternCreate, InternQuery, Staff, StaffCreate,
        StaffQuery, SubmissionDetail, Task, TaskCounts, TaskReportRow,
    },
    reports::{analytics, filters::contains_pattern, AnalyticsQuery, Period, TaskFilter},
};
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use validator::Validate;

const RECENT_TASKS: i64 = 10;

const TASK_COUNT_COLUMNS: &str = "COUNT(t.id) AS total, \
     COUNT(t.id) FILTER (WHERE t.status = 'Pending') AS pending, \
     COUNT(t.id) FILTER (WHERE t.status = 'Resolved') AS resolved";

#[derive(Debug, Serialize, FromRow)]
struct DashboardCounts {
    interns: i64,
    staff: i64,
    assignments: i64,
    unreviewed_submissions: i64,
}

/// Body of a password reset. Omit `password` to have one generated.
#[derive(Debug, Default, Deserialize)]
pub struct PasswordResetInput {
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    /// Comma-separated intern ids, e.g. `1,2`.
    pub interns: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// One intern's column in a comparison.
#[derive(Debug, Serialize, FromRow)]
pub struct InternComparison {
    pub intern_id: i32,
    pub name: String,
    pub department: Department,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub counts: TaskCounts,
}

/// Staff dashboard
///
/// Headline counts across the portal and the most recently logged tasks.
#[get("/dashboard")]
pub async fn dashboard(
    pool: web::Data<PgPool>,
    _staff: StaffUser,
) -> Result<impl Responder, AppError> {
    let counts = sqlx::query_as::<_, DashboardCounts>(
        "SELECT (SELECT COUNT(*) FROM interns) AS interns, \
                (SELECT COUNT(*) FROM staff) AS staff, \
                (SELECT COUNT(*) FROM assignments) AS assignments, \
                (SELECT COUNT(*) FROM submissions WHERE NOT reviewed) AS unreviewed_submissions",
    )
    .fetch_one(&**pool)
    .await?;

    let tasks = sqlx::query_as::<_, TaskCounts>(&format!("SELECT {} FROM tasks t", TASK_COUNT_COLUMNS))
        .fetch_one(&**pool)
        .await?;

    let mut recent = TaskFilter::default().report_query();
    recent.push(" LIMIT ").push_bind(RECENT_TASKS);
    let recent_tasks: Vec<TaskReportRow> = recent.build_query_as().fetch_all(&**pool).await?;

    Ok(HttpResponse::Ok().json(json!({
        "counts": counts,
        "tasks": tasks,
        "recent_tasks": recent_tasks,
    })))
}

/// List interns
///
/// `search` matches name or email (case-insensitive substring); `department` narrows to one
/// department.
#[get("/interns")]
pub async fn list_interns(
    pool: web::Data<PgPool>,
    _staff: StaffUser,
    query: web::Query<InternQuery>,
) -> Result<impl Responder, AppError> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM interns WHERE TRUE", INTERN_COLUMNS));
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(department) = query.department {
        builder.push(" AND department = ").push_bind(department);
    }
    builder.push(" ORDER BY name, id");

    let interns: Vec<Intern> = builder.build_query_as().fetch_all(&**pool).await?;
    Ok(HttpResponse::Ok().json(interns))
}

/// Create an intern with a login
///
/// When no password is supplied one is generated and returned in this response only.
#[post("/interns")]
pub async fn create_intern(
    pool: web::Data<PgPool>,
    staff: StaffUser,
    intern_data: web::Json<InternCreate>,
) -> Result<impl Responder, AppError> {
    intern_data.validate()?;
    let password = choose_password(intern_data.password.as_deref())?;

    let intern = accounts::create_intern(
        &pool,
        NewIntern {
            name: intern_data.name.trim(),
            email: &intern_data.email,
            department: intern_data.department,
            password: &password.value,
        },
    )
    .await?;
    log::info!("Staff user {} created intern {}", staff.user.id, intern.id);

    let mut body = json!({
        "notice": "Intern created.",
        "intern": intern,
    });
    if password.generated {
        body["password"] = json!(password.value);
    }
    Ok(HttpResponse::Created().json(body))
}

/// Intern detail: the intern, their tasks, status counts and submissions.
#[get("/interns/{id}")]
pub async fn intern_detail(
    pool: web::Data<PgPool>,
    _staff: StaffUser,
    intern_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let intern = fetch_intern(&pool, intern_id.into_inner()).await?;

    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE intern_id = $1 ORDER BY date DESC, created_at DESC",
        TASK_COLUMNS
    ))
    .bind(intern.id)
    .fetch_all(&**pool)
    .await?;

    let counts = sqlx::query_as::<_, TaskCounts>(&format!(
        "SELECT {} FROM tasks t WHERE t.intern_id = $1",
        TASK_COUNT_COLUMNS
    ))
    .bind(intern.id)
    .fetch_one(&**pool)
    .await?;

    let submissions = sqlx::query_as::<_, SubmissionDetail>(&format!(
        "{} WHERE s.intern_id = $1 ORDER BY s.submitted_at DESC",
        SUBMISSION_DETAIL_SELECT
    ))
    .bind(intern.id)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "intern": intern,
        "tasks": tasks,
        "counts": counts,
        "submissions": submissions,
    })))
}

/// Chart data for any intern's tasks. Same parameters as the intern's own analytics.
#[get("/interns/{id}/analytics")]
pub async fn intern_analytics(
    pool: web::Data<PgPool>,
    _staff: StaffUser,
    intern_id: web::Path<i32>,
    query: web::Query<AnalyticsQuery>,
) -> Result<impl Responder, AppError> {
    let intern = fetch_intern(&pool, intern_id.into_inner()).await?;
    let period = Period::from_param(query.period.as_deref());
    let series =
        analytics::task_series(&pool, intern.id, period, query.start_date, query.end_date).await?;
    Ok(HttpResponse::Ok().json(json!({
        "intern": intern,
        "series": series,
    })))
}

/// Reset an intern's password
///
/// Uses the supplied password (at least 8 characters) or generates one. The value is
/// returned once in this response.
#[post("/interns/{id}/password-reset")]
pub async fn reset_password(
    pool: web::Data<PgPool>,
    staff: StaffUser,
    intern_id: web::Path<i32>,
    reset_data: Option<web::Json<PasswordResetInput>>,
) -> Result<impl Responder, AppError> {
    let intern = fetch_intern(&pool, intern_id.into_inner()).await?;
    let supplied = reset_data.map(|data| data.into_inner()).unwrap_or_default();
    let password = choose_password(supplied.password.as_deref())?;

    accounts::reset_intern_password(&pool, &intern, &password.value).await?;
    log::info!(
        "Staff user {} reset the password of intern {}",
        staff.user.id,
        intern.id
    );

    Ok(HttpResponse::Ok().json(json!({
        "notice": format!("Password reset for {}.", intern.name),
        "intern_id": intern.id,
        "password": password.value,
        "generated": password.generated,
    })))
}

/// Compare interns side by side
///
/// `interns` lists at least two intern ids. Counts cover tasks dated within the optional
/// range.
#[get("/compare")]
pub async fn compare_interns(
    pool: web::Data<PgPool>,
    _staff: StaffUser,
    query: web::Query<CompareQuery>,
) -> Result<impl Responder, AppError> {
    let ids = parse_intern_ids(query.interns.as_deref().unwrap_or(""))?;

    let rows = sqlx::query_as::<_, InternComparison>(&format!(
        "SELECT i.id AS intern_id, i.name, i.department, {} \
         FROM interns i \
         LEFT JOIN tasks t ON t.intern_id = i.id \
              AND ($2::date IS NULL OR t.date >= $2) \
              AND ($3::date IS NULL OR t.date <= $3) \
         WHERE i.id = ANY($1) \
         GROUP BY i.id, i.name, i.department",
        TASK_COUNT_COLUMNS
    ))
    .bind(&ids)
    .bind(query.start_date)
    .bind(query.end_date)
    .fetch_all(&**pool)
    .await?;

    if rows.len() != ids.len() {
        return Err(AppError::NotFound("Intern not found".into()));
    }

    // Columns follow the order the ids were requested in.
    let mut rows = rows;
    rows.sort_by_key(|row| ids.iter().position(|id| *id == row.intern_id));

    Ok(HttpResponse::Ok().json(json!({
        "start_date": query.start_date,
        "end_date": query.end_date,
        "interns": rows,
    })))
}

/// List staff members, filtered like the intern list (`search` matches name or position).
#[get("/members")]
pub async fn list_members(
    pool: web::Data<PgPool>,
    _staff: StaffUser,
    query: web::Query<StaffQuery>,
) -> Result<impl Responder, AppError> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM staff WHERE TRUE", STAFF_COLUMNS));
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR position ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(department) = query.department {
        builder.push(" AND department = ").push_bind(department);
    }
    builder.push(" ORDER BY name, id");

    let members: Vec<Staff> = builder.build_query_as().fetch_all(&**pool).await?;
    Ok(HttpResponse::Ok().json(members))
}

/// Create a staff member with a login
///
/// Only a superuser may grant superuser access.
#[post("/members")]
pub async fn create_member(
    pool: web::Data<PgPool>,
    staff: StaffUser,
    member_data: web::Json<StaffCreate>,
) -> Result<impl Responder, AppError> {
    member_data.validate()?;
    if member_data.is_superuser && !staff.user.is_superuser {
        log::warn!(
            "Staff user {} attempted to create a superuser account",
            staff.user.id
        );
        return Err(AppError::Forbidden(
            "Only superusers can grant superuser access".into(),
        ));
    }
    let password = choose_password(member_data.password.as_deref())?;

    let member = accounts::create_staff(
        &pool,
        NewStaff {
            username: member_data.username.trim(),
            email: member_data.email.as_deref().map(str::trim).unwrap_or(""),
            name: member_data.name.trim(),
            department: member_data.department,
            position: member_data.position.trim(),
            password: &password.value,
            is_superuser: member_data.is_superuser,
        },
    )
    .await?;
    log::info!("Staff user {} created staff member {}", staff.user.id, member.id);

    let mut body = json!({
        "notice": "Staff member created.",
        "staff": member,
    });
    if password.generated {
        body["password"] = json!(password.value);
    }
    Ok(HttpResponse::Created().json(body))
}

async fn fetch_intern(pool: &PgPool, intern_id: i32) -> Result<Intern, AppError> {
    sqlx::query_as::<_, Intern>(&format!("SELECT {} FROM interns WHERE id = $1", INTERN_COLUMNS))
        .bind(intern_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Intern not found".into()))
}

/// Parses `1,2,3` into distinct ids, keeping first-seen order.
fn parse_intern_ids(raw: &str) -> Result<Vec<i32>, AppError> {
    let mut ids: Vec<i32> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = part.parse::<i32>().map_err(|_| {
            AppError::field("interns", "invalid_id", "Intern ids must be whole numbers.")
        })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.len() < 2 {
        return Err(AppError::field(
            "interns",
            "too_few",
            "Select at least two interns to compare.",
        ));
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_intern_ids() {
        assert_eq!(parse_intern_ids("1,2").unwrap(), vec![1, 2]);
        assert_eq!(parse_intern_ids(" 3, 1 ,3,,2").unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn test_parse_intern_ids_rejects_bad_input() {
        assert!(matches!(parse_intern_ids(""), Err(AppError::Validation(_))));
        assert!(matches!(parse_intern_ids("4,4"), Err(AppError::Validation(_))));
        assert!(matches!(parse_intern_ids("1,two"), Err(AppError::Validation(_))));
    }
}
