use crate::{
    auth::{CurrentIntern, INTERN_DASHBOARD_PATH},
    error::AppError,
    models::{
        assignment::ASSIGNMENT_COLUMNS, submission::check_submission, task::TASK_COLUMNS,
        submission::SUBMISSION_COLUMNS, Assignment, StaffChoice, Submission, SubmissionInput,
        Task, TaskInput,
    },
    reports::{analytics::task_series, AnalyticsQuery, Period},
};
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Intern dashboard
///
/// The intern's profile, their tasks (newest date first), the staff they can pick from
/// when logging a task, and today's date for the entry form.
#[get("/dashboard")]
pub async fn dashboard(
    pool: web::Data<PgPool>,
    current: CurrentIntern,
) -> Result<impl Responder, AppError> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE intern_id = $1 ORDER BY date DESC, created_at DESC",
        TASK_COLUMNS
    ))
    .bind(current.intern.id)
    .fetch_all(&**pool)
    .await?;

    let staff = sqlx::query_as::<_, StaffChoice>(
        "SELECT id, name, position FROM staff ORDER BY name",
    )
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "intern": current.intern,
        "tasks": tasks,
        "staff": staff,
        "today": Utc::now().date_naive(),
    })))
}

/// Log a task
///
/// The task always belongs to the calling intern. `staff_id`, when given, must name an
/// existing staff member.
#[post("/tasks")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    current: CurrentIntern,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    if let Some(staff_id) = task_data.staff_id {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM staff WHERE id = $1)")
            .bind(staff_id)
            .fetch_one(&**pool)
            .await?;
        if !exists {
            return Err(AppError::field(
                "staff_id",
                "invalid_choice",
                "Select a valid choice. That choice is not one of the available choices.",
            ));
        }
    }

    let input = task_data.into_inner();
    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (intern_id, staff_id, staff_name, staff_identifier, staff_phone, \
         task_description, date, status, remarks) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(current.intern.id)
    .bind(input.staff_id)
    .bind(input.staff_name.unwrap_or_default().trim())
    .bind(input.staff_identifier.unwrap_or_default().trim())
    .bind(input.staff_phone.unwrap_or_default().trim())
    .bind(input.task_description.trim())
    .bind(input.date)
    .bind(input.status)
    .bind(input.remarks.unwrap_or_default())
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "notice": "Task recorded.",
        "task": task,
    })))
}

/// Toggle a task between Pending and Resolved
///
/// Only the intern who owns the task may toggle it; anyone else is sent back to the
/// dashboard and the task is left unchanged.
#[post("/tasks/{id}/status")]
pub async fn toggle_task_status(
    pool: web::Data<PgPool>,
    current: CurrentIntern,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let task = sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
        .bind(task_id.into_inner())
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    if !task.is_owned_by(current.intern.id) {
        log::warn!(
            "Intern {} attempted to update task {} owned by intern {}",
            current.intern.id,
            task.id,
            task.intern_id
        );
        return Err(AppError::redirect(
            INTERN_DASHBOARD_PATH,
            "You are not allowed to update this task.",
        ));
    }

    // Flip in the row itself so concurrent toggles never both write the same value.
    let updated = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET status = CASE status \
             WHEN 'Pending' THEN 'Resolved'::task_status \
             ELSE 'Pending'::task_status END, \
         updated_at = NOW() \
         WHERE id = $1 AND intern_id = $2 RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(task.id)
    .bind(current.intern.id)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "notice": "Task status updated.",
        "task": updated,
    })))
}

/// Chart data for the intern's own tasks
///
/// `period` is `day`, `week` or `month`; anything else means `week`.
#[get("/analytics")]
pub async fn analytics(
    pool: web::Data<PgPool>,
    current: CurrentIntern,
    query: web::Query<AnalyticsQuery>,
) -> Result<impl Responder, AppError> {
    let period = Period::from_param(query.period.as_deref());
    let series = task_series(
        &pool,
        current.intern.id,
        period,
        query.start_date,
        query.end_date,
    )
    .await?;
    Ok(HttpResponse::Ok().json(series))
}

/// Assignments open to the intern's department, newest first.
#[get("/assignments")]
pub async fn list_assignments(
    pool: web::Data<PgPool>,
    current: CurrentIntern,
) -> Result<impl Responder, AppError> {
    let assignments = sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {} FROM assignments ORDER BY created_at DESC",
        ASSIGNMENT_COLUMNS
    ))
    .fetch_all(&**pool)
    .await?;

    let open: Vec<Assignment> = assignments
        .into_iter()
        .filter(|a| a.is_open_to(current.intern.department))
        .collect();

    Ok(HttpResponse::Ok().json(open))
}

/// Submit a response to an assignment
///
/// Refused unless the assignment is open to the intern's department and the submission
/// carries text or an upload reference.
#[post("/assignments/{id}/submissions")]
pub async fn submit_assignment(
    pool: web::Data<PgPool>,
    current: CurrentIntern,
    assignment_id: web::Path<i32>,
    submission_data: web::Json<SubmissionInput>,
) -> Result<impl Responder, AppError> {
    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {} FROM assignments WHERE id = $1",
        ASSIGNMENT_COLUMNS
    ))
    .bind(assignment_id.into_inner())
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Assignment not found".into()))?;

    if let Err(err) = check_submission(&assignment, current.intern.department, &submission_data) {
        log::info!(
            "Rejected submission by intern {} to assignment {}: {}",
            current.intern.id,
            assignment.id,
            err
        );
        return Err(err);
    }

    let submission = sqlx::query_as::<_, Submission>(&format!(
        "INSERT INTO submissions (assignment_id, intern_id, text, upload) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        SUBMISSION_COLUMNS
    ))
    .bind(assignment.id)
    .bind(current.intern.id)
    .bind(submission_data.text.trim())
    .bind(submission_data.upload_ref())
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "notice": "Submission received.",
        "submission": submission,
    })))
}

/// The intern's own submissions, newest first.
#[get("/submissions")]
pub async fn list_submissions(
    pool: web::Data<PgPool>,
    current: CurrentIntern,
) -> Result<impl Responder, AppError> {
    let submissions = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {} FROM submissions WHERE intern_id = $1 ORDER BY submitted_at DESC",
        SUBMISSION_COLUMNS
    ))
    .bind(current.intern.id)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(submissions))
}
