use crate::{
    auth::StaffUser,
    error::AppError,
    models::{
        assignment::ASSIGNMENT_COLUMNS, submission::SUBMISSION_COLUMNS,
        submission::SUBMISSION_DETAIL_SELECT, Assignment, AssignmentInput, AssignmentSummary,
        Department, ReviewInput, Submission, SubmissionDetail,
    },
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// List assignments, newest first, with submission counts.
#[get("/assignments")]
pub async fn list_assignments(
    pool: web::Data<PgPool>,
    _staff: StaffUser,
) -> Result<impl Responder, AppError> {
    let assignments = sqlx::query_as::<_, AssignmentSummary>(
        "SELECT a.id, a.title, a.description, a.departments, a.posted_by, a.due_date, \
                a.allow_file_upload, a.created_at, \
                COUNT(s.id) AS submission_count, \
                COUNT(s.id) FILTER (WHERE NOT s.reviewed) AS unreviewed_count \
         FROM assignments a \
         LEFT JOIN submissions s ON s.assignment_id = a.id \
         GROUP BY a.id \
         ORDER BY a.created_at DESC, a.id DESC",
    )
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(assignments))
}

/// Post an assignment
///
/// `departments` lists every department whose interns may respond. The caller is recorded
/// as the poster.
#[post("/assignments")]
pub async fn create_assignment(
    pool: web::Data<PgPool>,
    staff: StaffUser,
    assignment_data: web::Json<AssignmentInput>,
) -> Result<impl Responder, AppError> {
    assignment_data.validate()?;

    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        "INSERT INTO assignments (title, description, departments, posted_by, due_date, \
         allow_file_upload) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
        ASSIGNMENT_COLUMNS
    ))
    .bind(assignment_data.title.trim())
    .bind(assignment_data.description.trim())
    .bind(Department::join(&assignment_data.departments))
    .bind(staff.user.id)
    .bind(assignment_data.due_date)
    .bind(assignment_data.allow_file_upload)
    .fetch_one(&**pool)
    .await?;

    log::info!("Staff user {} posted assignment {}", staff.user.id, assignment.id);
    Ok(HttpResponse::Created().json(assignment))
}

#[get("/assignments/{id}")]
pub async fn get_assignment(
    pool: web::Data<PgPool>,
    _staff: StaffUser,
    assignment_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let assignment = fetch_assignment(&pool, assignment_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(assignment))
}

/// Replace an assignment's fields. The original poster is kept.
#[put("/assignments/{id}")]
pub async fn update_assignment(
    pool: web::Data<PgPool>,
    _staff: StaffUser,
    assignment_id: web::Path<i32>,
    assignment_data: web::Json<AssignmentInput>,
) -> Result<impl Responder, AppError> {
    assignment_data.validate()?;

    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        "UPDATE assignments SET title = $1, description = $2, departments = $3, \
         due_date = $4, allow_file_upload = $5 WHERE id = $6 RETURNING {}",
        ASSIGNMENT_COLUMNS
    ))
    .bind(assignment_data.title.trim())
    .bind(assignment_data.description.trim())
    .bind(Department::join(&assignment_data.departments))
    .bind(assignment_data.due_date)
    .bind(assignment_data.allow_file_upload)
    .bind(assignment_id.into_inner())
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Assignment not found".into()))?;

    Ok(HttpResponse::Ok().json(assignment))
}

/// Delete an assignment together with its submissions.
#[delete("/assignments/{id}")]
pub async fn delete_assignment(
    pool: web::Data<PgPool>,
    staff: StaffUser,
    assignment_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let assignment_id = assignment_id.into_inner();
    let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
        .bind(assignment_id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Assignment not found".into()));
    }

    log::info!("Staff user {} deleted assignment {}", staff.user.id, assignment_id);
    Ok(HttpResponse::NoContent().finish())
}

/// Submissions for one assignment, newest first.
#[get("/assignments/{id}/submissions")]
pub async fn list_submissions(
    pool: web::Data<PgPool>,
    _staff: StaffUser,
    assignment_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let assignment = fetch_assignment(&pool, assignment_id.into_inner()).await?;

    let submissions = sqlx::query_as::<_, SubmissionDetail>(&format!(
        "{} WHERE s.assignment_id = $1 ORDER BY s.submitted_at DESC",
        SUBMISSION_DETAIL_SELECT
    ))
    .bind(assignment.id)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "assignment": assignment,
        "submissions": submissions,
    })))
}

/// Mark a submission reviewed (or not) and record notes for the intern.
#[post("/submissions/{id}/review")]
pub async fn review_submission(
    pool: web::Data<PgPool>,
    staff: StaffUser,
    submission_id: web::Path<i32>,
    review_data: web::Json<ReviewInput>,
) -> Result<impl Responder, AppError> {
    review_data.validate()?;

    let submission = sqlx::query_as::<_, Submission>(&format!(
        "UPDATE submissions SET reviewed = $1, review_notes = $2 WHERE id = $3 RETURNING {}",
        SUBMISSION_COLUMNS
    ))
    .bind(review_data.reviewed)
    .bind(review_data.review_notes.trim())
    .bind(submission_id.into_inner())
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;

    log::info!(
        "Staff user {} reviewed submission {} (reviewed = {})",
        staff.user.id,
        submission.id,
        submission.reviewed
    );
    Ok(HttpResponse::Ok().json(json!({
        "notice": "Review saved.",
        "submission": submission,
    })))
}

async fn fetch_assignment(pool: &PgPool, assignment_id: i32) -> Result<Assignment, AppError> {
    sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {} FROM assignments WHERE id = $1",
        ASSIGNMENT_COLUMNS
    ))
    .bind(assignment_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Assignment not found".into()))
}
