use crate::{
    auth::StaffUser,
    error::{field_messages, AppError},
    models::{StaffChoice, TaskReportRow},
    reports::{
        csv_export::{export_filename, stream_report},
        TaskFilter, TaskFilterQuery,
    },
};
use actix_web::{
    get,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web, HttpResponse, Responder,
};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;

/// HR dashboard
///
/// Every task matching the filters, in report order. When a filter value cannot be parsed
/// no filter is applied and the field errors are returned alongside the rows.
#[get("/dashboard")]
pub async fn dashboard(
    pool: web::Data<PgPool>,
    _staff: StaffUser,
    query: web::Query<TaskFilterQuery>,
) -> Result<impl Responder, AppError> {
    let (filter, errors) = match TaskFilter::parse(&query) {
        Ok(filter) => (filter, None),
        Err(errors) => (TaskFilter::default(), Some(field_messages(&errors))),
    };

    let mut builder = filter.report_query();
    let tasks: Vec<TaskReportRow> = builder.build_query_as().fetch_all(&**pool).await?;

    let staff = sqlx::query_as::<_, StaffChoice>(
        "SELECT id, name, position FROM staff ORDER BY name",
    )
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "filters": query.into_inner(),
        "errors": errors,
        "tasks": tasks,
        "staff": staff,
    })))
}

/// CSV export of the filtered report
///
/// The body is streamed as rows are read. Unparseable filters are rejected rather than
/// exporting every task.
#[get("/export/csv")]
pub async fn export_csv(
    pool: web::Data<PgPool>,
    staff: StaffUser,
    query: web::Query<TaskFilterQuery>,
) -> Result<impl Responder, AppError> {
    let filter = TaskFilter::parse(&query)?;
    log::info!("Staff user {} started a CSV export: {:?}", staff.user.id, filter);

    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(export_filename(
            Utc::now().date_naive(),
        ))],
    };

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header(disposition)
        .streaming(stream_report(pool.get_ref().clone(), filter)))
}
