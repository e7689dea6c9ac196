#[macro_use]
mod common;

use actix_web::{http::header, http::StatusCode, test};
use sqlx::PgPool;

use common::{bearer, cleanup_intern, cleanup_staff, create_intern, create_staff, TestIntern};
use internlog::models::{Department, TaskStatus};

async fn log_task(pool: &PgPool, intern: &TestIntern, date: &str, status: TaskStatus, text: &str) {
    sqlx::query(
        "INSERT INTO tasks (intern_id, task_description, date, status, remarks) \
         VALUES ($1, $2, $3::date, $4, 'said \"ok\", then left')",
    )
    .bind(intern.intern.id)
    .bind(text)
    .bind(date)
    .bind(status)
    .execute(pool)
    .await
    .unwrap();
}

#[actix_rt::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_hr_filters_and_csv_export_agree() {
    let pool = common::db_pool().await;
    let app = test_app!(pool);
    let staff = create_staff(&pool, false).await;
    let tag = common::unique("");
    let ann = create_intern(&pool, &format!("Ann {}", tag), Department::Hr).await;
    let bob = create_intern(&pool, &format!("Bob {}", tag), Department::Hr).await;

    log_task(&pool, &ann, "2024-05-01", TaskStatus::Resolved, "Screened CVs").await;
    log_task(&pool, &ann, "2024-05-02", TaskStatus::Resolved, "Booked interviews, rooms").await;
    log_task(&pool, &ann, "2024-05-03", TaskStatus::Pending, "Drafted offer").await;
    log_task(&pool, &bob, "2024-05-02", TaskStatus::Resolved, "Filed payroll").await;

    let filters = format!("status=Resolved&intern_name=ann%20{}", tag);

    let req = test::TestRequest::get()
        .uri(&format!("/api/hr/dashboard?{}", filters))
        .insert_header(bearer(&staff.token))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["errors"].is_null());
    let tasks = body["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks
        .iter()
        .all(|t| t["status"] == "Resolved" && t["intern_id"] == ann.intern.id));
    assert_eq!(tasks[0]["date"], "2024-05-02");

    let req = test::TestRequest::get()
        .uri(&format!("/api/hr/export/csv?{}", filters))
        .insert_header(bearer(&staff.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "text/csv");
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("intern_tasks_"));

    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["Intern", "Email", "Department", "Staff", "Date", "Status", "Task", "Remarks"]
    );
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), tasks.len());
    assert_eq!(&records[0][6], "Booked interviews, rooms");
    assert_eq!(&records[0][7], "said \"ok\", then left");

    // Bad filters: the dashboard falls back to everything, the export refuses.
    let req = test::TestRequest::get()
        .uri("/api/hr/dashboard?start_date=yesterday")
        .insert_header(bearer(&staff.token))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["errors"]["start_date"].is_array());
    assert!(body["tasks"].as_array().unwrap().len() >= 4);

    let req = test::TestRequest::get()
        .uri("/api/hr/export/csv?status=Done")
        .insert_header(bearer(&staff.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    cleanup_intern(&pool, &ann.intern).await;
    cleanup_intern(&pool, &bob.intern).await;
    cleanup_staff(&pool, &staff).await;
}

#[actix_rt::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_analytics_counts_sum_to_task_total() {
    let pool = common::db_pool().await;
    let app = test_app!(pool);
    let intern = create_intern(&pool, "Chart Intern", Department::Sales).await;
    let staff = create_staff(&pool, false).await;

    for date in ["2024-04-29", "2024-05-01", "2024-05-05", "2024-05-06", "2024-06-10"] {
        log_task(&pool, &intern, date, TaskStatus::Pending, "Called leads").await;
    }

    let req = test::TestRequest::get()
        .uri("/api/intern/analytics?period=week")
        .insert_header(bearer(&intern.token))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 5);
    assert_eq!(body["labels"], serde_json::json!(["2024-04-29", "2024-05-06", "2024-06-10"]));
    assert_eq!(body["counts"], serde_json::json!([3, 1, 1]));

    // Unknown periods fall back to weekly buckets.
    let req = test::TestRequest::get()
        .uri("/api/intern/analytics?period=fortnight")
        .insert_header(bearer(&intern.token))
        .to_request();
    let fallback: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fallback["labels"], body["labels"]);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/staff/interns/{}/analytics?period=month&start_date=2024-05-01",
            intern.intern.id
        ))
        .insert_header(bearer(&staff.token))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["series"]["labels"], serde_json::json!(["2024-05", "2024-06"]));
    assert_eq!(body["series"]["counts"], serde_json::json!([3, 1]));
    assert_eq!(body["series"]["total"], 4);

    cleanup_intern(&pool, &intern.intern).await;
    cleanup_staff(&pool, &staff).await;
}

#[actix_rt::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_compare_interns() {
    let pool = common::db_pool().await;
    let app = test_app!(pool);
    let staff = create_staff(&pool, false).await;
    let first = create_intern(&pool, "Compare One", Department::Operations).await;
    let second = create_intern(&pool, "Compare Two", Department::Operations).await;

    log_task(&pool, &first, "2024-05-01", TaskStatus::Resolved, "Audited stock").await;
    log_task(&pool, &first, "2024-05-02", TaskStatus::Pending, "Ordered pallets").await;
    log_task(&pool, &first, "2024-07-01", TaskStatus::Pending, "Out of range").await;

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/staff/compare?interns={},{}&end_date=2024-06-30",
            second.intern.id, first.intern.id
        ))
        .insert_header(bearer(&staff.token))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let rows = body["interns"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["intern_id"], second.intern.id);
    assert_eq!(rows[0]["total"], 0);
    assert_eq!(rows[1]["total"], 2);
    assert_eq!(rows[1]["pending"], 1);
    assert_eq!(rows[1]["resolved"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/staff/compare?interns={}", first.intern.id))
        .insert_header(bearer(&staff.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    cleanup_intern(&pool, &first.intern).await;
    cleanup_intern(&pool, &second.intern).await;
    cleanup_staff(&pool, &staff).await;
}

#[actix_rt::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_csv_export_with_no_matches_is_header_only() {
    let pool = common::db_pool().await;
    let app = test_app!(pool);
    let staff = create_staff(&pool, false).await;

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/hr/export/csv?intern_name={}",
            common::unique("nobody-")
        ))
        .insert_header(bearer(&staff.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        "Intern,Email,Department,Staff,Date,Status,Task,Remarks\n"
    );

    cleanup_staff(&pool, &staff).await;
}
