#[macro_use]
mod common;

use actix_web::{http::header, http::StatusCode, test};
use serde_json::json;

use common::{bearer, cleanup_intern, cleanup_staff, create_intern, create_staff};
use internlog::models::{Department, Task, TaskStatus};

#[actix_rt::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_task_create_and_toggle() {
    let pool = common::db_pool().await;
    let app = test_app!(pool);
    let owner = create_intern(&pool, "Toggle Owner", Department::Engineering).await;

    let req = test::TestRequest::post()
        .uri("/api/intern/tasks")
        .insert_header(bearer(&owner.token))
        .set_json(json!({
            "date": "2024-05-06",
            "task_description": "Reviewed onboarding checklist",
            "staff_name": "Dana",
            "staff_phone": "555-0101"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let task: Task = serde_json::from_value(body["task"].clone()).unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.intern_id, owner.intern.id);

    let toggle = || {
        test::TestRequest::post()
            .uri(&format!("/api/intern/tasks/{}/status", task.id))
            .insert_header(bearer(&owner.token))
            .to_request()
    };

    let resp = test::call_service(&app, toggle()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["task"]["status"], "Resolved");

    let resp = test::call_service(&app, toggle()).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["task"]["status"], "Pending");

    let req = test::TestRequest::post()
        .uri("/api/intern/tasks/2147483647/status")
        .insert_header(bearer(&owner.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    cleanup_intern(&pool, &owner.intern).await;
}

#[actix_rt::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_concurrent_toggles_each_flip_once() {
    let pool = common::db_pool().await;
    let app = test_app!(pool);
    let owner = create_intern(&pool, "Double Clicker", Department::Sales).await;

    let task_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO tasks (intern_id, task_description, date) \
         VALUES ($1, 'Sent quotes', '2024-05-08') RETURNING id",
    )
    .bind(owner.intern.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let toggle = || {
        test::TestRequest::post()
            .uri(&format!("/api/intern/tasks/{}/status", task_id))
            .insert_header(bearer(&owner.token))
            .to_request()
    };

    for _ in 0..5 {
        let (first, second) = futures::join!(
            test::call_service(&app, toggle()),
            test::call_service(&app, toggle())
        );
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);
        let first: serde_json::Value = test::read_body_json(first).await;
        let second: serde_json::Value = test::read_body_json(second).await;
        assert_ne!(first["task"]["status"], second["task"]["status"]);

        let status = sqlx::query_scalar::<_, TaskStatus>("SELECT status FROM tasks WHERE id = $1")
            .bind(task_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(status, TaskStatus::Pending);
    }

    cleanup_intern(&pool, &owner.intern).await;
}

#[actix_rt::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_toggle_by_other_intern_is_refused() {
    let pool = common::db_pool().await;
    let app = test_app!(pool);
    let owner = create_intern(&pool, "Task Owner", Department::Finance).await;
    let other = create_intern(&pool, "Someone Else", Department::Finance).await;

    let task_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO tasks (intern_id, task_description, date) \
         VALUES ($1, 'Balanced petty cash', '2024-05-07') RETURNING id",
    )
    .bind(owner.intern.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/intern/tasks/{}/status", task_id))
        .insert_header(bearer(&other.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/api/intern/dashboard"
    );
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["notice"], "You are not allowed to update this task.");

    let status = sqlx::query_scalar::<_, TaskStatus>("SELECT status FROM tasks WHERE id = $1")
        .bind(task_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, TaskStatus::Pending);

    cleanup_intern(&pool, &owner.intern).await;
    cleanup_intern(&pool, &other.intern).await;
}

#[actix_rt::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_task_rejects_unknown_staff() {
    let pool = common::db_pool().await;
    let app = test_app!(pool);
    let intern = create_intern(&pool, "Staff Picker", Department::Other).await;

    let req = test::TestRequest::post()
        .uri("/api/intern/tasks")
        .insert_header(bearer(&intern.token))
        .set_json(json!({
            "date": "2024-05-06",
            "task_description": "Shadowed the ops lead",
            "staff_id": 2147483647
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["fields"]["staff_id"].is_array());

    cleanup_intern(&pool, &intern.intern).await;
}

#[actix_rt::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_submission_department_rule() {
    let pool = common::db_pool().await;
    let app = test_app!(pool);
    let staff = create_staff(&pool, false).await;
    let engineer = create_intern(&pool, "Eng Intern", Department::Engineering).await;

    let post_assignment = |departments: serde_json::Value| {
        test::TestRequest::post()
            .uri("/api/staff/assignments")
            .insert_header(bearer(&staff.token))
            .set_json(json!({
                "title": "Process notes",
                "description": "Describe one process you improved",
                "departments": departments,
                "allow_file_upload": false
            }))
            .to_request()
    };

    let resp = test::call_service(&app, post_assignment(json!(["HR", "Finance"]))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let closed: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(closed["departments"], "HR,Finance");
    assert_eq!(closed["posted_by"], staff.user_id);

    let resp = test::call_service(&app, post_assignment(json!(["Engineering", "HR"]))).await;
    let open: serde_json::Value = test::read_body_json(resp).await;

    let submit = |assignment_id: &serde_json::Value, body: serde_json::Value| {
        test::TestRequest::post()
            .uri(&format!("/api/intern/assignments/{}/submissions", assignment_id))
            .insert_header(bearer(&engineer.token))
            .set_json(body)
            .to_request()
    };

    let resp = test::call_service(&app, submit(&closed["id"], json!({ "text": "done" }))).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, submit(&open["id"], json!({ "text": "  " }))).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = test::call_service(
        &app,
        submit(&open["id"], json!({ "upload": "submissions/eng/notes.pdf" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = test::call_service(
        &app,
        submit(&open["id"], json!({ "text": "Automated the build" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let submission_id = body["submission"]["id"].clone();

    // Only assignments open to Engineering are listed for this intern.
    let req = test::TestRequest::get()
        .uri("/api/intern/assignments")
        .insert_header(bearer(&engineer.token))
        .to_request();
    let listed: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
    assert!(listed.iter().any(|a| a["id"] == open["id"]));
    assert!(listed.iter().all(|a| a["id"] != closed["id"]));

    let req = test::TestRequest::post()
        .uri(&format!("/api/staff/submissions/{}/review", submission_id))
        .insert_header(bearer(&staff.token))
        .set_json(json!({ "review_notes": "Nice work" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["submission"]["reviewed"], true);

    for assignment in [&closed, &open] {
        let req = test::TestRequest::delete()
            .uri(&format!("/api/staff/assignments/{}", assignment["id"]))
            .insert_header(bearer(&staff.token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    cleanup_intern(&pool, &engineer.intern).await;
    cleanup_staff(&pool, &staff).await;
}
