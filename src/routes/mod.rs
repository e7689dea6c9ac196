pub mod admin;
pub mod assignments;
pub mod auth;
pub mod health;
pub mod hr;
pub mod intern;
pub mod staff;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::AppError;

/// Registers every `/api` route. Mount inside a scope wrapped with `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::signup)
            .service(auth::login)
            .service(auth::logout),
    )
    .service(
        web::scope("/intern")
            .service(intern::dashboard)
            .service(intern::create_task)
            .service(intern::toggle_task_status)
            .service(intern::analytics)
            .service(intern::list_assignments)
            .service(intern::submit_assignment)
            .service(intern::list_submissions),
    )
    .service(
        web::scope("/staff")
            .service(auth::staff_login)
            .service(staff::dashboard)
            .service(staff::list_interns)
            .service(staff::create_intern)
            .service(staff::compare_interns)
            .service(staff::intern_detail)
            .service(staff::intern_analytics)
            .service(staff::reset_password)
            .service(staff::list_members)
            .service(staff::create_member)
            .service(assignments::list_assignments)
            .service(assignments::create_assignment)
            .service(assignments::get_assignment)
            .service(assignments::update_assignment)
            .service(assignments::delete_assignment)
            .service(assignments::list_submissions)
            .service(assignments::review_submission),
    )
    .service(
        web::scope("/hr")
            .service(hr::dashboard)
            .service(hr::export_csv),
    )
    .service(
        web::scope("/admin")
            .service(admin::list_users)
            .service(admin::update_user),
    );
}

/// Maps body and query extraction failures onto `AppError::BadRequest`.
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::NotFound(err.to_string()).into()),
    );
}

/// A successful action that sends the caller on, with a notice to show.
pub fn see_other(location: &str, notice: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((actix_web::http::header::LOCATION, location))
        .json(json!({ "redirect": location, "notice": notice }))
}
