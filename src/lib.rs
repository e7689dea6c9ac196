#![doc = "The `internlog` library crate."]
#![doc = ""]
#![doc = "Domain models, authentication, account management, reporting, routing configuration"]
#![doc = "and error handling for the intern task-logging portal. The binary (`main.rs`) builds"]
#![doc = "the actix-web application from these pieces."]

pub mod accounts;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod reports;
pub mod routes;

pub use crate::error::AppError;
