//! # Applications Service Module
//!
//! HTTP endpoints for meter-installation applications and the survey
//! responses nested inside them. Everything lives under one scope, since
//! actix stops at the first scope whose prefix matches.
//!
//! ## Sub-modules:
//! - `create`: new application with optional meter and timer-panel photos.
//! - `list`, `get`, `delete`: plain reads and deletion by `ConsumerID`.
//! - `update`: partial update that reconciles stored photos.
//! - `reports`: ward counts and date queries.
//! - `responses`: append and remove survey entries.

mod create;
mod delete;
mod get;
mod list;
mod reports;
mod responses;
mod update;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

/// The base path for all application endpoints.
const API_PATH: &str = "/api/applications";

/// Message for a `ConsumerID` that matches no application.
const NOT_FOUND: &str = "Data not found";

/// Configures and returns the Actix `Scope` for all application routes.
///
/// # Registered Routes:
///
/// *   **`POST /`**: `create::process`, 201 with the stored record.
/// *   **`GET /`**: `list::process`, every record in insertion order.
/// *   **`GET /today`**: records stamped with today's date.
/// *   **`GET /month?year=&month=`**: records of one calendar month.
/// *   **`GET /wards/count`**: applications per ward.
/// *   **`GET /wards/responses/count`**: survey entries per ward.
/// *   **`GET /{consumer_id}`**: one record.
/// *   **`PUT /{consumer_id}`**: partial update, see `update`.
/// *   **`DELETE /{consumer_id}`**: delete one record.
/// *   **`POST /{consumer_id}/responses`**: append a survey entry.
/// *   **`DELETE /{consumer_id}/responses/{response_id}`**: remove a survey entry.
///
/// Fixed paths are registered before `/{consumer_id}` so they win the match;
/// `create` refuses `today` and `month` as consumer ids for that reason.
pub fn configure_routes() -> Scope {
    let scope = scope(API_PATH)
        .route("", post().to(create::process))
        .route("", get().to(list::process))
        .route("/today", get().to(reports::today))
        .route("/month", get().to(reports::month))
        .route("/wards/count", get().to(reports::ward_count))
        .route("/wards/responses/count", get().to(reports::response_ward_count))
        .route("/{consumer_id}", get().to(get::process))
        .route("/{consumer_id}", put().to(update::process))
        .route("/{consumer_id}", delete().to(delete::process));
    responses::register(scope)
}
