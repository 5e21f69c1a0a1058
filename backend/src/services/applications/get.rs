use super::NOT_FOUND;
use crate::error::{ApiError, AppResult};
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::application::ApplicationRecord;

/// `GET /api/applications/{consumer_id}`
pub async fn process(state: web::Data<AppState>, consumer_id: web::Path<String>) -> impl Responder {
    match get_application(&state, &consumer_id) {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => e.error_response(),
    }
}

pub fn get_application(state: &AppState, consumer_id: &str) -> AppResult<ApplicationRecord> {
    state
        .db
        .find_by_consumer_id(consumer_id)?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))
}
