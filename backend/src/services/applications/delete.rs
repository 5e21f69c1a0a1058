use super::NOT_FOUND;
use crate::error::{ApiError, AppResult};
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::application::ApplicationRecord;
use common::responses::Envelope;

/// `DELETE /api/applications/{consumer_id}`
///
/// Returns the deleted record. Photos it referenced stay in the uploads
/// directory; deletion does not cascade to files.
pub async fn process(state: web::Data<AppState>, consumer_id: web::Path<String>) -> impl Responder {
    match delete_application(&state, &consumer_id) {
        Ok(record) => HttpResponse::Ok().json(Envelope::new("Data deleted successfully", record)),
        Err(e) => e.error_response(),
    }
}

pub fn delete_application(state: &AppState, consumer_id: &str) -> AppResult<ApplicationRecord> {
    state
        .db
        .delete_by_consumer_id(consumer_id)?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))
}
