use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// `GET /api/applications`: every record, oldest first.
pub async fn process(state: web::Data<AppState>) -> impl Responder {
    match state.db.find_all() {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => e.error_response(),
    }
}
