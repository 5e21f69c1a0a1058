//! # Survey Entry Append Service
//!
//! Backs `POST /api/applications/{consumer_id}/responses`. The optional
//! `PoleImage` is written first and its file name stored on the new entry;
//! if the parent record does not exist the photo is discarded again.

use crate::error::{ApiError, AppResult};
use crate::images::ImageName;
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::application::ApplicationRecord;
use common::model::response::ResponseRecord;
use common::requests::AddResponseRequest;
use common::responses::Envelope;
use uuid::Uuid;

pub async fn process(
    state: web::Data<AppState>,
    consumer_id: web::Path<String>,
    payload: web::Json<AddResponseRequest>,
) -> impl Responder {
    match append_response(&state, &consumer_id, payload.into_inner()) {
        Ok(record) => {
            HttpResponse::Ok().json(Envelope::new("Response data added successfully", record))
        }
        Err(e) => e.error_response(),
    }
}

pub fn append_response(
    state: &AppState,
    consumer_id: &str,
    request: AddResponseRequest,
) -> AppResult<ApplicationRecord> {
    let pole_image = request
        .pole_image
        .as_deref()
        .map(|data| state.images.save(data, ImageName::Random))
        .transpose()?;

    let stamp = state.clock.stamp();
    let response = ResponseRecord {
        id: Uuid::new_v4().to_string(),
        ward_committee: request.ward_committee.clone(),
        consumer_id: Some(consumer_id.to_string()),
        pole: request.pole(),
        light: request.light(),
        number_light: request.number_light,
        pole_image: pole_image.clone(),
        pole_latitude: request.pole_latitude,
        pole_longitude: request.pole_longitude,
        cable: request.cable(),
        date: stamp.date,
        time: stamp.time,
    };

    let result = state
        .db
        .push_response(consumer_id, response)
        .and_then(|updated| updated.ok_or_else(|| ApiError::NotFound("Consumer ID not found".to_string())));
    if result.is_err() {
        if let Some(name) = pole_image.as_deref() {
            state.images.discard(name);
        }
    }
    result
}
