//! # Application Creation Service
//!
//! Backs `POST /api/applications`.
//!
//! ## Workflow
//!
//! 1.  Reject the request early when the `ConsumerID` is missing, taken, or one of the
//!     fixed path words under the scope, before any photo is written.
//! 2.  Save `MeterImage` and `TimerPanelImage` (when present) under random names.
//! 3.  Stamp `Date`/`Time` in the record timezone and hand the record to the store,
//!     which assigns the `ApplicationID` and enforces uniqueness again.
//! 4.  If anything after step 2 fails, the photos written for this request are
//!     discarded so they do not linger unreferenced.

use crate::error::{ApiError, AppResult};
use crate::images::ImageName;
use crate::state::AppState;
use crate::store::DUPLICATE_CONSUMER;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::application::ApplicationRecord;
use common::requests::CreateApplicationRequest;
use common::responses::Envelope;

/// Fixed `GET` paths that would shadow `GET /{consumer_id}`.
const RESERVED_IDS: [&str; 2] = ["today", "month"];

pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<CreateApplicationRequest>,
) -> impl Responder {
    match create_application(&state, payload.into_inner()) {
        Ok(record) => HttpResponse::Created().json(Envelope::new("Data saved successfully", record)),
        Err(e) => e.error_response(),
    }
}

pub fn create_application(
    state: &AppState,
    request: CreateApplicationRequest,
) -> AppResult<ApplicationRecord> {
    let consumer_id = request
        .consumer_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::ValidationFailed("ConsumerID is required".to_string()))?;
    if RESERVED_IDS.contains(&consumer_id.as_str()) {
        return Err(ApiError::ValidationFailed(format!(
            "ConsumerID '{}' is reserved",
            consumer_id
        )));
    }

    if state.db.consumer_exists(&consumer_id)? {
        return Err(ApiError::DuplicateKey(DUPLICATE_CONSUMER.to_string()));
    }

    let mut saved = Vec::new();
    let result = store_new(state, consumer_id, request, &mut saved);
    if result.is_err() {
        state.images.discard_all(saved.iter().map(String::as_str));
    }
    result
}

fn store_new(
    state: &AppState,
    consumer_id: String,
    request: CreateApplicationRequest,
    saved: &mut Vec<String>,
) -> AppResult<ApplicationRecord> {
    let mut save = |payload: Option<&str>| -> AppResult<Option<String>> {
        match payload {
            Some(data) => {
                let name = state.images.save(data, ImageName::Random)?;
                saved.push(name.clone());
                Ok(Some(name))
            }
            None => Ok(None),
        }
    };
    let meter_image = save(request.meter_image.as_deref())?;
    let timer_panel_image = save(request.timer_panel_image.as_deref())?;

    let stamp = state.clock.stamp();
    let record = ApplicationRecord {
        application_id: String::new(),
        consumer_id,
        ward_committee: request.ward_committee,
        new_meter_number: request.new_meter_number,
        purpose: request.purpose,
        kind: request.kind,
        address: request.address,
        meter_latitude: request.meter_latitude,
        meter_longitude: request.meter_longitude,
        sanction_load: request.sanction_load,
        timer_panel: request.timer_panel,
        meter_image,
        timer_panel_image,
        date: stamp.date,
        time: stamp.time,
        responses: Vec::new(),
    };
    state.db.create_application(record)
}
