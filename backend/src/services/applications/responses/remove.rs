use crate::error::{ApiError, AppResult};
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::application::ApplicationRecord;
use common::responses::Envelope;

/// `DELETE /api/applications/{consumer_id}/responses/{response_id}`
pub async fn process(state: web::Data<AppState>, path: web::Path<(String, String)>) -> impl Responder {
    let (consumer_id, response_id) = path.into_inner();
    match remove_response(&state, &consumer_id, &response_id) {
        Ok(record) => HttpResponse::Ok().json(Envelope::new("Response deleted successfully", record)),
        Err(e) => e.error_response(),
    }
}

/// Removes one entry by `_id`. The entry's photo is discarded once the record
/// no longer references it.
pub fn remove_response(
    state: &AppState,
    consumer_id: &str,
    response_id: &str,
) -> AppResult<ApplicationRecord> {
    let (record, removed) = state
        .db
        .pull_response(consumer_id, response_id)?
        .ok_or_else(|| ApiError::NotFound("Consumer ID or Response not found".to_string()))?;

    if let Some(name) = removed.pole_image.as_deref() {
        if !record.image_references().contains(name) {
            state.images.discard(name);
        }
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::applications::create::create_application;
    use crate::services::applications::responses::add::append_response;
    use crate::test_support::{self, PIXEL};
    use common::requests::{AddResponseRequest, CreateApplicationRequest};

    fn seeded_with_three(state: &AppState) -> ApplicationRecord {
        create_application(
            state,
            CreateApplicationRequest {
                consumer_id: Some("C1".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        for ward in ["A", "B"] {
            append_response(
                state,
                "C1",
                AddResponseRequest {
                    ward_committee: Some(ward.to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        }
        append_response(
            state,
            "C1",
            AddResponseRequest {
                ward_committee: Some("C".to_string()),
                pole_image: Some(PIXEL.to_string()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn removes_exactly_the_matching_entry() {
        let (_tmp, state) = test_support::state();
        let before = seeded_with_three(&state);
        let target = before.responses[1].id.clone();

        let after = remove_response(&state, "C1", &target).unwrap();
        assert_eq!(after.responses.len(), 2);
        assert_eq!(after.responses[0], before.responses[0]);
        assert_eq!(after.responses[1], before.responses[2]);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let (_tmp, state) = test_support::state();
        let before = seeded_with_three(&state);
        assert!(matches!(
            remove_response(&state, "C1", "no-such-entry").unwrap_err(),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            remove_response(&state, "C9", &before.responses[0].id).unwrap_err(),
            ApiError::NotFound(_)
        ));
        assert_eq!(state.db.find_by_consumer_id("C1").unwrap().unwrap().responses.len(), 3);
    }

    #[test]
    fn removed_entry_photo_is_discarded() {
        let (_tmp, state) = test_support::state();
        let before = seeded_with_three(&state);
        let last = &before.responses[2];
        let photo = last.pole_image.clone().unwrap();
        assert!(test_support::uploaded(&state, &photo));

        remove_response(&state, "C1", &last.id).unwrap();
        assert!(!test_support::uploaded(&state, &photo));
    }
}
