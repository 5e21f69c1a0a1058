//! # Application Update Service
//!
//! Backs `PUT /api/applications/{consumer_id}`: merges a typed partial update into
//! the stored record and keeps the uploads directory in step with it.
//!
//! ## Merge rules
//!
//! - Scalar fields: a value in the payload wins, an absent one keeps the stored value.
//! - `MeterImageData` / `TimerPanelImage`: new base64 data is saved as
//!   `meterImage_<consumer>` / `timerPanelImage_<consumer>` and replaces the reference.
//!   An absent field, or one that repeats the stored file name, keeps the reference.
//! - `Response`: when present it replaces the stored array. Entry `i` of the payload is
//!   merged with stored entry `i`: missing fields, `_id`, `Date`/`Time` and the photo
//!   carry over from that entry; a new photo is saved as `poleImage_<consumer>_<i>`.
//!
//! Matching by position assumes the client sends the array back in stored order.
//! A reordered or shortened array pairs entries with the wrong photos and ids; sending
//! `_id` on every entry keeps the ids right but photos still follow the index.
//!
//! ## File cleanup
//!
//! New photos are staged under temporary names and moved onto their final names
//! only after the new document is stored, so a rejected update never touches a
//! file the record still points at. Photos referenced before the update and not
//! after it are then discarded. If storing fails, the staged photos are dropped
//! and the old ones are left alone. Discards are best effort.

use super::NOT_FOUND;
use crate::error::{ApiError, AppResult};
use crate::images::{sanitize_stem, ImageName, ImageStore, StagedImage};
use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::application::ApplicationRecord;
use common::model::response::{CableDescriptor, LightDescriptor, PoleDescriptor, ResponseRecord};
use common::requests::{ResponseUpdate, UpdateApplicationRequest};
use log::error;
use uuid::Uuid;

pub async fn process(
    state: web::Data<AppState>,
    consumer_id: web::Path<String>,
    payload: web::Json<UpdateApplicationRequest>,
) -> impl Responder {
    match reconcile(&state, &consumer_id, payload.into_inner()) {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => e.error_response(),
    }
}

pub fn reconcile(
    state: &AppState,
    consumer_id: &str,
    update: UpdateApplicationRequest,
) -> AppResult<ApplicationRecord> {
    let existing = state
        .db
        .find_by_consumer_id(consumer_id)?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    let mut staged = Vec::new();
    let result = resolve(state, &existing, update, &mut staged).and_then(|resolved| {
        state
            .db
            .update_by_consumer_id(consumer_id, &resolved)?
            .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))
    });

    match &result {
        Ok(updated) => {
            for image in &staged {
                if let Err(e) = state.images.promote(image) {
                    error!("{} was stored but its image could not be moved into place: {}", consumer_id, e);
                }
            }
            let before = existing.image_references();
            let after = updated.image_references();
            state
                .images
                .discard_all(before.iter().copied().filter(|name| !after.contains(name)));
        }
        Err(_) => staged.iter().for_each(|image| state.images.abandon(image)),
    }
    result
}

fn resolve(
    state: &AppState,
    existing: &ApplicationRecord,
    update: UpdateApplicationRequest,
    staged: &mut Vec<StagedImage>,
) -> AppResult<ApplicationRecord> {
    let meter_image = replace_image(
        &state.images,
        existing.meter_image.as_deref(),
        update.meter_image.as_deref(),
        || keyed(format!("meterImage_{}", existing.consumer_id)),
        staged,
    )?;
    let timer_panel_image = replace_image(
        &state.images,
        existing.timer_panel_image.as_deref(),
        update.timer_panel_image.as_deref(),
        || keyed(format!("timerPanelImage_{}", existing.consumer_id)),
        staged,
    )?;
    let responses = match update.responses {
        Some(entries) => resolve_responses(state, existing, entries, staged)?,
        None => existing.responses.clone(),
    };

    Ok(ApplicationRecord {
        application_id: existing.application_id.clone(),
        consumer_id: existing.consumer_id.clone(),
        ward_committee: update.ward_committee.or_else(|| existing.ward_committee.clone()),
        new_meter_number: update.new_meter_number.or_else(|| existing.new_meter_number.clone()),
        purpose: update.purpose.or_else(|| existing.purpose.clone()),
        kind: update.kind.or_else(|| existing.kind.clone()),
        address: update.address.or_else(|| existing.address.clone()),
        meter_latitude: update.meter_latitude.or(existing.meter_latitude),
        meter_longitude: update.meter_longitude.or(existing.meter_longitude),
        sanction_load: update.sanction_load.or_else(|| existing.sanction_load.clone()),
        timer_panel: update.timer_panel.or(existing.timer_panel),
        meter_image,
        timer_panel_image,
        date: existing.date.clone(),
        time: existing.time.clone(),
        responses,
    })
}

fn resolve_responses(
    state: &AppState,
    existing: &ApplicationRecord,
    entries: Vec<ResponseUpdate>,
    staged: &mut Vec<StagedImage>,
) -> AppResult<Vec<ResponseRecord>> {
    let stamp = state.clock.stamp();
    let mut resolved = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let current = existing.responses.get(index);
        let pole_image = replace_image(
            &state.images,
            current.and_then(|c| c.pole_image.as_deref()),
            entry.pole_image.as_deref(),
            || pole_image_name(existing, index),
            staged,
        )?;

        resolved.push(ResponseRecord {
            id: entry
                .id
                .or_else(|| current.map(|c| c.id.clone()))
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            ward_committee: entry
                .ward_committee
                .or_else(|| current.and_then(|c| c.ward_committee.clone())),
            consumer_id: current
                .and_then(|c| c.consumer_id.clone())
                .or_else(|| Some(existing.consumer_id.clone())),
            pole: merge_pole(entry.pole, current),
            light: merge_light(entry.light, current),
            number_light: entry.number_light.or(current.and_then(|c| c.number_light)),
            pole_image,
            pole_latitude: entry.pole_latitude.or(current.and_then(|c| c.pole_latitude)),
            pole_longitude: entry.pole_longitude.or(current.and_then(|c| c.pole_longitude)),
            cable: merge_cable(entry.cable, current),
            date: current.map_or_else(|| stamp.date.clone(), |c| c.date.clone()),
            time: current.map_or_else(|| stamp.time.clone(), |c| c.time.clone()),
        });
    }
    Ok(resolved)
}

/// Resolves one image field. `name` is only evaluated when new data arrives;
/// that data is staged and only lands under its name once the update commits.
fn replace_image<F>(
    images: &ImageStore,
    current: Option<&str>,
    incoming: Option<&str>,
    name: F,
    staged: &mut Vec<StagedImage>,
) -> AppResult<Option<String>>
where
    F: FnOnce() -> ImageName,
{
    match incoming {
        None => Ok(current.map(str::to_string)),
        Some(value) if Some(value) == current => Ok(current.map(str::to_string)),
        Some(payload) => {
            let image = images.stage(payload, name())?;
            let target = image.target.clone();
            staged.push(image);
            Ok(Some(target))
        }
    }
}

/// Keyed name, unless the consumer id had to be sanitised: two ids that
/// sanitise to the same stem would otherwise share files.
fn keyed(stem: String) -> ImageName {
    if sanitize_stem(&stem) == stem {
        ImageName::Keyed(stem)
    } else {
        ImageName::Random
    }
}

/// `poleImage_<consumer>_<index>`, or a random name when another entry still
/// holds a file under that stem (entries shift after a removal).
fn pole_image_name(existing: &ApplicationRecord, index: usize) -> ImageName {
    let stem = match keyed(format!("poleImage_{}_{}", existing.consumer_id, index)) {
        ImageName::Keyed(stem) => stem,
        random => return random,
    };
    let prefix = format!("{}.", stem);
    let held_elsewhere = existing.responses.iter().enumerate().any(|(j, r)| {
        j != index
            && r.pole_image
                .as_deref()
                .is_some_and(|file| file.starts_with(&prefix))
    });
    if held_elsewhere {
        ImageName::Random
    } else {
        ImageName::Keyed(stem)
    }
}

fn merge_pole(update: Option<PoleDescriptor>, current: Option<&ResponseRecord>) -> PoleDescriptor {
    let base = current.map(|c| c.pole.clone()).unwrap_or_default();
    match update {
        Some(pole) => pole.merged_over(&base),
        None => base,
    }
}

fn merge_light(update: Option<LightDescriptor>, current: Option<&ResponseRecord>) -> LightDescriptor {
    let base = current.map(|c| c.light.clone()).unwrap_or_default();
    match update {
        Some(light) => light.merged_over(&base),
        None => base,
    }
}

fn merge_cable(update: Option<CableDescriptor>, current: Option<&ResponseRecord>) -> CableDescriptor {
    let base = current.map(|c| c.cable.clone()).unwrap_or_default();
    match update {
        Some(cable) => cable.merged_over(&base),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::applications::create::create_application;
    use crate::services::applications::responses::add::append_response;
    use crate::services::applications::responses::remove::remove_response;
    use crate::test_support::{self, PIXEL};
    use common::requests::{AddResponseRequest, CreateApplicationRequest};

    fn seed(state: &AppState, with_photos: bool) -> ApplicationRecord {
        create_application(
            state,
            CreateApplicationRequest {
                consumer_id: Some("C1".to_string()),
                ward_committee: Some("A".to_string()),
                address: Some("Old Rd".to_string()),
                meter_image: with_photos.then(|| PIXEL.to_string()),
                timer_panel_image: with_photos.then(|| PIXEL.to_string()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn add_entry(state: &AppState, ward: &str, photo: bool) -> ApplicationRecord {
        append_response(
            state,
            "C1",
            AddResponseRequest {
                ward_committee: Some(ward.to_string()),
                pole_name: Some("Steel".to_string()),
                pole_image: photo.then(|| PIXEL.to_string()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn missing_record_is_not_found() {
        let (_tmp, state) = test_support::state();
        let err = reconcile(&state, "C1", UpdateApplicationRequest::default()).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn absent_image_fields_keep_references() {
        let (_tmp, state) = test_support::state();
        let before = seed(&state, true);

        let after = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                address: Some("New Rd".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(after.address.as_deref(), Some("New Rd"));
        assert_eq!(after.ward_committee.as_deref(), Some("A"));
        assert_eq!(after.meter_image, before.meter_image);
        assert_eq!(after.timer_panel_image, before.timer_panel_image);
        assert_eq!(after.application_id, before.application_id);
        assert!(test_support::uploaded(&state, before.meter_image.as_deref().unwrap()));
    }

    #[test]
    fn echoed_file_name_is_a_carry_forward() {
        let (_tmp, state) = test_support::state();
        let before = seed(&state, true);
        let after = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                meter_image: before.meter_image.clone(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(after.meter_image, before.meter_image);
        assert!(test_support::uploaded(&state, after.meter_image.as_deref().unwrap()));
    }

    #[test]
    fn new_image_replaces_reference_and_removes_old_file() {
        let (_tmp, state) = test_support::state();
        let before = seed(&state, true);
        let old = before.meter_image.clone().unwrap();

        let after = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                meter_image: Some(format!("data:image/jpeg;base64,{}", PIXEL)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(after.meter_image.as_deref(), Some("meterImage_C1.jpeg"));
        assert!(test_support::uploaded(&state, "meterImage_C1.jpeg"));
        assert!(!test_support::uploaded(&state, &old));
        assert_eq!(after.timer_panel_image, before.timer_panel_image);

        // Same keyed name again: overwritten in place, not deleted.
        let again = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                meter_image: Some(format!("data:image/jpeg;base64,{}", PIXEL)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(again.meter_image.as_deref(), Some("meterImage_C1.jpeg"));
        assert!(test_support::uploaded(&state, "meterImage_C1.jpeg"));
    }

    #[test]
    fn failed_update_keeps_old_files_and_drops_new_ones() {
        let (_tmp, state) = test_support::state();
        let before = seed(&state, true);
        let old = before.meter_image.clone().unwrap();

        let err = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                meter_image: Some(PIXEL.to_string()),
                meter_latitude: Some(95.0),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::ValidationFailed(_)));
        assert!(test_support::uploaded(&state, &old));
        assert!(!test_support::uploaded(&state, "meterImage_C1.png"));
        let stored = state.db.find_by_consumer_id("C1").unwrap().unwrap();
        assert_eq!(stored, before);
    }

    fn upload_names(state: &AppState) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(state.images.dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn rejected_update_keeps_keyed_photo_bytes() {
        let (_tmp, state) = test_support::state();
        seed(&state, false);
        let first = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                meter_image: Some(format!("data:image/png;base64,{}", PIXEL)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(first.meter_image.as_deref(), Some("meterImage_C1.png"));
        let path = state.images.dir().join("meterImage_C1.png");
        let original = std::fs::read(&path).unwrap();

        let err = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                meter_image: Some("data:image/png;base64,AAECAwQFBgc=".to_string()),
                meter_latitude: Some(95.0),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::ValidationFailed(_)));
        assert_eq!(state.db.find_by_consumer_id("C1").unwrap().unwrap(), first);
        assert_eq!(std::fs::read(&path).unwrap(), original);
        assert_eq!(upload_names(&state), vec!["meterImage_C1.png".to_string()]);
    }

    #[test]
    fn bad_later_image_keeps_keyed_photo_bytes() {
        let (_tmp, state) = test_support::state();
        seed(&state, false);
        reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                meter_image: Some(PIXEL.to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let path = state.images.dir().join("meterImage_C1.png");
        let original = std::fs::read(&path).unwrap();

        let err = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                meter_image: Some("AAECAwQFBgc=".to_string()),
                timer_panel_image: Some("***".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::ValidationFailed(_)));
        assert_eq!(std::fs::read(&path).unwrap(), original);
        assert_eq!(upload_names(&state), vec!["meterImage_C1.png".to_string()]);
    }

    #[test]
    fn accepted_update_replaces_keyed_photo_bytes() {
        let (_tmp, state) = test_support::state();
        seed(&state, false);
        for payload in [PIXEL, "AAECAwQFBgc="] {
            reconcile(
                &state,
                "C1",
                UpdateApplicationRequest {
                    meter_image: Some(payload.to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        }
        let path = state.images.dir().join("meterImage_C1.png");
        assert_eq!(std::fs::read(&path).unwrap(), vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(upload_names(&state), vec!["meterImage_C1.png".to_string()]);
    }

    #[test]
    fn invalid_base64_fails_without_touching_record() {
        let (_tmp, state) = test_support::state();
        let before = seed(&state, true);
        let err = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                timer_panel_image: Some("***".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::ValidationFailed(_)));
        assert_eq!(state.db.find_by_consumer_id("C1").unwrap().unwrap(), before);
    }

    #[test]
    fn response_entries_align_by_index() {
        let (_tmp, state) = test_support::state();
        seed(&state, false);
        add_entry(&state, "A", true);
        let before = add_entry(&state, "B", false);
        let first_photo = before.responses[0].pole_image.clone().unwrap();

        let after = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                responses: Some(vec![
                    ResponseUpdate {
                        ward_committee: Some("A2".to_string()),
                        ..Default::default()
                    },
                    ResponseUpdate {
                        pole_image: Some(PIXEL.to_string()),
                        pole: Some(PoleDescriptor {
                            bracket: Some("L".to_string()),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(after.responses.len(), 2);
        let (a, b) = (&after.responses[0], &after.responses[1]);
        assert_eq!(a.id, before.responses[0].id);
        assert_eq!(a.ward_committee.as_deref(), Some("A2"));
        assert_eq!(a.pole_image.as_deref(), Some(first_photo.as_str()));
        assert_eq!(a.date, before.responses[0].date);

        assert_eq!(b.id, before.responses[1].id);
        assert_eq!(b.ward_committee.as_deref(), Some("B"));
        assert_eq!(b.pole.pole_name.as_deref(), Some("Steel"));
        assert_eq!(b.pole.bracket.as_deref(), Some("L"));
        assert_eq!(b.pole_image.as_deref(), Some("poleImage_C1_1.png"));
        assert!(test_support::uploaded(&state, "poleImage_C1_1.png"));
        assert!(test_support::uploaded(&state, &first_photo));
    }

    #[test]
    fn replacing_pole_photo_deletes_previous_one() {
        let (_tmp, state) = test_support::state();
        seed(&state, false);
        let before = add_entry(&state, "A", true);
        let old = before.responses[0].pole_image.clone().unwrap();

        let after = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                responses: Some(vec![ResponseUpdate {
                    pole_image: Some(PIXEL.to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(after.responses[0].pole_image.as_deref(), Some("poleImage_C1_0.png"));
        assert!(!test_support::uploaded(&state, &old));
    }

    #[test]
    fn shorter_array_drops_trailing_entries_and_their_photos() {
        let (_tmp, state) = test_support::state();
        seed(&state, false);
        add_entry(&state, "A", false);
        let before = add_entry(&state, "B", true);
        let dropped_photo = before.responses[1].pole_image.clone().unwrap();

        let after = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                responses: Some(vec![ResponseUpdate::default()]),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(after.responses.len(), 1);
        assert_eq!(after.responses[0], before.responses[0]);
        assert!(!test_support::uploaded(&state, &dropped_photo));
    }

    #[test]
    fn new_trailing_entry_gets_fresh_id_and_stamp() {
        let (_tmp, state) = test_support::state();
        let before = seed(&state, false);
        assert!(before.responses.is_empty());

        let after = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                responses: Some(vec![ResponseUpdate {
                    ward_committee: Some("Q".to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            },
        )
        .unwrap();
        let entry = &after.responses[0];
        assert!(!entry.id.is_empty());
        assert_eq!(entry.consumer_id.as_deref(), Some("C1"));
        assert_eq!(entry.date, "2024-03-15");
    }

    #[test]
    fn keyed_pole_name_never_clobbers_a_shifted_entry() {
        let (_tmp, state) = test_support::state();
        seed(&state, false);
        add_entry(&state, "A", false);
        add_entry(&state, "B", false);
        add_entry(&state, "C", false);

        // Give entry 2 a keyed photo, then remove entry 1 so it shifts to index 1.
        let with_photo = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                responses: Some(vec![
                    ResponseUpdate::default(),
                    ResponseUpdate::default(),
                    ResponseUpdate {
                        pole_image: Some(PIXEL.to_string()),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(with_photo.responses[2].pole_image.as_deref(), Some("poleImage_C1_2.png"));
        let shifted = remove_response(&state, "C1", &with_photo.responses[1].id).unwrap();
        assert_eq!(shifted.responses[1].pole_image.as_deref(), Some("poleImage_C1_2.png"));

        // A new third entry with a photo must not reuse poleImage_C1_2.
        let after = reconcile(
            &state,
            "C1",
            UpdateApplicationRequest {
                responses: Some(vec![
                    ResponseUpdate::default(),
                    ResponseUpdate::default(),
                    ResponseUpdate {
                        pole_image: Some(PIXEL.to_string()),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(after.responses[1].pole_image.as_deref(), Some("poleImage_C1_2.png"));
        let third = after.responses[2].pole_image.clone().unwrap();
        assert_ne!(third, "poleImage_C1_2.png");
        assert!(test_support::uploaded(&state, "poleImage_C1_2.png"));
        assert!(test_support::uploaded(&state, &third));
    }

    #[test]
    fn unsafe_consumer_ids_get_random_names() {
        assert_eq!(keyed("meterImage_a/b".to_string()), ImageName::Random);
        assert_eq!(
            keyed("meterImage_C1".to_string()),
            ImageName::Keyed("meterImage_C1".to_string())
        );
    }
}
