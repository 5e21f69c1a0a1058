//! Request bodies accepted by the applications API.
//!
//! Image fields carry base64 data, optionally prefixed with a
//! `data:image/<ext>;base64,` header. Everything else decodes leniently, see
//! [`crate::model::lenient`].

use crate::model::lenient;
use crate::model::response::{CableDescriptor, LightDescriptor, PoleDescriptor};
use serde::Deserialize;

/// Body of `POST /api/applications`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateApplicationRequest {
    #[serde(rename = "ConsumerID", default, deserialize_with = "lenient::opt_string")]
    pub consumer_id: Option<String>,
    #[serde(rename = "WardCommittee", default, deserialize_with = "lenient::opt_string")]
    pub ward_committee: Option<String>,
    #[serde(rename = "NewMeterNumber", default, deserialize_with = "lenient::opt_string")]
    pub new_meter_number: Option<String>,
    #[serde(rename = "Purpose", default, deserialize_with = "lenient::opt_string")]
    pub purpose: Option<String>,
    #[serde(rename = "Type", default, deserialize_with = "lenient::opt_string")]
    pub kind: Option<String>,
    #[serde(rename = "Address", default, deserialize_with = "lenient::opt_string")]
    pub address: Option<String>,
    #[serde(rename = "MeterLatitude", default, deserialize_with = "lenient::opt_f64")]
    pub meter_latitude: Option<f64>,
    #[serde(rename = "MeterLongitude", default, deserialize_with = "lenient::opt_f64")]
    pub meter_longitude: Option<f64>,
    #[serde(rename = "SanctionLoad", default, deserialize_with = "lenient::opt_string")]
    pub sanction_load: Option<String>,
    #[serde(rename = "TimerPanel", default, deserialize_with = "lenient::opt_bool")]
    pub timer_panel: Option<bool>,
    #[serde(rename = "MeterImage", default, deserialize_with = "lenient::opt_string")]
    pub meter_image: Option<String>,
    #[serde(rename = "TimerPanelImage", default, deserialize_with = "lenient::opt_string")]
    pub timer_panel_image: Option<String>,
}

/// Body of `POST /api/applications/{consumer_id}/responses`.
///
/// The survey form posts the nested descriptors flattened.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddResponseRequest {
    #[serde(rename = "WardCommittee", default, deserialize_with = "lenient::opt_string")]
    pub ward_committee: Option<String>,
    #[serde(rename = "PoleName", default, deserialize_with = "lenient::opt_string")]
    pub pole_name: Option<String>,
    #[serde(rename = "HightofPole", default, deserialize_with = "lenient::opt_string")]
    pub height_of_pole: Option<String>,
    #[serde(rename = "TypeofBracket", default, deserialize_with = "lenient::opt_string")]
    pub type_of_bracket: Option<String>,
    #[serde(rename = "Bracket", default, deserialize_with = "lenient::opt_string")]
    pub bracket: Option<String>,
    #[serde(rename = "NumberLight", default, deserialize_with = "lenient::opt_u32")]
    pub number_light: Option<u32>,
    #[serde(rename = "LightName", default, deserialize_with = "lenient::opt_string")]
    pub light_name: Option<String>,
    #[serde(rename = "Watts", default, deserialize_with = "lenient::opt_string")]
    pub watts: Option<String>,
    #[serde(rename = "PoleLatitude", default, deserialize_with = "lenient::opt_f64")]
    pub pole_latitude: Option<f64>,
    #[serde(rename = "PoleLongitude", default, deserialize_with = "lenient::opt_f64")]
    pub pole_longitude: Option<f64>,
    #[serde(rename = "CableType", default, deserialize_with = "lenient::opt_string")]
    pub cable_type: Option<String>,
    #[serde(rename = "SubTypeName", default, deserialize_with = "lenient::opt_string")]
    pub sub_type_name: Option<String>,
    #[serde(rename = "CableWatts", default, deserialize_with = "lenient::opt_string")]
    pub cable_watts: Option<String>,
    #[serde(rename = "PoleImage", default, deserialize_with = "lenient::opt_string")]
    pub pole_image: Option<String>,
}

impl AddResponseRequest {
    pub fn pole(&self) -> PoleDescriptor {
        PoleDescriptor {
            pole_name: self.pole_name.clone(),
            height_of_pole: self.height_of_pole.clone(),
            type_of_bracket: self.type_of_bracket.clone(),
            bracket: self.bracket.clone(),
        }
    }

    pub fn light(&self) -> LightDescriptor {
        LightDescriptor {
            light_name: self.light_name.clone(),
            watts: self.watts.clone(),
        }
    }

    pub fn cable(&self) -> CableDescriptor {
        CableDescriptor {
            cable_type: self.cable_type.clone(),
            sub_type_name: self.sub_type_name.clone(),
            cable_watts: self.cable_watts.clone(),
        }
    }
}

/// Body of `PUT /api/applications/{consumer_id}`.
///
/// Every field is optional; an absent field keeps the stored value. The image
/// fields take new base64 data, or the currently stored file name, which is
/// treated the same as leaving the field out. `ConsumerID`, `ApplicationID`,
/// `Date` and `Time` cannot be changed and are ignored if present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateApplicationRequest {
    #[serde(rename = "WardCommittee", default, deserialize_with = "lenient::opt_string")]
    pub ward_committee: Option<String>,
    #[serde(rename = "NewMeterNumber", default, deserialize_with = "lenient::opt_string")]
    pub new_meter_number: Option<String>,
    #[serde(rename = "Purpose", default, deserialize_with = "lenient::opt_string")]
    pub purpose: Option<String>,
    #[serde(rename = "Type", default, deserialize_with = "lenient::opt_string")]
    pub kind: Option<String>,
    #[serde(rename = "Address", default, deserialize_with = "lenient::opt_string")]
    pub address: Option<String>,
    #[serde(rename = "MeterLatitude", default, deserialize_with = "lenient::opt_f64")]
    pub meter_latitude: Option<f64>,
    #[serde(rename = "MeterLongitude", default, deserialize_with = "lenient::opt_f64")]
    pub meter_longitude: Option<f64>,
    #[serde(rename = "SanctionLoad", default, deserialize_with = "lenient::opt_string")]
    pub sanction_load: Option<String>,
    #[serde(rename = "TimerPanel", default, deserialize_with = "lenient::opt_bool")]
    pub timer_panel: Option<bool>,
    #[serde(rename = "MeterImageData", default, deserialize_with = "lenient::opt_string")]
    pub meter_image: Option<String>,
    #[serde(rename = "TimerPanelImage", default, deserialize_with = "lenient::opt_string")]
    pub timer_panel_image: Option<String>,
    /// Replaces the stored sequence. Entry `i` is matched with stored entry `i`.
    #[serde(rename = "Response", default)]
    pub responses: Option<Vec<ResponseUpdate>>,
}

/// One entry of an update's `Response` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseUpdate {
    #[serde(rename = "_id", default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(rename = "WardCommittee", default, deserialize_with = "lenient::opt_string")]
    pub ward_committee: Option<String>,
    #[serde(rename = "TypeofPole", default)]
    pub pole: Option<PoleDescriptor>,
    #[serde(rename = "TypeofLight", default)]
    pub light: Option<LightDescriptor>,
    #[serde(rename = "NumberLight", default, deserialize_with = "lenient::opt_u32")]
    pub number_light: Option<u32>,
    #[serde(rename = "PoleLatitude", default, deserialize_with = "lenient::opt_f64")]
    pub pole_latitude: Option<f64>,
    #[serde(rename = "PoleLongitude", default, deserialize_with = "lenient::opt_f64")]
    pub pole_longitude: Option<f64>,
    #[serde(rename = "TypesofCable", default)]
    pub cable: Option<CableDescriptor>,
    #[serde(rename = "PoleImageData", default, deserialize_with = "lenient::opt_string")]
    pub pole_image: Option<String>,
}

/// Query string of `GET /api/applications/month`.
///
/// Both parts are required; they are optional here so the handler can answer
/// a missing one with a JSON error instead of the extractor's plain text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthQuery {
    pub year: Option<String>,
    pub month: Option<String>,
}
