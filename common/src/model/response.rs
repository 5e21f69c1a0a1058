use crate::model::lenient;
use serde::{Deserialize, Serialize};

/// One field-survey entry (pole, light and cable inspection) attached to an
/// application record.
///
/// Sub-records live only inside their parent's `Response` sequence. They are
/// created by appending to that sequence and removed by their `_id`; they are
/// never stored on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Sub-identifier, unique within the parent record.
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "WardCommittee", default, deserialize_with = "lenient::opt_string")]
    pub ward_committee: Option<String>,
    /// Business key of the parent, copied on append.
    #[serde(rename = "ConsumerID", default)]
    pub consumer_id: Option<String>,
    #[serde(rename = "TypeofPole", default)]
    pub pole: PoleDescriptor,
    #[serde(rename = "TypeofLight", default)]
    pub light: LightDescriptor,
    #[serde(rename = "NumberLight", default, deserialize_with = "lenient::opt_u32")]
    pub number_light: Option<u32>,
    /// File name in the image store, never a path.
    #[serde(rename = "PoleImageData", default)]
    pub pole_image: Option<String>,
    #[serde(rename = "PoleLatitude", default, deserialize_with = "lenient::opt_f64")]
    pub pole_latitude: Option<f64>,
    #[serde(rename = "PoleLongitude", default, deserialize_with = "lenient::opt_f64")]
    pub pole_longitude: Option<f64>,
    #[serde(rename = "TypesofCable", default)]
    pub cable: CableDescriptor,
    #[serde(rename = "Date", default)]
    pub date: String,
    #[serde(rename = "Time", default)]
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PoleDescriptor {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub pole_name: Option<String>,
    // Spelling is part of the wire format.
    #[serde(rename = "HightofPole", default, deserialize_with = "lenient::opt_string")]
    pub height_of_pole: Option<String>,
    #[serde(rename = "TypeofBracket", default, deserialize_with = "lenient::opt_string")]
    pub type_of_bracket: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub bracket: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LightDescriptor {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub light_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub watts: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CableDescriptor {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub cable_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub sub_type_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub cable_watts: Option<String>,
}

impl PoleDescriptor {
    /// Fields set in `self` win; unset ones fall back to `existing`.
    pub fn merged_over(self, existing: &PoleDescriptor) -> PoleDescriptor {
        PoleDescriptor {
            pole_name: self.pole_name.or_else(|| existing.pole_name.clone()),
            height_of_pole: self.height_of_pole.or_else(|| existing.height_of_pole.clone()),
            type_of_bracket: self.type_of_bracket.or_else(|| existing.type_of_bracket.clone()),
            bracket: self.bracket.or_else(|| existing.bracket.clone()),
        }
    }
}

impl LightDescriptor {
    pub fn merged_over(self, existing: &LightDescriptor) -> LightDescriptor {
        LightDescriptor {
            light_name: self.light_name.or_else(|| existing.light_name.clone()),
            watts: self.watts.or_else(|| existing.watts.clone()),
        }
    }
}

impl CableDescriptor {
    pub fn merged_over(self, existing: &CableDescriptor) -> CableDescriptor {
        CableDescriptor {
            cable_type: self.cable_type.or_else(|| existing.cable_type.clone()),
            sub_type_name: self.sub_type_name.or_else(|| existing.sub_type_name.clone()),
            cable_watts: self.cable_watts.or_else(|| existing.cable_watts.clone()),
        }
    }
}
