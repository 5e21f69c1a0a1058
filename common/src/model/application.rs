use crate::model::lenient;
use crate::model::response::ResponseRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A meter-installation application, the top-level stored document.
///
/// `ConsumerID` is the externally supplied business key and `ApplicationID` the
/// generated system key; both are unique across the store. Image fields hold
/// file names inside the image store, never paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    #[serde(rename = "ApplicationID")]
    pub application_id: String,
    #[serde(rename = "ConsumerID")]
    pub consumer_id: String,
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
    #[serde(rename = "MeterImageData", default)]
    pub meter_image: Option<String>,
    #[serde(rename = "TimerPanelImage", default)]
    pub timer_panel_image: Option<String>,
    /// `YYYY-MM-DD` in the service's record timezone.
    #[serde(rename = "Date", default)]
    pub date: String,
    /// `HH:mm:ss` in the service's record timezone.
    #[serde(rename = "Time", default)]
    pub time: String,
    /// Survey entries in insertion order.
    #[serde(rename = "Response", default)]
    pub responses: Vec<ResponseRecord>,
}

impl ApplicationRecord {
    /// Schema checks applied on every write.
    pub fn validate(&self) -> Result<(), String> {
        if self.consumer_id.trim().is_empty() {
            return Err("ConsumerID is required".to_string());
        }
        if self.application_id.trim().is_empty() {
            return Err("ApplicationID is required".to_string());
        }
        check_coordinates("Meter", self.meter_latitude, self.meter_longitude)?;
        check_file_name("MeterImageData", self.meter_image.as_deref())?;
        check_file_name("TimerPanelImage", self.timer_panel_image.as_deref())?;

        let mut seen = HashSet::new();
        for (index, response) in self.responses.iter().enumerate() {
            if response.id.trim().is_empty() {
                return Err(format!("Response[{}] is missing its _id", index));
            }
            if !seen.insert(response.id.as_str()) {
                return Err(format!("Response _id '{}' is not unique", response.id));
            }
            check_coordinates("Pole", response.pole_latitude, response.pole_longitude)
                .map_err(|e| format!("Response[{}]: {}", index, e))?;
            check_file_name("PoleImageData", response.pole_image.as_deref())
                .map_err(|e| format!("Response[{}]: {}", index, e))?;
        }
        Ok(())
    }

    /// Every image file name referenced by the record, sub-records included.
    pub fn image_references(&self) -> HashSet<&str> {
        self.meter_image
            .iter()
            .chain(self.timer_panel_image.iter())
            .chain(self.responses.iter().filter_map(|r| r.pole_image.as_ref()))
            .map(String::as_str)
            .collect()
    }
}

fn check_coordinates(prefix: &str, latitude: Option<f64>, longitude: Option<f64>) -> Result<(), String> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!("{}Latitude {} is out of range", prefix, lat));
        }
    }
    if let Some(lon) = longitude {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(format!("{}Longitude {} is out of range", prefix, lon));
        }
    }
    Ok(())
}

fn check_file_name(field: &str, name: Option<&str>) -> Result<(), String> {
    match name {
        Some(n) if n.is_empty() || n.contains(['/', '\\']) || n == "." || n == ".." => {
            Err(format!("{} must be a bare file name", field))
        }
        _ => Ok(()),
    }
}
