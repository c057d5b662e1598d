use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Mission target being edited on the configuration panel.
///
/// Values are only required to be numeric; no range checks are applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigDraft {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
}

impl Default for ConfigDraft {
    fn default() -> Self {
        Self { latitude: 37.7749, longitude: -122.4194, altitude_m: 50.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Latitude,
    Longitude,
    Altitude,
}

#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    #[error("unknown config field: {0}")]
    UnknownField(String),
    #[error("{field:?} must be numeric, got {value:?}")]
    NotNumeric { field: DraftField, value: String },
}

impl FromStr for DraftField {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latitude" | "lat" => Ok(DraftField::Latitude),
            "longitude" | "lon" => Ok(DraftField::Longitude),
            "altitude" | "alt" => Ok(DraftField::Altitude),
            other => Err(DraftError::UnknownField(other.to_string())),
        }
    }
}

impl ConfigDraft {
    /// Overwrite one field from raw form input. The draft is left untouched on error.
    pub fn set(&mut self, field: DraftField, raw: &str) -> Result<(), DraftError> {
        let value: f64 = raw
            .trim()
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| DraftError::NotNumeric { field, value: raw.to_string() })?;
        match field {
            DraftField::Latitude => self.latitude = value,
            DraftField::Longitude => self.longitude = value,
            DraftField::Altitude => self.altitude_m = value,
        }
        Ok(())
    }
}
