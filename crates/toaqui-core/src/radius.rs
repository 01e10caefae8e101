use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

const METERS_PER_KILOMETER: f64 = 1000.0;
const METERS_PER_MILE: f64 = 1609.0;

/// Distance unit accepted for search radii.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadiusUnit {
    #[serde(rename = "km")]
    Kilometers,
    #[serde(rename = "mi")]
    Miles,
}

impl RadiusUnit {
    #[must_use]
    pub fn meters_per_unit(self) -> f64 {
        match self {
            RadiusUnit::Kilometers => METERS_PER_KILOMETER,
            RadiusUnit::Miles => METERS_PER_MILE,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RadiusUnit::Kilometers => "km",
            RadiusUnit::Miles => "mi",
        }
    }
}

impl std::fmt::Display for RadiusUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RadiusUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "km" => Ok(RadiusUnit::Kilometers),
            "mi" => Ok(RadiusUnit::Miles),
            _ => Err(CoreError::InvalidRadiusUnit(s.to_string())),
        }
    }
}

/// Convert a radius in `unit` to meters.
///
/// The unit is matched case-insensitively; a mile is 1609 m.
///
/// # Errors
///
/// Returns [`CoreError::InvalidRadiusUnit`] for anything other than `km`/`mi`
/// and [`CoreError::InvalidRadius`] when `radius` is not a positive finite number.
pub fn convert_radius_to_meters(radius: f64, unit: &str) -> Result<f64, CoreError> {
    let unit: RadiusUnit = unit.parse()?;
    if !radius.is_finite() || radius <= 0.0 {
        return Err(CoreError::InvalidRadius(radius));
    }
    Ok(radius * unit.meters_per_unit())
}

/// Reject coordinates outside the WGS84 range.
///
/// # Errors
///
/// Returns [`CoreError::InvalidCoordinates`] when either component is out of
/// range or not finite.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), CoreError> {
    let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
    let lng_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
    if lat_ok && lng_ok {
        Ok(())
    } else {
        Err(CoreError::InvalidCoordinates {
            latitude,
            longitude,
        })
    }
}
