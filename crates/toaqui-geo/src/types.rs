use serde::{Deserialize, Deserializer, Serialize};

/// A geocoded point with a human-readable name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSuggestion {
    pub id: String,
    pub display_name: String,
    pub place_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country_code: String,
    pub address_type: String,
}

/// Approximate location of an IP address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpLocation {
    pub ip: Option<String>,
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// Nominatim wire types
// ---------------------------------------------------------------------------

/// One element of a Nominatim `search` response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NominatimPlace {
    #[serde(default, deserialize_with = "string_or_number")]
    pub place_id: String,
    #[serde(deserialize_with = "f64_from_string_or_number")]
    pub lat: f64,
    #[serde(deserialize_with = "f64_from_string_or_number")]
    pub lon: f64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, rename = "type")]
    pub place_type: String,
    #[serde(default, rename = "addresstype")]
    pub address_type: String,
    #[serde(default)]
    pub address: Option<NominatimAddress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct NominatimAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub municipality: Option<String>,
    pub suburb: Option<String>,
    pub neighbourhood: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

/// Nominatim `reverse` response; `address` is absent when nothing matched.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NominatimReverse {
    #[serde(default)]
    pub address: Option<NominatimAddress>,
}

// ---------------------------------------------------------------------------
// BigDataCloud wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IpGeolocationResponse {
    pub country: IpGeolocationCountry,
    pub location: IpGeolocationLocation,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IpGeolocationCountry {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IpGeolocationLocation {
    #[serde(default)]
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// CountriesNow wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CountriesNowCities {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Vec<String>,
}

// Nominatim encodes coordinates as strings and place ids as numbers.

fn f64_from_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
