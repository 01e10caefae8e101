//! Nominatim (OpenStreetMap) forward/reverse geocoding client.

use reqwest::{Client, Url};

use crate::error::GeoError;
use crate::http::{build_client, build_url, get_json, normalise_base_url};
use crate::types::{
    Location, LocationSuggestion, NominatimAddress, NominatimPlace, NominatimReverse,
};

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/";
const UNKNOWN_LOCATION: &str = "Unknown Location";
const DEFAULT_FEATURE_TYPES: &str = "city,town,village";
const POPULATED_PLACE_TYPES: [&str; 5] = ["city", "town", "village", "municipality", "hamlet"];

/// Client for the Nominatim search and reverse endpoints.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: Url,
}

impl NominatimClient {
    /// Create a client against the public Nominatim instance.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, GeoError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs, user_agent)
    }

    /// Create a client against a custom base URL (self-hosted instance or test mock).
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidBaseUrl`] if `base_url` does not parse, or
    /// [`GeoError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, GeoError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            base_url: normalise_base_url(base_url)?,
        })
    }

    /// Geocode a free-text place name to its best match.
    ///
    /// # Errors
    ///
    /// - [`GeoError::InvalidInput`] if `name` is blank
    /// - [`GeoError::NotFound`] if the provider returns no results
    /// - [`GeoError::UnexpectedStatus`], [`GeoError::Http`] or
    ///   [`GeoError::Deserialize`] on provider failure
    pub async fn coordinates_by_city(&self, name: &str) -> Result<Location, GeoError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GeoError::InvalidInput("city name is required".to_string()));
        }

        tracing::info!(city = %name, "geocoding city");
        let url = build_url(
            &self.base_url,
            "search",
            &[
                ("q", name),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ],
        )?;
        let places: Vec<NominatimPlace> = get_json(&self.client, &url, "nominatim search").await?;

        let place = places.into_iter().next().ok_or_else(|| {
            tracing::warn!(city = %name, "no geocoding results");
            GeoError::NotFound(format!("no coordinates found for city: {name}"))
        })?;

        Ok(Location {
            latitude: place.lat,
            longitude: place.lon,
            display_name: format_display_name(place.address.as_ref(), &place.display_name),
        })
    }

    /// Type-ahead place suggestions.
    ///
    /// Never fails: provider errors are logged and yield an empty list.
    pub async fn suggest_locations(
        &self,
        query: &str,
        limit: usize,
        country_code: Option<&str>,
        place_types: &[String],
    ) -> Vec<LocationSuggestion> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }
        let country_code = country_code
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase);

        match self
            .fetch_suggestions(query, limit, country_code.as_deref(), place_types)
            .await
        {
            Ok(places) => refine_suggestions(places, limit, country_code.as_deref(), place_types),
            Err(e) => {
                tracing::error!(query = %query, error = %e, "location suggestion lookup failed");
                Vec::new()
            }
        }
    }

    async fn fetch_suggestions(
        &self,
        query: &str,
        limit: usize,
        country_code: Option<&str>,
        place_types: &[String],
    ) -> Result<Vec<NominatimPlace>, GeoError> {
        let fetch_limit = limit.saturating_mul(3).to_string();
        let features = feature_types(place_types);
        let mut params = vec![
            ("q", query),
            ("format", "json"),
            ("addressdetails", "1"),
            ("limit", fetch_limit.as_str()),
            ("featureType", features.as_str()),
            ("class", "place"),
        ];
        if let Some(code) = country_code {
            params.push(("countrycodes", code));
        }

        tracing::info!(query = %query, country_code = ?country_code, "searching location suggestions");
        let url = build_url(&self.base_url, "search", &params)?;
        get_json(&self.client, &url, "nominatim suggestions").await
    }

    /// Reverse-geocode coordinates to the containing city name.
    ///
    /// Returns `Ok(None)` when the provider answers with a non-success status
    /// or the address carries no city-like field.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Http`] on transport failure or
    /// [`GeoError::Deserialize`] if the body is not valid JSON.
    pub async fn reverse_city(&self, latitude: f64, longitude: f64) -> Result<Option<String>, GeoError> {
        let lat = latitude.to_string();
        let lon = longitude.to_string();
        let url = build_url(
            &self.base_url,
            "reverse",
            &[
                ("format", "json"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("addressdetails", "1"),
            ],
        )?;

        tracing::info!(latitude, longitude, "reverse geocoding");
        let reverse: NominatimReverse =
            match get_json(&self.client, &url, "nominatim reverse").await {
                Ok(body) => body,
                Err(GeoError::UnexpectedStatus { status, .. }) => {
                    tracing::warn!(status, latitude, longitude, "reverse geocoding rejected");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

        let city = reverse.address.and_then(|a| {
            [a.city, a.town, a.village, a.municipality]
                .into_iter()
                .flatten()
                .find(|name| !name.trim().is_empty())
        });
        if city.is_none() {
            tracing::warn!(latitude, longitude, "no city for coordinates");
        }
        Ok(city)
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// "City, State, Country" from the most specific address part, falling back
/// to the provider's own display name.
fn format_display_name(address: Option<&NominatimAddress>, fallback: &str) -> String {
    let fallback = if fallback.trim().is_empty() {
        UNKNOWN_LOCATION
    } else {
        fallback
    };
    let Some(address) = address else {
        return fallback.to_string();
    };

    let place = [
        &address.city,
        &address.town,
        &address.village,
        &address.suburb,
        &address.neighbourhood,
        &address.county,
    ]
    .into_iter()
    .flatten()
    .find(|s| !s.trim().is_empty());
    let Some(place) = place else {
        return fallback.to_string();
    };

    let mut parts = vec![place.as_str()];
    parts.extend(
        [&address.state, &address.country]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty()),
    );
    parts.join(", ")
}

fn is_populated_place(kind: &str) -> bool {
    let kind = kind.trim();
    POPULATED_PLACE_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(kind))
}

/// `featureType` parameter: the caller's valid place types, else the default.
fn feature_types(place_types: &[String]) -> String {
    let valid: Vec<String> = place_types
        .iter()
        .filter(|t| is_populated_place(t))
        .map(|t| t.trim().to_lowercase())
        .collect();
    if valid.is_empty() {
        DEFAULT_FEATURE_TYPES.to_string()
    } else {
        valid.join(",")
    }
}

fn place_type_rank(kind: &str) -> u8 {
    match kind.to_lowercase().as_str() {
        "city" => 1,
        "municipality" => 2,
        "town" => 3,
        "village" => 4,
        "hamlet" => 5,
        _ => 99,
    }
}

fn to_suggestion(place: NominatimPlace) -> LocationSuggestion {
    let display_name = format_display_name(place.address.as_ref(), &place.display_name);
    let country_code = place
        .address
        .and_then(|a| a.country_code)
        .unwrap_or_default();
    LocationSuggestion {
        id: place.place_id,
        display_name,
        place_type: place.place_type,
        latitude: place.lat,
        longitude: place.lon,
        country_code,
        address_type: place.address_type,
    }
}

fn matches_filters(
    suggestion: &LocationSuggestion,
    country_code: Option<&str>,
    place_types: &[String],
) -> bool {
    let type_ok = place_types.is_empty()
        || place_types
            .iter()
            .any(|t| t.trim().eq_ignore_ascii_case(&suggestion.place_type))
        || (suggestion.place_type.eq_ignore_ascii_case("administrative")
            && is_populated_place(&suggestion.address_type));
    let country_ok = country_code.is_none_or(|c| suggestion.country_code.eq_ignore_ascii_case(c));
    type_ok && country_ok
}

/// Key grouping near-identical places: first display-name segment plus
/// coordinates rounded to three decimals.
fn dedupe_key(suggestion: &LocationSuggestion) -> (String, i64, i64) {
    let name = suggestion
        .display_name
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    #[allow(clippy::cast_possible_truncation)]
    let round = |v: f64| (v * 1000.0).round() as i64;
    (name, round(suggestion.latitude), round(suggestion.longitude))
}

/// Pick one representative per group: the first non-administrative place,
/// else the first with a `city` address type, else the first.
fn best_of(group: Vec<LocationSuggestion>) -> Option<LocationSuggestion> {
    let non_admin = group
        .iter()
        .position(|s| !s.place_type.eq_ignore_ascii_case("administrative"));
    let city = group
        .iter()
        .position(|s| s.address_type.eq_ignore_ascii_case("city"));
    let index = non_admin.or(city).unwrap_or(0);
    group.into_iter().nth(index)
}

fn refine_suggestions(
    places: Vec<NominatimPlace>,
    limit: usize,
    country_code: Option<&str>,
    place_types: &[String],
) -> Vec<LocationSuggestion> {
    let mut suggestions: Vec<LocationSuggestion> = places
        .into_iter()
        .filter(|p| p.lat != 0.0 && p.lon != 0.0)
        .map(to_suggestion)
        .filter(|s| matches_filters(s, country_code, place_types))
        .filter(|s| s.display_name != UNKNOWN_LOCATION)
        .collect();
    // Stable sort keeps provider relevance order within a rank.
    suggestions.sort_by_key(|s| place_type_rank(&s.place_type));

    let mut groups: Vec<((String, i64, i64), Vec<LocationSuggestion>)> = Vec::new();
    for suggestion in suggestions {
        let key = dedupe_key(&suggestion);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(suggestion),
            None => groups.push((key, vec![suggestion])),
        }
    }

    groups
        .into_iter()
        .filter_map(|(_, members)| best_of(members))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(city: Option<&str>, state: &str, country: &str, code: &str) -> NominatimAddress {
        NominatimAddress {
            city: city.map(str::to_string),
            state: Some(state.to_string()),
            country: Some(country.to_string()),
            country_code: Some(code.to_string()),
            ..NominatimAddress::default()
        }
    }

    fn place(id: &str, kind: &str, address_type: &str, lat: f64, lon: f64) -> NominatimPlace {
        NominatimPlace {
            place_id: id.to_string(),
            lat,
            lon,
            display_name: format!("Place {id}"),
            place_type: kind.to_string(),
            address_type: address_type.to_string(),
            address: Some(address(Some("Campinas"), "São Paulo", "Brasil", "br")),
        }
    }

    #[test]
    fn display_name_prefers_city_state_country() {
        let addr = address(Some("Campinas"), "São Paulo", "Brasil", "br");
        assert_eq!(
            format_display_name(Some(&addr), "ignored"),
            "Campinas, São Paulo, Brasil"
        );
    }

    #[test]
    fn display_name_falls_back_through_town_and_suburb() {
        let addr = NominatimAddress {
            suburb: Some("Pinheiros".to_string()),
            country: Some("Brasil".to_string()),
            ..NominatimAddress::default()
        };
        assert_eq!(format_display_name(Some(&addr), "x"), "Pinheiros, Brasil");
    }

    #[test]
    fn display_name_uses_fallback_then_unknown() {
        let empty = NominatimAddress::default();
        assert_eq!(format_display_name(Some(&empty), "Raw Name"), "Raw Name");
        assert_eq!(format_display_name(None, "  "), UNKNOWN_LOCATION);
    }

    #[test]
    fn feature_types_keeps_only_populated_places() {
        assert_eq!(feature_types(&[]), DEFAULT_FEATURE_TYPES);
        assert_eq!(
            feature_types(&["Town".to_string(), "airport".to_string()]),
            "town"
        );
        assert_eq!(feature_types(&["airport".to_string()]), DEFAULT_FEATURE_TYPES);
    }

    #[test]
    fn refine_ranks_cities_before_villages() {
        let places = vec![
            place("1", "village", "village", -22.0, -47.0),
            place("2", "city", "city", -22.9, -47.06),
        ];
        let out = refine_suggestions(places, 5, None, &[]);
        let ids: Vec<&str> = out.iter().map(|s| s.id.as_str()).collect();
        // Both share the display name "Campinas" but differ in location.
        assert_eq!(ids, ["2", "1"]);
    }

    #[test]
    fn refine_collapses_duplicates_preferring_non_administrative() {
        let places = vec![
            place("admin", "administrative", "city", -22.9056, -47.0608),
            place("node", "city", "city", -22.90561, -47.06081),
        ];
        let out = refine_suggestions(places, 5, None, &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "node");
    }

    #[test]
    fn refine_prefers_city_address_type_among_administrative() {
        let group = vec![
            LocationSuggestion {
                id: "muni".to_string(),
                display_name: "Campinas".to_string(),
                place_type: "administrative".to_string(),
                latitude: 1.0,
                longitude: 1.0,
                country_code: "br".to_string(),
                address_type: "municipality".to_string(),
            },
            LocationSuggestion {
                id: "city".to_string(),
                display_name: "Campinas".to_string(),
                place_type: "administrative".to_string(),
                latitude: 1.0,
                longitude: 1.0,
                country_code: "br".to_string(),
                address_type: "city".to_string(),
            },
        ];
        assert_eq!(best_of(group).unwrap().id, "city");
    }

    #[test]
    fn refine_filters_place_type_country_and_zero_coordinates() {
        let mut foreign = place("pt", "city", "city", 38.7, -9.1);
        foreign.address = Some(address(Some("Lisboa"), "Lisboa", "Portugal", "pt"));
        let places = vec![
            place("zero", "city", "city", 0.0, -47.0),
            place("suburb", "suburb", "suburb", -23.0, -46.0),
            place("admin", "administrative", "town", -23.5, -46.5),
            foreign,
        ];
        let types = ["city".to_string()];
        let out = refine_suggestions(places, 5, Some("br"), &types);
        let ids: Vec<&str> = out.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["admin"]);
    }

    #[test]
    fn refine_truncates_to_limit() {
        let places = (0..6)
            .map(|i| place(&i.to_string(), "city", "city", -20.0 - f64::from(i), -45.0))
            .collect();
        assert_eq!(refine_suggestions(places, 2, None, &[]).len(), 2);
    }
}
