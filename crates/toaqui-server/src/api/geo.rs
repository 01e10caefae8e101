//! Geography lookups backed by third-party providers.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::Response,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use toaqui_core::validate_coordinates;
use toaqui_geo::{locate_ip, IpLocation, Location, LocationSuggestion};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::middleware::{client_ip, RequestId};

use super::{map_geo_error, split_csv, ApiError, ApiResponse, AppState};

const LOOKUP_CACHE: &str = "public, max-age=300";
const SHORT_CACHE: &str = "public, max-age=60";
/// Answers that depend on who is asking must not be shared by proxies.
const CALLER_CACHE: &str = "private, max-age=60";
const MIN_SUGGEST_QUERY_CHARS: usize = 2;
const DEFAULT_SUGGEST_LIMIT: usize = 5;
const MAX_SUGGEST_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub(super) struct CitiesQuery {
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SuggestQuery {
    pub query: Option<String>,
    pub limit: Option<usize>,
    pub country_code: Option<String>,
    /// Comma-separated, e.g. `city,town`.
    pub place_types: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct IpLocationItem {
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<IpLocation> for IpLocationItem {
    fn from(location: IpLocation) -> Self {
        Self {
            country: location.country,
            city: location.city,
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CityItem {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct LocationSuggestions {
    pub suggestions: Vec<LocationSuggestion>,
    pub query: String,
}

/// `Cache-Control` on successful responses only.
fn cache_for(
    directive: &'static str,
) -> SetResponseHeaderLayer<impl Fn(&Response) -> Option<HeaderValue> + Clone + Send + Sync + 'static>
{
    SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, move |res: &Response| {
        res.status()
            .is_success()
            .then(|| HeaderValue::from_static(directive))
    })
}

pub(super) fn router() -> Router<AppState> {
    let lookups = Router::new()
        .route("/api/v1/geo/city/{city}", get(search_cities))
        .route("/api/v1/geo/ip/{ip}", get(get_ip_location))
        .route(
            "/api/v1/geo/city/lat/{lat}/long/{lng}",
            get(get_city_by_coordinates),
        )
        .route(
            "/api/v1/geo/coordinates/city/{city}",
            get(get_coordinates_by_city),
        )
        .route_layer(cache_for(LOOKUP_CACHE));

    let short_lived = Router::new()
        .route("/api/v1/geo/suggest", get(suggest_locations))
        .route_layer(cache_for(SHORT_CACHE));

    let per_caller = Router::new()
        .route("/api/v1/geo/ip-location", get(get_caller_location))
        .route_layer(cache_for(CALLER_CACHE));

    lookups.merge(short_lived).merge(per_caller)
}

async fn search_cities(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(city): Path<String>,
    Query(query): Query<CitiesQuery>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let cities = state
        .geo
        .countries_now
        .search_cities(&city, query.country.as_deref().unwrap_or_default())
        .await
        .map_err(|e| map_geo_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(req_id.0, cities))
}

async fn get_ip_location(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(ip): Path<String>,
) -> Result<Json<ApiResponse<IpLocationItem>>, ApiError> {
    let location = locate_ip(&state.geo.ip_location, &state.geo.nominatim, Some(&ip))
        .await
        .map_err(|e| map_geo_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(req_id.0, location.into()))
}

async fn get_caller_location(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<IpLocationItem>>, ApiError> {
    let ip = client_ip(addr.ip(), &headers);
    tracing::debug!(client_ip = %ip, "resolving caller location");

    let location = locate_ip(&state.geo.ip_location, &state.geo.nominatim, Some(&ip))
        .await
        .map_err(|e| map_geo_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(req_id.0, location.into()))
}

async fn get_city_by_coordinates(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((lat, lng)): Path<(f64, f64)>,
) -> Result<Json<ApiResponse<CityItem>>, ApiError> {
    validate_coordinates(lat, lng)
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let city = state
        .geo
        .nominatim
        .reverse_city(lat, lng)
        .await
        .map_err(|e| map_geo_error(req_id.0.clone(), &e))?;

    match city {
        Some(name) => Ok(ApiResponse::new(req_id.0, CityItem { name })),
        None => Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("no city found at {lat}, {lng}"),
        )),
    }
}

async fn get_coordinates_by_city(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(city): Path<String>,
) -> Result<Json<ApiResponse<Location>>, ApiError> {
    let location = state
        .geo
        .nominatim
        .coordinates_by_city(&city)
        .await
        .map_err(|e| map_geo_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(req_id.0, location))
}

async fn suggest_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SuggestQuery>,
) -> Json<ApiResponse<LocationSuggestions>> {
    let query = params.query.unwrap_or_default();
    if query.trim().chars().count() < MIN_SUGGEST_QUERY_CHARS {
        return ApiResponse::new(
            req_id.0,
            LocationSuggestions {
                suggestions: Vec::new(),
                query,
            },
        );
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_SUGGEST_LIMIT)
        .clamp(1, MAX_SUGGEST_LIMIT);
    let place_types = split_csv(params.place_types.as_deref());
    let suggestions = state
        .geo
        .nominatim
        .suggest_locations(&query, limit, params.country_code.as_deref(), &place_types)
        .await;

    ApiResponse::new(req_id.0, LocationSuggestions { suggestions, query })
}
