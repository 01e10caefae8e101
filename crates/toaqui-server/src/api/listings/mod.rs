//! Listing search (GeoJSON) and detail routes.

pub(super) mod detail;
pub(super) mod geojson;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use toaqui_core::SearchCriteria;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_search_error, split_csv, ApiError, ApiResponse, AppState};
use detail::ListingDetail;
use geojson::FeatureCollection;

#[derive(Debug, Deserialize)]
pub(super) struct GeoJsonQuery {
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub category: Option<String>,
    pub keyword: Option<String>,
    /// Comma-separated; a listing must carry every tag.
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LegacyQuery {
    pub keyword: Option<String>,
    pub tags: Option<String>,
}

fn default_radius() -> f64 {
    1.0
}

fn default_unit() -> String {
    "km".to_string()
}

async fn search_geojson(
    state: &AppState,
    req_id: String,
    criteria: SearchCriteria,
) -> Result<Json<ApiResponse<FeatureCollection>>, ApiError> {
    let result = state
        .listings
        .search(&criteria)
        .await
        .map_err(|e| map_search_error(req_id.clone(), &e))?;

    Ok(ApiResponse::new(req_id, FeatureCollection::from(result)))
}

pub(super) async fn list_listings_geojson(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<GeoJsonQuery>,
) -> Result<Json<ApiResponse<FeatureCollection>>, ApiError> {
    let criteria = SearchCriteria {
        center_latitude: query.lat,
        center_longitude: query.lng,
        radius: query.radius,
        unit: query.unit,
        category: query.category,
        keyword: query.keyword,
        tags: split_csv(query.tags.as_deref()),
    };
    search_geojson(&state, req_id.0, criteria).await
}

pub(super) async fn list_listings_legacy(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((lat, lng, radius, unit)): Path<(f64, f64, f64, String)>,
    Query(query): Query<LegacyQuery>,
) -> Result<Json<ApiResponse<FeatureCollection>>, ApiError> {
    let criteria = SearchCriteria {
        center_latitude: lat,
        center_longitude: lng,
        radius,
        unit,
        category: None,
        keyword: query.keyword,
        tags: split_csv(query.tags.as_deref()),
    };
    search_geojson(&state, req_id.0, criteria).await
}

pub(super) async fn list_listings_by_category_legacy(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((lat, lng, radius, unit, category)): Path<(f64, f64, f64, String, String)>,
    Query(query): Query<LegacyQuery>,
) -> Result<Json<ApiResponse<FeatureCollection>>, ApiError> {
    let criteria = SearchCriteria {
        center_latitude: lat,
        center_longitude: lng,
        radius,
        unit,
        category: Some(category),
        keyword: query.keyword,
        tags: split_csv(query.tags.as_deref()),
    };
    search_geojson(&state, req_id.0, criteria).await
}

pub(super) async fn get_listing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ListingDetail>>, ApiError> {
    let view = state
        .listings
        .get_by_external_id(id)
        .await
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    let Some(view) = view else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("listing with id {id} not found"),
        ));
    };

    Ok(ApiResponse::new(req_id.0, ListingDetail::from(view)))
}
