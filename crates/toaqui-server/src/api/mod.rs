mod geo;
mod layout;
mod listings;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use toaqui_core::{AppConfig, ListingSearch, SearchError};
use toaqui_db::PgListingStore;
use toaqui_geo::{CountriesNowClient, GeoError, IpLocationClient, NominatimClient};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

/// Third-party geography clients shared by the `/geo` routes.
#[derive(Debug)]
pub struct GeoClients {
    pub nominatim: NominatimClient,
    pub ip_location: IpLocationClient,
    pub countries_now: CountriesNowClient,
}

impl GeoClients {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, GeoError> {
        let timeout = config.http_timeout_secs;
        let ua = config.user_agent.as_str();
        Ok(Self {
            nominatim: NominatimClient::with_base_url(&config.nominatim_base_url, timeout, ua)?,
            ip_location: IpLocationClient::with_base_url(
                &config.big_data_cloud_base_url,
                config.big_data_cloud_api_key.clone(),
                timeout,
                ua,
            )?,
            countries_now: CountriesNowClient::with_base_url(
                &config.countries_now_base_url,
                timeout,
                ua,
            )?,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub listings: Arc<ListingSearch<PgListingStore>>,
    pub geo: Arc<GeoClients>,
}

impl AppState {
    pub fn new(pool: PgPool, geo: GeoClients) -> Self {
        Self {
            listings: Arc::new(ListingSearch::new(PgListingStore::new(pool.clone()))),
            pool,
            geo: Arc::new(geo),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: String, data: T) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_search_error(request_id: String, error: &SearchError<sqlx::Error>) -> ApiError {
    match error {
        SearchError::Invalid(e) => ApiError::new(request_id, "validation_error", e.to_string()),
        SearchError::Store(e) => {
            tracing::error!(error = %e, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

pub(super) fn map_geo_error(request_id: String, error: &GeoError) -> ApiError {
    match error {
        GeoError::NotFound(msg) => ApiError::new(request_id, "not_found", msg.clone()),
        GeoError::InvalidInput(msg) => ApiError::new(request_id, "bad_request", msg.clone()),
        other => {
            tracing::error!(error = %other, "geography provider failed");
            ApiError::new(request_id, "upstream_error", "geography provider failed")
        }
    }
}

/// Split a comma-separated query value, trimming entries and dropping blanks.
pub(super) fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
        .expose_headers([HeaderName::from_static("x-request-id")])
}

fn api_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/listings/geojson",
            get(listings::list_listings_geojson),
        )
        .route("/api/v1/listings/{id}", get(listings::get_listing))
        .route(
            "/api/v1/listings/lat/{lat}/long/{lng}/radius/{radius}/{unit}",
            get(listings::list_listings_legacy),
        )
        .route(
            "/api/v1/listings/lat/{lat}/long/{lng}/radius/{radius}/{unit}/category/{category}",
            get(listings::list_listings_by_category_legacy),
        )
        .route(
            "/api/v1/layout/lat/{lat}/long/{lng}/radius/{radius}/{unit}",
            get(layout::get_location_layout),
        )
        .merge(geo::router())
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(api_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match toaqui_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
#[path = "../api_test.rs"]
mod tests;
