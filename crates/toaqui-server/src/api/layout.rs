use axum::{
    extract::{Path, State},
    Extension, Json,
};
use toaqui_core::{location_layout, LayoutMetadata, DEFAULT_LAYOUT_TITLE};

use crate::middleware::RequestId;

use super::{map_search_error, ApiError, ApiResponse, AppState};

/// Filter options (categories, tags, radii) for the area around a point.
pub(super) async fn get_location_layout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((lat, lng, radius, unit)): Path<(f64, f64, f64, String)>,
) -> Result<Json<ApiResponse<LayoutMetadata>>, ApiError> {
    let layout = location_layout(
        state.listings.store(),
        lat,
        lng,
        radius,
        &unit,
        DEFAULT_LAYOUT_TITLE,
    )
    .await
    .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(req_id.0, layout))
}
