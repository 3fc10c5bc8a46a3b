use axum::{
    extract::{Path, State},
    Json,
};

use crate::catalog::defaults::canonical_name;
use crate::catalog::SatelliteSummary;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[utoipa::path(
    get,
    path = "/api/satellites",
    responses(
        (status = 200, description = "Tracked satellites in registration order", body = Vec<SatelliteSummary>)
    ),
    tag = "satellites"
)]
pub async fn list_satellites(State(state): State<AppState>) -> Json<Vec<SatelliteSummary>> {
    Json(state.status.snapshot().satellites)
}

#[utoipa::path(
    get,
    path = "/api/satellites/{name}",
    params(
        ("name" = String, Path, description = "Satellite name or alias")
    ),
    responses(
        (status = 200, description = "Tracked satellite", body = SatelliteSummary),
        (status = 404, description = "Not tracked", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn get_satellite(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<SatelliteSummary>> {
    let wanted = canonical_name(&name);
    state
        .status
        .snapshot()
        .satellites
        .into_iter()
        .find(|s| s.name == wanted)
        .map(Json)
        .ok_or(ApiError::NotFound("satellite_not_tracked"))
}
