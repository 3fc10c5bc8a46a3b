use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::tracker::{TrackPhase, TrackState, TrackerStatus};
use crate::web::server::AppState;

/// Pointing and tuning of the current target as of the last cycle.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackerSample {
    pub satellite: String,
    pub phase: TrackPhase,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_rate_km_s: f64,
    pub frequency_hz: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl TrackerSample {
    fn from_state(state: &TrackState) -> Option<Self> {
        let look = state.pointing?;
        Some(TrackerSample {
            satellite: state.selected.clone()?,
            phase: state.phase,
            azimuth_deg: look.azimuth_deg,
            elevation_deg: look.elevation_deg,
            range_rate_km_s: state.range_rate_km_s?,
            frequency_hz: state.frequency_hz,
            timestamp: state.updated_at,
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/tracker/status",
    responses(
        (status = 200, description = "Full tracker status", body = TrackerStatus)
    ),
    tag = "tracker"
)]
pub async fn status(State(state): State<AppState>) -> Json<TrackerStatus> {
    Json(state.status.snapshot())
}

#[utoipa::path(
    get,
    path = "/api/tracker/status/sample",
    responses(
        (status = 200, description = "Tracker sample", body = Option<TrackerSample>)
    ),
    tag = "tracker"
)]
pub async fn status_sample(State(state): State<AppState>) -> Json<Option<TrackerSample>> {
    Json(TrackerSample::from_state(&state.status.snapshot().state))
}
