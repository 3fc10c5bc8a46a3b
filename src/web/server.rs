use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::tracker::StatusHandle;

use super::api::satellites as satellite_handlers;
use super::api::tracker as tracker_handlers;
use super::api_doc::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub status: StatusHandle,
}

pub fn router(status: StatusHandle) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/tracker/status", get(tracker_handlers::status))
        .route(
            "/api/tracker/status/sample",
            get(tracker_handlers::status_sample),
        )
        .route("/api/satellites", get(satellite_handlers::list_satellites))
        .route(
            "/api/satellites/{name}",
            get(satellite_handlers::get_satellite),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { status })
}

pub async fn run_server(bind_addr: &str, status: StatusHandle) -> std::io::Result<()> {
    log::info!("Starting status server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, router(status)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::catalog::{SatelliteMetadata, SatelliteSummary};
    use crate::predict::LookAngles;
    use crate::tracker::{Directive, TrackPhase, TrackerStatus};

    fn status() -> StatusHandle {
        let mut status = TrackerStatus::new("KNUDSEN", Directive::Track);
        status.state.selected = Some("FIREBIRD 4".into());
        status.state.phase = TrackPhase::InRange;
        status.state.pointing = Some(LookAngles {
            azimuth_deg: 210.5,
            elevation_deg: 12.25,
        });
        status.state.range_rate_km_s = Some(-3.5);
        status.state.frequency_hz = Some(437_224_104);
        status.satellites = vec![SatelliteSummary {
            name: "FIREBIRD 4".into(),
            norad_id: Some(40378),
            elements_available: true,
            metadata: SatelliteMetadata::default(),
        }];
        StatusHandle::new(status)
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router(status())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn status_reports_current_target() {
        let (code, body) = get_json("/api/tracker/status").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["station"], "KNUDSEN");
        assert_eq!(body["directive"], "track");
        assert_eq!(body["state"]["phase"], "IN_RANGE");
        assert_eq!(body["state"]["selected"], "FIREBIRD 4");
    }

    #[tokio::test]
    async fn sample_flattens_pointing() {
        let (code, body) = get_json("/api/tracker/status/sample").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["satellite"], "FIREBIRD 4");
        assert_eq!(body["azimuth_deg"], 210.5);
        assert_eq!(body["frequency_hz"], 437_224_104);
    }

    #[tokio::test]
    async fn satellites_are_listed_and_looked_up_by_alias() {
        let (code, body) = get_json("/api/satellites").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body[0]["norad_id"], 40378);

        let (code, body) = get_json("/api/satellites/firebird").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["name"], "FIREBIRD 4");

        let (code, body) = get_json("/api/satellites/ELFIN").await;
        assert_eq!(code, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "satellite_not_tracked");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let (code, body) = get_json("/api-doc/openapi.json").await;
        assert_eq!(code, StatusCode::OK);
        assert!(body["paths"]["/api/tracker/status"].is_object());
    }
}
