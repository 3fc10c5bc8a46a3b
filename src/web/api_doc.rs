use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::tracker::status,
        super::api::tracker::status_sample,
        super::api::satellites::list_satellites,
        super::api::satellites::get_satellite,
    ),
    components(
        schemas(
            super::api::tracker::TrackerSample,
            super::api::error::ErrorResponse,
            crate::tracker::TrackerStatus,
            crate::tracker::TrackState,
            crate::tracker::TrackPhase,
            crate::tracker::Directive,
            crate::tracker::Candidate,
            crate::tracker::RotorReadout,
            crate::catalog::SatelliteSummary,
            crate::catalog::SatelliteMetadata,
            crate::predict::LookAngles,
            crate::predict::PassWindow,
        )
    ),
    info(
        title = "groundtrack status API",
        description = "Read-only view of the satellite tracking loop",
        version = "0.1.0"
    ),
    tags(
        (name = "tracker", description = "Tracking state"),
        (name = "satellites", description = "Tracked satellites")
    )
)]
pub struct ApiDoc;
