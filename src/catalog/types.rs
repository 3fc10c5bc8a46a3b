use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::predict::OrbitalElements;

/// Descriptive data about a satellite. Every field is optional so that
/// operators can track objects they know nothing about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SatelliteMetadata {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub uplink: Option<String>,
    #[serde(default)]
    pub downlink: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub callsign: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SatelliteRecord {
    pub name: String,
    pub metadata: SatelliteMetadata,
    /// `None` once a refreshed feed no longer carries this satellite.
    pub elements: Option<OrbitalElements>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SatelliteSummary {
    pub name: String,
    pub norad_id: Option<u64>,
    pub elements_available: bool,
    pub metadata: SatelliteMetadata,
}

impl From<&SatelliteRecord> for SatelliteSummary {
    fn from(record: &SatelliteRecord) -> Self {
        SatelliteSummary {
            name: record.name.clone(),
            norad_id: record.elements.as_ref().map(|e| e.norad_id()),
            elements_available: record.elements.is_some(),
            metadata: record.metadata.clone(),
        }
    }
}
