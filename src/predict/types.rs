use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sgp4::{Constants, Elements};
use utoipa::ToSchema;

use crate::predict::error::PredictError;

/// Azimuth/elevation pointing, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct LookAngles {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

/// One propagated sample as seen from the station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    /// Positive when the satellite is receding.
    pub range_rate_km_s: f64,
}

impl Observation {
    pub fn look_angles(&self) -> LookAngles {
        LookAngles {
            azimuth_deg: self.azimuth_deg,
            elevation_deg: self.elevation_deg,
        }
    }
}

/// Rise, culmination and set of a single overflight.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PassWindow {
    pub rise_time: DateTime<Utc>,
    pub rise_azimuth_deg: f64,
    pub peak_time: DateTime<Utc>,
    pub peak_elevation_deg: f64,
    pub set_time: DateTime<Utc>,
    pub set_azimuth_deg: f64,
}

impl PassWindow {
    pub fn duration(&self) -> chrono::Duration {
        self.set_time - self.rise_time
    }

    /// Time left until rise, or `None` once the pass has started.
    pub fn time_to_rise(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        (self.rise_time > now).then(|| self.rise_time - now)
    }
}

struct ElementSet {
    name: String,
    elements: Elements,
    constants: Constants,
}

/// Opaque handle to one satellite's parsed elements, cheap to clone.
#[derive(Clone)]
pub struct OrbitalElements {
    inner: Arc<ElementSet>,
}

impl OrbitalElements {
    pub fn from_tle(name: &str, line1: &str, line2: &str) -> Result<Self, PredictError> {
        let invalid = |message: String| PredictError::InvalidTle {
            source_name: name.to_string(),
            message,
        };
        let elements = Elements::from_tle(
            Some(name.to_string()),
            line1.trim().as_bytes(),
            line2.trim().as_bytes(),
        )
        .map_err(|e| invalid(e.to_string()))?;
        let constants = Constants::from_elements(&elements).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ElementSet {
                name: name.to_string(),
                elements,
                constants,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn norad_id(&self) -> u64 {
        self.inner.elements.norad_id
    }

    pub(crate) fn elements(&self) -> &Elements {
        &self.inner.elements
    }

    pub(crate) fn constants(&self) -> &Constants {
        &self.inner.constants
    }
}

impl fmt::Debug for OrbitalElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrbitalElements")
            .field("name", &self.inner.name)
            .field("norad_id", &self.inner.elements.norad_id)
            .finish()
    }
}
