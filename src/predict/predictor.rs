use chrono::{DateTime, Duration, Utc};

use crate::catalog::SatelliteRecord;
use crate::predict::error::PredictError;
use crate::predict::pass_finder;
use crate::predict::propagation::observe;
use crate::predict::types::{LookAngles, OrbitalElements, PassWindow};
use crate::predict::GroundStation;

const DEFAULT_SEARCH_HOURS: i64 = 48;

/// Pointing, range-rate and pass queries for one satellite as seen from one
/// station. Implementations are pure in `(station, satellite, at)`.
pub trait OrbitalPredictor {
    fn position(
        &self,
        station: &GroundStation,
        satellite: &SatelliteRecord,
        at: DateTime<Utc>,
    ) -> Result<LookAngles, PredictError>;

    /// Range-rate in km/s, positive when receding.
    fn velocity(
        &self,
        station: &GroundStation,
        satellite: &SatelliteRecord,
        at: DateTime<Utc>,
    ) -> Result<f64, PredictError>;

    fn next_pass(
        &self,
        station: &GroundStation,
        satellite: &SatelliteRecord,
        at: DateTime<Utc>,
    ) -> Result<PassWindow, PredictError>;
}

/// SGP4-backed predictor.
#[derive(Debug, Clone)]
pub struct Sgp4Predictor {
    search_window: Duration,
}

impl Default for Sgp4Predictor {
    fn default() -> Self {
        Self {
            search_window: Duration::hours(DEFAULT_SEARCH_HOURS),
        }
    }
}

impl Sgp4Predictor {
    pub fn with_search_window(search_window: Duration) -> Self {
        Self { search_window }
    }
}

fn elements_of(satellite: &SatelliteRecord) -> Result<&OrbitalElements, PredictError> {
    satellite
        .elements
        .as_ref()
        .ok_or_else(|| PredictError::ElementsUnavailable(satellite.name.clone()))
}

impl OrbitalPredictor for Sgp4Predictor {
    fn position(
        &self,
        station: &GroundStation,
        satellite: &SatelliteRecord,
        at: DateTime<Utc>,
    ) -> Result<LookAngles, PredictError> {
        let sample = observe(station, elements_of(satellite)?, at)?;
        Ok(sample.look_angles())
    }

    fn velocity(
        &self,
        station: &GroundStation,
        satellite: &SatelliteRecord,
        at: DateTime<Utc>,
    ) -> Result<f64, PredictError> {
        Ok(observe(station, elements_of(satellite)?, at)?.range_rate_km_s)
    }

    fn next_pass(
        &self,
        station: &GroundStation,
        satellite: &SatelliteRecord,
        at: DateTime<Utc>,
    ) -> Result<PassWindow, PredictError> {
        pass_finder::next_pass(station, elements_of(satellite)?, at, self.search_window)
    }
}
