use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::catalog::SatelliteMetadata;
use crate::predict::tle_fetch::CUBESAT_FEED_URL;
use crate::predict::GroundStation;
use crate::radio::RadioClient;
use crate::rotator::RetryPolicy;
use crate::tracker::{ElementsRefresh, ParkPosition, TrackingSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid station {name}: {reason}")]
    InvalidStation { name: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub station: StationConfig,
    pub rotator: RotatorConfig,
    #[serde(default)]
    pub radio: RadioConfig,
    pub tle: TleConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub satellites: Vec<SatelliteEntry>,
    #[serde(default)]
    pub web: Option<WebConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: String,
    /// `"lat,lon"` in decimal degrees.
    pub coordinates: Option<String>,
    pub altitude_m: Option<f64>,
    pub callsign: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RotatorConfig {
    pub azimuth: Endpoint,
    pub elevation: Endpoint,
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    #[serde(default = "default_retry_delay", deserialize_with = "human_duration")]
    pub retry_delay: Duration,
    #[serde(default = "default_io_timeout", deserialize_with = "human_duration")]
    pub io_timeout: Duration,
    #[serde(default)]
    pub park: ParkConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParkConfig {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

impl Default for ParkConfig {
    fn default() -> Self {
        let park = ParkPosition::default();
        Self {
            azimuth_deg: park.azimuth_deg,
            elevation_deg: park.elevation_deg,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RadioConfig {
    #[serde(default = "default_radio_host")]
    pub host: String,
    #[serde(default = "default_radio_port")]
    pub port: u16,
    #[serde(default = "default_io_timeout", deserialize_with = "human_duration")]
    pub timeout: Duration,
    /// Demodulator mode set once at startup, e.g. `FM`.
    pub mode: Option<String>,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            host: default_radio_host(),
            port: default_radio_port(),
            timeout: default_io_timeout(),
            mode: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TleConfig {
    pub file: PathBuf,
    #[serde(default = "default_feed_url")]
    pub url: Option<String>,
    #[serde(default)]
    pub refresh_on_start: bool,
    #[serde(default, deserialize_with = "optional_human_duration")]
    pub refresh_interval: Option<Duration>,
    #[serde(default = "default_download_timeout", deserialize_with = "human_duration")]
    pub download_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_cycle_delay", deserialize_with = "human_duration")]
    pub cycle_delay: Duration,
    #[serde(default = "default_prompt_timeout", deserialize_with = "human_duration")]
    pub prompt_timeout: Duration,
    #[serde(default = "default_search_window", deserialize_with = "human_duration")]
    pub pass_search_window: Duration,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            cycle_delay: default_cycle_delay(),
            prompt_timeout: default_prompt_timeout(),
            pass_search_window: default_search_window(),
        }
    }
}

/// A satellite to track from startup.
#[derive(Debug, Clone, Deserialize)]
pub struct SatelliteEntry {
    pub name: String,
    pub frequency_hz: Option<u64>,
    #[serde(flatten)]
    pub metadata: SatelliteMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_radio_host() -> String {
    "127.0.0.1".to_string()
}

fn default_radio_port() -> u16 {
    7356
}

fn default_connect_attempts() -> u32 {
    RetryPolicy::default().max_attempts
}

fn default_retry_delay() -> Duration {
    RetryPolicy::default().delay
}

fn default_io_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_feed_url() -> Option<String> {
    Some(CUBESAT_FEED_URL.to_string())
}

fn default_cycle_delay() -> Duration {
    TrackingSettings::default().cycle_delay
}

fn default_prompt_timeout() -> Duration {
    TrackingSettings::default().prompt_timeout
}

fn default_search_window() -> Duration {
    Duration::from_secs(48 * 3600)
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn human_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

fn optional_human_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) => humantime::parse_duration(s.trim())
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Resolves the configured station. Coordinates win over a preset name.
    pub fn ground_station(&self) -> Result<GroundStation, ConfigError> {
        let station = &self.station;
        let invalid = |reason: &str| ConfigError::InvalidStation {
            name: station.name.clone(),
            reason: reason.to_string(),
        };

        match &station.coordinates {
            Some(coordinates) => GroundStation::from_coordinates(
                &station.name,
                coordinates,
                station.altitude_m,
                station.callsign.clone(),
            )
            .ok_or_else(|| invalid("coordinates must be \"lat,lon\" in degrees")),
            None => GroundStation::preset(&station.name)
                .ok_or_else(|| invalid("no coordinates and no built-in station of that name")),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.rotator.connect_attempts.max(1),
            delay: self.rotator.retry_delay,
        }
    }

    pub fn radio_client(&self) -> RadioClient {
        RadioClient::new(self.radio.host.clone(), self.radio.port, self.radio.timeout)
    }

    pub fn tracking_settings(&self) -> TrackingSettings {
        TrackingSettings {
            cycle_delay: self.tracking.cycle_delay,
            prompt_timeout: self.tracking.prompt_timeout,
            park: ParkPosition {
                azimuth_deg: self.rotator.park.azimuth_deg,
                elevation_deg: self.rotator.park.elevation_deg,
            },
            refresh: self.tle.refresh_interval.map(|interval| ElementsRefresh {
                url: self.tle.url.clone(),
                file: self.tle.file.clone(),
                interval,
                timeout: self.tle.download_timeout,
            }),
        }
    }
}
