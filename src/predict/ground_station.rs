use serde::Serialize;
use utoipa::ToSchema;

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

/// Knudsen Hall rooftop station at UCLA.
const KNUDSEN_NAME: &str = "KNUDSEN";
const KNUDSEN_LATITUDE_DEG: f64 = 34.07099;
const KNUDSEN_LONGITUDE_DEG: f64 = -118.441114;
const KNUDSEN_ALTITUDE_M: f64 = 150.0;
const KNUDSEN_CALLSIGN: &str = "W6YRA";

/// Geodetic location of the one active ground station. Built once at
/// startup and only ever borrowed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GroundStation {
    pub name: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
    pub callsign: Option<String>,
}

impl Default for GroundStation {
    fn default() -> Self {
        Self::knudsen()
    }
}

impl GroundStation {
    pub fn knudsen() -> Self {
        Self {
            name: KNUDSEN_NAME.to_string(),
            latitude_deg: KNUDSEN_LATITUDE_DEG,
            longitude_deg: KNUDSEN_LONGITUDE_DEG,
            altitude_m: KNUDSEN_ALTITUDE_M,
            callsign: Some(KNUDSEN_CALLSIGN.to_string()),
        }
    }

    /// Returns a built-in station for a recognised name.
    pub fn preset(name: &str) -> Option<Self> {
        if name.trim().eq_ignore_ascii_case(KNUDSEN_NAME) {
            Some(Self::knudsen())
        } else {
            None
        }
    }

    /// Parses `"lat,lon"` in decimal degrees.
    pub fn from_coordinates(
        name: &str,
        coordinates: &str,
        altitude_m: Option<f64>,
        callsign: Option<String>,
    ) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() < 2 {
            return None;
        }
        let lat: f64 = parts[0].parse().ok()?;
        let lon: f64 = parts[1].parse().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            latitude_deg: lat,
            longitude_deg: lon,
            altitude_m: altitude_m.unwrap_or(0.0),
            callsign,
        })
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        // WGS-84 constants
        let a = 6378.137;
        let e2 = 0.00669437999014;
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let sin_lon = lon.sin();
        let cos_lon = lon.cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.altitude_m / 1000.0;
        let x = (n + alt_km) * cos_lat * cos_lon;
        let y = (n + alt_km) * cos_lat * sin_lon;
        let z = (n * (1.0 - e2) + alt_km) * sin_lat;
        [x, y, z]
    }

    pub fn velocity_ecef_km_s(&self) -> [f64; 3] {
        let pos = self.position_ecef_km();
        [
            -EARTH_ROTATION_RAD_S * pos[1],
            EARTH_ROTATION_RAD_S * pos[0],
            0.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knudsen_preset_is_case_insensitive() {
        let station = GroundStation::preset(" knudsen ").unwrap();
        assert_eq!(station.name, "KNUDSEN");
        assert_eq!(station.callsign.as_deref(), Some("W6YRA"));
        assert_eq!(station.altitude_m, 150.0);
        assert!(GroundStation::preset("ELSEWHERE").is_none());
    }

    #[test]
    fn parses_coordinates() {
        let station =
            GroundStation::from_coordinates("HOME", "52.0, 4.5", Some(12.0), None).unwrap();
        assert_eq!(station.latitude_deg, 52.0);
        assert_eq!(station.longitude_deg, 4.5);
        assert_eq!(station.altitude_m, 12.0);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(GroundStation::from_coordinates("X", "95.0,10.0", None, None).is_none());
        assert!(GroundStation::from_coordinates("X", "10.0", None, None).is_none());
        assert!(GroundStation::from_coordinates("X", "abc,10.0", None, None).is_none());
    }

    #[test]
    fn equator_station_sits_on_the_semi_major_axis() {
        let station = GroundStation::from_coordinates("EQ", "0,0", None, None).unwrap();
        let ecef = station.position_ecef_km();
        assert!((ecef[0] - 6378.137).abs() < 1e-6);
        assert!(ecef[1].abs() < 1e-9);
        assert!(ecef[2].abs() < 1e-9);
    }
}
