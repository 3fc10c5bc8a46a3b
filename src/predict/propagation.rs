use chrono::{DateTime, Utc};

use crate::predict::error::PredictError;
use crate::predict::ground_station::{GroundStation, EARTH_ROTATION_RAD_S};
use crate::predict::types::{Observation, OrbitalElements};

/// Propagates `elements` to `timestamp` and projects the result into the
/// station's local horizon frame.
pub fn observe(
    station: &GroundStation,
    elements: &OrbitalElements,
    timestamp: DateTime<Utc>,
) -> Result<Observation, PredictError> {
    let minutes = elements
        .elements()
        .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
        .map_err(|e| PredictError::Propagation(e.to_string()))?;

    let prediction = elements.constants().propagate(minutes)?;

    let sidereal =
        sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&timestamp.naive_utc()));

    let sat_ecef = teme_to_ecef_position(prediction.position, sidereal);
    let sat_vel_ecef = teme_to_ecef_velocity(prediction.position, prediction.velocity, sidereal);

    let sta_ecef = station.position_ecef_km();
    let sta_vel = station.velocity_ecef_km_s();

    let dr = [
        sat_ecef[0] - sta_ecef[0],
        sat_ecef[1] - sta_ecef[1],
        sat_ecef[2] - sta_ecef[2],
    ];
    let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

    let enu = ecef_to_enu(dr, station.lat_rad(), station.lon_rad());
    let azimuth = enu.0.atan2(enu.1).to_degrees().rem_euclid(360.0);
    let elevation = if range_km > 0.0 {
        (enu.2 / range_km).asin().to_degrees()
    } else {
        0.0
    };

    let los_unit = if range_km > 0.0 {
        [dr[0] / range_km, dr[1] / range_km, dr[2] / range_km]
    } else {
        [0.0, 0.0, 0.0]
    };
    let rel_vel = [
        sat_vel_ecef[0] - sta_vel[0],
        sat_vel_ecef[1] - sta_vel[1],
        sat_vel_ecef[2] - sta_vel[2],
    ];
    let range_rate_km_s =
        rel_vel[0] * los_unit[0] + rel_vel[1] * los_unit[1] + rel_vel[2] * los_unit[2];

    Ok(Observation {
        timestamp,
        azimuth_deg: azimuth,
        elevation_deg: elevation,
        range_km,
        range_rate_km_s,
    })
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = [
        vel_teme[0] * cos_gmst + vel_teme[1] * sin_gmst,
        -vel_teme[0] * sin_gmst + vel_teme[1] * cos_gmst,
        vel_teme[2],
    ];
    let rotation = [
        -EARTH_ROTATION_RAD_S * pos[1],
        EARTH_ROTATION_RAD_S * pos[0],
        0.0,
    ];
    [
        rotated[0] - rotation[0],
        rotated[1] - rotation[1],
        rotated[2] - rotation[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::tle_loader::tests::{firebird, firebird_epoch};

    #[test]
    fn straight_up_is_ninety_degrees_elevation() {
        // Station at lat=0, lon=0: "up" is +X in ECEF.
        let (e, n, u) = ecef_to_enu([100.0, 0.0, 0.0], 0.0, 0.0);
        assert!(e.abs() < 1e-9);
        assert!(n.abs() < 1e-9);
        assert!((u - 100.0).abs() < 1e-9);
    }

    #[test]
    fn due_north_at_equator() {
        let (e, n, u) = ecef_to_enu([0.0, 0.0, 50.0], 0.0, 0.0);
        assert!(e.abs() < 1e-9);
        assert!((n - 50.0).abs() < 1e-9);
        assert!(u.abs() < 1e-9);
    }

    #[test]
    fn observation_is_physically_plausible() {
        let station = GroundStation::knudsen();
        let obs = observe(&station, &firebird(), firebird_epoch()).unwrap();

        assert!((0.0..360.0).contains(&obs.azimuth_deg));
        assert!((-90.0..=90.0).contains(&obs.elevation_deg));
        // LEO: somewhere between directly overhead and the far side of the Earth.
        assert!(obs.range_km > 400.0 && obs.range_km < 14_000.0);
        assert!(obs.range_rate_km_s.abs() < 12.0);
    }
}
