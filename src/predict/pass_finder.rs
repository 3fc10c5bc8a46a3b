use chrono::{DateTime, Duration, Utc};

use crate::predict::error::PredictError;
use crate::predict::propagation::observe;
use crate::predict::types::{OrbitalElements, PassWindow};
use crate::predict::GroundStation;

const COARSE_STEP_SECONDS: i64 = 60; // 1 minute for initial scan
const FINE_STEP_SECONDS: i64 = 1; // 1 second for refinement
const HORIZON_ELEVATION: f64 = 0.0;
const MAX_LOOKBACK_MINUTES: i64 = 120;

/// Finds the pass that is in progress at `start`, or else the next one to
/// rise before `start + search`.
pub fn next_pass(
    station: &GroundStation,
    elements: &OrbitalElements,
    start: DateTime<Utc>,
    search: Duration,
) -> Result<PassWindow, PredictError> {
    let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);
    let end = start + search;
    let first = observe(station, elements, start)?;

    let (rise_time, rise_azimuth) = if first.elevation_deg >= HORIZON_ELEVATION {
        // Pass already in progress: walk back to where it rose.
        let limit = start - Duration::minutes(MAX_LOOKBACK_MINUTES);
        let mut later = start;
        loop {
            let earlier = later - coarse_step;
            if earlier < limit {
                let sample = observe(station, elements, later)?;
                break (later, sample.azimuth_deg);
            }
            if observe(station, elements, earlier)?.elevation_deg < HORIZON_ELEVATION {
                break refine_crossing(station, elements, earlier, later, true)?;
            }
            later = earlier;
        }
    } else {
        let mut before = start;
        loop {
            let cursor = before + coarse_step;
            if cursor > end {
                return Err(PredictError::NoPass {
                    satellite: elements.name().to_string(),
                });
            }
            if observe(station, elements, cursor)?.elevation_deg >= HORIZON_ELEVATION {
                break refine_crossing(station, elements, before, cursor, true)?;
            }
            before = cursor;
        }
    };

    // Track maximum elevation until the satellite sets again.
    let mut peak_time = rise_time;
    let mut peak_el = observe(station, elements, rise_time)?.elevation_deg;
    let mut before = rise_time;
    let (set_time, set_azimuth) = loop {
        let cursor = before + coarse_step;
        let sample = observe(station, elements, cursor)?;
        if sample.elevation_deg < HORIZON_ELEVATION {
            break refine_crossing(station, elements, before, cursor, false)?;
        }
        if sample.elevation_deg > peak_el {
            peak_el = sample.elevation_deg;
            peak_time = cursor;
        }
        if cursor > end {
            // Never sets inside the window (e.g. high orbits): truncate.
            break (cursor, sample.azimuth_deg);
        }
        before = cursor;
    };

    let (refined_time, refined_el) = refine_peak(
        station,
        elements,
        (peak_time - coarse_step).max(rise_time),
        (peak_time + coarse_step).min(set_time),
    )?;
    let (peak_time, peak_el) = if refined_el >= peak_el {
        (refined_time, refined_el)
    } else {
        (peak_time, peak_el)
    };

    Ok(PassWindow {
        rise_time,
        rise_azimuth_deg: rise_azimuth,
        peak_time,
        peak_elevation_deg: peak_el,
        set_time,
        set_azimuth_deg: set_azimuth,
    })
}

/// Binary search to find exact horizon crossing time
fn refine_crossing(
    station: &GroundStation,
    elements: &OrbitalElements,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    is_aos: bool, // true = rising, false = setting
) -> Result<(DateTime<Utc>, f64), PredictError> {
    let mut low = before;
    let mut high = after;

    while (high - low).num_seconds() > FINE_STEP_SECONDS {
        let mid = low + (high - low) / 2;
        let above = observe(station, elements, mid)?.elevation_deg >= HORIZON_ELEVATION;
        if above == is_aos {
            high = mid;
        } else {
            low = mid;
        }
    }

    let crossing = if is_aos { high } else { low };
    let sample = observe(station, elements, crossing)?;
    Ok((crossing, sample.azimuth_deg))
}

/// Ternary search for the culmination inside a bracket.
fn refine_peak(
    station: &GroundStation,
    elements: &OrbitalElements,
    low: DateTime<Utc>,
    high: DateTime<Utc>,
) -> Result<(DateTime<Utc>, f64), PredictError> {
    let mut low = low;
    let mut high = high;

    while (high - low).num_seconds() > 2 * FINE_STEP_SECONDS {
        let third = (high - low) / 3;
        let m1 = low + third;
        let m2 = high - third;
        if observe(station, elements, m1)?.elevation_deg
            < observe(station, elements, m2)?.elevation_deg
        {
            low = m1;
        } else {
            high = m2;
        }
    }

    let mid = low + (high - low) / 2;
    Ok((mid, observe(station, elements, mid)?.elevation_deg))
}
