use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::tracker::status::TrackerStatus;

/// Operator status block for one cycle.
pub fn render_status(status: &TrackerStatus, now: DateTime<Utc>) -> String {
    let state = &status.state;
    let mut out = String::new();

    let Some(target) = state.selected.as_deref() else {
        let _ = writeln!(out, "No satellite selected ({})", status.station);
        return out;
    };

    let _ = writeln!(out, "Target: {} [{}]", target, state.phase);
    if !state.selection_made {
        let _ = writeln!(out, "No tracked satellite above the horizon");
    }
    if let Some(look) = state.pointing {
        let _ = writeln!(out, "AZ: {:.2}  EL: {:.2}", look.azimuth_deg, look.elevation_deg);
    }
    if let Some(rr) = state.range_rate_km_s {
        let _ = writeln!(out, "Range rate: {:.3} km/s", rr);
    }
    let _ = writeln!(out, "UTC: {}", now.to_rfc3339_opts(SecondsFormat::Secs, true));

    if let Some(pass) = &state.pass {
        match pass.time_to_rise(now).and_then(|d| d.to_std().ok()) {
            Some(wait) => {
                let wait = std::time::Duration::from_secs(wait.as_secs());
                let _ = writeln!(out, "Time to AOS: {}", humantime::format_duration(wait));
            }
            None => {
                let _ = writeln!(out, "Time to AOS: in pass");
            }
        }
        let _ = writeln!(
            out,
            "AOS: {} @ {:.1}  LOS: {} @ {:.1}  Max EL: {:.1}",
            pass.rise_time.format("%H:%M:%S"),
            pass.rise_azimuth_deg,
            pass.set_time.format("%H:%M:%S"),
            pass.set_azimuth_deg,
            pass.peak_elevation_deg,
        );
    }

    match (state.nominal_frequency_hz, state.frequency_hz) {
        (Some(nominal), Some(tuned)) => {
            let _ = writeln!(out, "Frequency: {} Hz (tuned {} Hz)", nominal, tuned);
        }
        (Some(nominal), None) => {
            let _ = writeln!(out, "Frequency: {} Hz (not tuned)", nominal);
        }
        (None, _) => {
            let _ = writeln!(out, "Frequency: unassigned");
        }
    }

    if let Some(readout) = &status.readout {
        let _ = writeln!(
            out,
            "Rotor AZ: {}  EL: {}  Radio: {}",
            readout.azimuth.as_deref().unwrap_or("?"),
            readout.elevation.as_deref().unwrap_or("?"),
            readout
                .frequency_hz
                .map(|hz| hz.to_string())
                .unwrap_or_else(|| "?".to_string()),
        );
    }
    let _ = writeln!(out, "Directive: {}", status.directive);
    out
}
