pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.0;

/// Frequency heard on the ground for a transmitter at `freq_hz` moving with
/// `range_rate_km_s` (positive = receding, heard lower).
pub fn apply_downlink_doppler(freq_hz: f64, range_rate_km_s: f64) -> f64 {
    freq_hz - (range_rate_km_s / SPEED_OF_LIGHT_KM_S) * freq_hz
}

/// Tuner setting in whole hertz for a nominal downlink.
pub fn doppler_corrected_hz(nominal_hz: u64, range_rate_km_s: f64) -> u64 {
    apply_downlink_doppler(nominal_hz as f64, range_rate_km_s)
        .round()
        .max(0.0) as u64
}
