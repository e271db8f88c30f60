//! Frequency codec
//!
//! Stations are looked up and compared by an integer channel key expressed in
//! tens of kHz. Converting from MHz adds a quarter of a unit before truncating
//! so that 25 kHz channels such as 122.375 MHz land on 12237, matching the
//! airport databases the station records come from.

/// Values above this are assumed to already be in tens of kHz
const CHANNEL_KEY_THRESHOLD: f64 = 1000.0;

/// Convert a frequency in MHz to a channel key in tens of kHz
///
/// Inputs above 1000 are taken to be channel keys already and are truncated
/// unchanged. Negative and non-finite inputs map to 0.
pub fn to_channel_key(freq: f64) -> u32 {
    if !freq.is_finite() || freq <= 0.0 {
        return 0;
    }
    if freq > CHANNEL_KEY_THRESHOLD {
        return freq.trunc() as u32;
    }
    (freq * 100.0 + 0.25).trunc() as u32
}

/// Convert a channel key back to a display frequency in MHz
///
/// Keys ending in 2 or 7 sit on 25 kHz channels whose trailing 5 kHz was
/// dropped by [`to_channel_key`]; it is restored here.
pub fn channel_key_to_mhz(key: u32) -> f64 {
    let base = f64::from(key) / 100.0;
    match key % 10 {
        2 | 7 => base + 0.005,
        _ => base,
    }
}

/// Format a channel key as a three-decimal MHz string, e.g. `"122.375"`
pub fn format_channel_key(key: u32) -> String {
    format!("{:.3}", channel_key_to_mhz(key))
}
