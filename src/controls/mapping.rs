//! Control value mappings and labels
//!
//! Sliders produce normalised values in [0, 1]; these functions turn them into
//! engine parameters and into the text shown next to the controls.

use crate::engine::buffer::db_to_linear;

/// Largest playback rate magnitude reachable from the rate slider
pub const MAX_RATE: f64 = 8.0;

/// Decibel span of the gain slider
pub const GAIN_DB_SPAN: f64 = 72.0;

/// Gain slider value that maps to 0 dB
pub const UNITY_GAIN_SLIDER: f64 = 0.75;

/// Initial rate slider value (rate 1x)
pub const DEFAULT_RATE_SLIDER: f64 = 9.0 / 16.0;

/// Map a rate slider value in [0, 1] to a rate in [-8, 8]
///
/// # Example
/// ```
/// use reeltape::controls::rate_from_slider;
///
/// assert_eq!(rate_from_slider(0.5), 0.0);
/// assert_eq!(rate_from_slider(1.0), 8.0);
/// assert_eq!(rate_from_slider(0.0), -8.0);
/// ```
pub fn rate_from_slider(value: f64) -> f64 {
    value.clamp(0.0, 1.0) * (2.0 * MAX_RATE) - MAX_RATE
}

/// Inverse of [`rate_from_slider`]
pub fn slider_from_rate(rate: f64) -> f64 {
    ((rate + MAX_RATE) / (2.0 * MAX_RATE)).clamp(0.0, 1.0)
}

/// Map a gain slider value in [0, 1] to decibels (-54 dB .. +18 dB)
pub fn gain_db_from_slider(value: f64) -> f64 {
    GAIN_DB_SPAN * (value.clamp(0.0, 1.0) - UNITY_GAIN_SLIDER)
}

/// Map a gain slider value in [0, 1] to a linear gain multiplier
pub fn gain_from_slider(value: f64) -> f32 {
    db_to_linear(gain_db_from_slider(value) as f32)
}

/// Round to two decimal places, halves rounding up
pub fn round2(x: f64) -> f64 {
    ((x + f64::EPSILON) * 100.0 + 0.5).floor() / 100.0
}

/// Label for the rate slider, e.g. `"1.5x"`
pub fn rate_label(value: f64) -> String {
    format!("{}x", round2(rate_from_slider(value)))
}

/// Label for the gain slider, e.g. `"+0 dB"` or `"-6.75 dB"`
pub fn gain_label(value: f64) -> String {
    let db = round2(gain_db_from_slider(value));
    if db < 0.0 {
        format!("{} dB", db)
    } else {
        format!("+{} dB", db)
    }
}

/// Format seconds as minutes and seconds, e.g. `1'5"`
pub fn format_duration(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    let minutes = (secs / 60.0).floor() as u64;
    let seconds = (secs % 60.0).floor() as u64;
    format!("{}'{}\"", minutes, seconds)
}

/// Position/duration label shown under a tape
pub fn position_label(position_secs: f64, duration_secs: f64) -> String {
    format!(
        "{} / {}",
        format_duration(position_secs),
        format_duration(duration_secs)
    )
}

/// Title shown for a tape: its name (if any) followed by its length
pub fn tape_title(name: &str, duration_secs: f64) -> String {
    if name.is_empty() {
        format_duration(duration_secs)
    } else {
        format!("{} {}", name, format_duration(duration_secs))
    }
}
