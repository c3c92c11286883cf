//! Tape Controls Module
//!
//! UI-facing models that sit in front of the engine:
//! - Slider/button widgets driven by pointer samples
//! - Rate and gain mappings plus the labels shown beside them
//! - Reel-path scrub geometry
//! - The per-tape control panel

pub mod mapping;
pub mod panel;
pub mod scrub;
pub mod widgets;

pub use mapping::{
    format_duration, gain_db_from_slider, gain_from_slider, gain_label, position_label,
    rate_from_slider, rate_label, round2, slider_from_rate, tape_title, DEFAULT_RATE_SLIDER,
    UNITY_GAIN_SLIDER,
};
pub use panel::{PanelLayout, TapeCommand, TapePanel};
pub use scrub::{ReelPath, ScrubGesture};
pub use widgets::{Button, Control, ControlEvent, PointerState, Slider};
