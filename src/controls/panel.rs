//! Per-tape control panel
//!
//! Groups the widgets that drive one tape and turns pointer samples into
//! [`TapeCommand`]s for [`Deck::apply`](crate::session::Deck::apply).

use crate::controls::mapping::{gain_label, rate_label, DEFAULT_RATE_SLIDER, UNITY_GAIN_SLIDER};
use crate::controls::scrub::{ReelPath, ScrubGesture};
use crate::controls::widgets::{Button, Control, ControlEvent, PointerState, Slider};
use crate::engine::TransportState;

/// Distance from the tape within which a press starts a scrub
pub const SCRUB_MARGIN: f64 = 8.0;

/// An action requested by a tape's controls
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapeCommand {
    TogglePlay,
    Copy,
    /// New rate slider value in [0, 1]
    RateSlider(f64),
    /// New gain slider value in [0, 1]
    GainSlider(f64),
    /// Scrub by a fraction of the tape length
    Scrub(f64),
}

/// Layout of a panel, relative to its top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelLayout {
    /// Left reel centre
    pub reel_center: (f64, f64),
    pub reel_radius: f64,
    pub play_button: (f64, f64),
    pub copy_button: (f64, f64),
    pub button_size: (f64, f64),
    pub rate_slider: (f64, f64),
    pub gain_slider: (f64, f64),
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            reel_center: (40.0, 40.0),
            reel_radius: 30.0,
            play_button: (10.0, 90.0),
            copy_button: (60.0, 90.0),
            button_size: (40.0, 20.0),
            rate_slider: (10.0, 130.0),
            gain_slider: (10.0, 160.0),
        }
    }
}

/// Widgets for one tape
#[derive(Debug)]
pub struct TapePanel {
    origin: (f64, f64),
    reel_center: (f64, f64),
    path: ReelPath,
    scrub: ScrubGesture,
    play: Button,
    copy: Button,
    rate: Slider,
    gain: Slider,
}

impl TapePanel {
    /// Create a panel at `origin` with the default layout
    pub fn new(origin: (f64, f64)) -> Self {
        Self::with_layout(origin, PanelLayout::default())
    }

    /// Create a panel at `origin` with a custom layout
    pub fn with_layout(origin: (f64, f64), layout: PanelLayout) -> Self {
        let (ox, oy) = origin;
        let at = |(x, y): (f64, f64)| (ox + x, oy + y);
        let (bw, bh) = layout.button_size;
        let (px, py) = at(layout.play_button);
        let (cx, cy) = at(layout.copy_button);
        let (rx, ry) = at(layout.rate_slider);
        let (gx, gy) = at(layout.gain_slider);

        Self {
            origin,
            reel_center: at(layout.reel_center),
            path: ReelPath::with_radius(layout.reel_radius),
            scrub: ScrubGesture::new(),
            play: Button::toggle(px, py, bw, bh, "play"),
            copy: Button::new(cx, cy, bw, bh, "copy"),
            rate: Slider::new(rx, ry, DEFAULT_RATE_SLIDER, rate_label),
            gain: Slider::new(gx, gy, UNITY_GAIN_SLIDER, gain_label),
        }
    }

    /// Panel origin
    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    /// Reel path used for scrubbing and drawing
    pub fn path(&self) -> &ReelPath {
        &self.path
    }

    /// Rate slider
    pub fn rate_slider(&self) -> &Slider {
        &self.rate
    }

    /// Gain slider
    pub fn gain_slider(&self) -> &Slider {
        &self.gain
    }

    /// Whether the play button is latched on
    pub fn is_playing(&self) -> bool {
        self.play.is_on()
    }

    /// Latch the play button to the tape's actual transport state
    ///
    /// Call with the state from each position poll, since the rate can change
    /// without the button being clicked.
    pub fn sync_state(&mut self, state: TransportState) {
        self.play.set_on(state != TransportState::Stopped);
    }

    /// Feed one pointer sample to every widget and collect the resulting commands
    pub fn handle_pointer(&mut self, pointer: &PointerState) -> Vec<TapeCommand> {
        let mut commands = Vec::new();

        if let Some(ControlEvent::Clicked { .. }) = self.play.handle_pointer(pointer) {
            commands.push(TapeCommand::TogglePlay);
        }
        if let Some(ControlEvent::Clicked { .. }) = self.copy.handle_pointer(pointer) {
            commands.push(TapeCommand::Copy);
        }
        if let Some(ControlEvent::ValueChanged(value)) = self.rate.handle_pointer(pointer) {
            commands.push(TapeCommand::RateSlider(value));
        }
        if let Some(ControlEvent::ValueChanged(value)) = self.gain.handle_pointer(pointer) {
            commands.push(TapeCommand::GainSlider(value));
        }

        let (lx, ly) = (pointer.x - self.reel_center.0, pointer.y - self.reel_center.1);
        let inside = self.path.contains(lx, ly, SCRUB_MARGIN);
        if let Some(delta) = self.scrub.update(&self.path, lx, ly, pointer.pressed, inside) {
            commands.push(TapeCommand::Scrub(delta));
        }

        commands
    }
}
