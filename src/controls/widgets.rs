//! Slider and button models
//!
//! Widgets hold value and hit-test state only. They consume pointer samples
//! through [`Control::handle_pointer`] and report changes as [`ControlEvent`]s;
//! drawing is left to whatever front end owns them.

use std::fmt;

/// Default slider track width in pointer units
pub const SLIDER_WIDTH: f64 = 178.0;

/// Default slider knob size in pointer units
pub const KNOB_SIZE: f64 = 12.0;

/// Divisor applied to pointer movement in fine-adjust mode
pub const FINE_DIVISOR: f64 = 5.0;

/// One pointer sample, in the same coordinate space as the widgets
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub x: f64,
    pub y: f64,
    /// Primary button held
    pub pressed: bool,
    /// Fine-adjust modifier held
    pub fine: bool,
}

impl PointerState {
    /// Pointer at `(x, y)` with the button held
    pub fn down(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            pressed: true,
            fine: false,
        }
    }

    /// Pointer at `(x, y)` with the button released
    pub fn up(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            pressed: false,
            fine: false,
        }
    }

    /// Same sample with the fine-adjust modifier held
    pub fn with_fine(mut self) -> Self {
        self.fine = true;
        self
    }
}

/// Change reported by a control
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    /// A slider moved to a new normalised value
    ValueChanged(f64),
    /// A button was clicked
    Clicked { toggled: bool },
}

/// A UI control driven by pointer samples
pub trait Control {
    /// Feed a pointer sample; returns an event if the control changed
    fn handle_pointer(&mut self, pointer: &PointerState) -> Option<ControlEvent>;

    /// Text shown next to the control
    fn label(&self) -> String;

    /// Check whether a point hits the control
    fn hit(&self, x: f64, y: f64) -> bool;
}

// ============================================================================
// Slider
// ============================================================================

/// Horizontal slider with a normalised value in [0, 1]
///
/// Dragging moves the value by the horizontal pointer movement divided by the
/// track width, or a fifth of that in fine mode. A drag only starts on the
/// knob.
pub struct Slider {
    x: f64,
    y: f64,
    width: f64,
    knob: f64,
    value: f64,
    last_x: Option<f64>,
    formatter: fn(f64) -> String,
}

impl Slider {
    /// Create a slider whose track starts at `(x, y)`
    pub fn new(x: f64, y: f64, value: f64, formatter: fn(f64) -> String) -> Self {
        Self {
            x,
            y,
            width: SLIDER_WIDTH,
            knob: KNOB_SIZE,
            value: value.clamp(0.0, 1.0),
            last_x: None,
            formatter,
        }
    }

    /// Current value
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value without emitting an event
    pub fn set_value(&mut self, value: f64) {
        self.value = value.clamp(0.0, 1.0);
    }

    /// Check whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.last_x.is_some()
    }

    /// Centre of the knob
    pub fn knob_center(&self) -> (f64, f64) {
        (self.x + self.value * self.width, self.y)
    }

    fn on_knob(&self, x: f64, y: f64) -> bool {
        let (kx, ky) = self.knob_center();
        (x - kx).abs() <= self.knob && (y - ky).abs() <= self.knob
    }
}

impl fmt::Debug for Slider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slider")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("value", &self.value)
            .field("dragging", &self.is_dragging())
            .finish()
    }
}

impl Control for Slider {
    fn handle_pointer(&mut self, pointer: &PointerState) -> Option<ControlEvent> {
        if !pointer.pressed {
            self.last_x = None;
            return None;
        }

        let Some(last_x) = self.last_x else {
            if self.on_knob(pointer.x, pointer.y) {
                self.last_x = Some(pointer.x);
            }
            return None;
        };

        self.last_x = Some(pointer.x);
        let mut delta = (pointer.x - last_x) / self.width;
        if pointer.fine {
            delta /= FINE_DIVISOR;
        }

        let value = (self.value + delta).clamp(0.0, 1.0);
        if value == self.value {
            return None;
        }
        self.value = value;
        Some(ControlEvent::ValueChanged(value))
    }

    fn label(&self) -> String {
        (self.formatter)(self.value)
    }

    fn hit(&self, x: f64, y: f64) -> bool {
        self.on_knob(x, y)
            || ((self.x..=self.x + self.width).contains(&x) && (y - self.y).abs() <= self.knob / 2.0)
    }
}

// ============================================================================
// Button
// ============================================================================

/// Rectangular button, optionally latching
#[derive(Debug, Clone)]
pub struct Button {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    text: String,
    toggle: bool,
    on: bool,
    was_pressed: bool,
}

impl Button {
    /// Momentary push button
    pub fn new(x: f64, y: f64, width: f64, height: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            width,
            height,
            text: text.into(),
            toggle: false,
            on: false,
            was_pressed: false,
        }
    }

    /// Latching button that flips its state on each click
    pub fn toggle(x: f64, y: f64, width: f64, height: f64, text: impl Into<String>) -> Self {
        Self {
            toggle: true,
            ..Self::new(x, y, width, height, text)
        }
    }

    /// Latched state (always false for push buttons)
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Set the latched state without emitting an event
    pub fn set_on(&mut self, on: bool) {
        self.on = self.toggle && on;
    }
}

impl Control for Button {
    fn handle_pointer(&mut self, pointer: &PointerState) -> Option<ControlEvent> {
        // Clicks fire on the press edge only
        let rising = pointer.pressed && !self.was_pressed;
        self.was_pressed = pointer.pressed;
        if !rising || !self.hit(pointer.x, pointer.y) {
            return None;
        }
        if self.toggle {
            self.on = !self.on;
        }
        Some(ControlEvent::Clicked { toggled: self.on })
    }

    fn label(&self) -> String {
        self.text.clone()
    }

    fn hit(&self, x: f64, y: f64) -> bool {
        (self.x..=self.x + self.width).contains(&x) && (self.y..=self.y + self.height).contains(&y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::mapping::{rate_label, DEFAULT_RATE_SLIDER};
    use approx::assert_abs_diff_eq;

    fn rate_slider() -> Slider {
        Slider::new(0.0, 0.0, DEFAULT_RATE_SLIDER, rate_label)
    }

    #[test]
    fn test_slider_drag_from_knob() {
        let mut slider = Slider::new(0.0, 0.0, 0.5, rate_label);
        let (kx, ky) = slider.knob_center();
        assert_eq!(slider.handle_pointer(&PointerState::down(kx, ky)), None);
        assert!(slider.is_dragging());

        let event = slider.handle_pointer(&PointerState::down(kx + SLIDER_WIDTH / 4.0, ky));
        assert_eq!(event, Some(ControlEvent::ValueChanged(0.75)));
        assert_eq!(slider.label(), "4x");

        slider.handle_pointer(&PointerState::up(kx, ky));
        assert!(!slider.is_dragging());
    }

    #[test]
    fn test_slider_ignores_press_off_knob() {
        let mut slider = rate_slider();
        assert_eq!(slider.handle_pointer(&PointerState::down(-50.0, 0.0)), None);
        assert_eq!(slider.handle_pointer(&PointerState::down(50.0, 0.0)), None);
        assert_abs_diff_eq!(slider.value(), DEFAULT_RATE_SLIDER);
    }

    #[test]
    fn test_slider_fine_mode_and_clamp() {
        let mut slider = Slider::new(0.0, 0.0, 0.5, rate_label);
        let (kx, ky) = slider.knob_center();
        slider.handle_pointer(&PointerState::down(kx, ky));
        slider.handle_pointer(&PointerState::down(kx + SLIDER_WIDTH / 2.0, ky).with_fine());
        assert_abs_diff_eq!(slider.value(), 0.6, epsilon = 1e-12);

        // Dragging far past the end pins the value and then stops reporting
        assert!(slider
            .handle_pointer(&PointerState::down(kx + 10.0 * SLIDER_WIDTH, ky))
            .is_some());
        assert_eq!(slider.value(), 1.0);
        assert_eq!(
            slider.handle_pointer(&PointerState::down(kx + 11.0 * SLIDER_WIDTH, ky)),
            None
        );
    }

    #[test]
    fn test_slider_drag_continues_off_knob() {
        let mut slider = Slider::new(0.0, 0.0, 0.5, rate_label);
        let (kx, ky) = slider.knob_center();
        slider.handle_pointer(&PointerState::down(kx, ky));
        let event = slider.handle_pointer(&PointerState::down(kx - SLIDER_WIDTH / 2.0, ky + 100.0));
        assert_eq!(event, Some(ControlEvent::ValueChanged(0.0)));
    }

    #[test]
    fn test_button_clicks_on_press_edge() {
        let mut button = Button::new(10.0, 10.0, 40.0, 20.0, "copy");
        assert_eq!(
            button.handle_pointer(&PointerState::down(20.0, 20.0)),
            Some(ControlEvent::Clicked { toggled: false })
        );
        // Holding does not repeat
        assert_eq!(button.handle_pointer(&PointerState::down(20.0, 20.0)), None);
        button.handle_pointer(&PointerState::up(20.0, 20.0));
        // Outside
        assert_eq!(button.handle_pointer(&PointerState::down(0.0, 0.0)), None);
        assert_eq!(button.label(), "copy");
    }

    #[test]
    fn test_toggle_button_latches() {
        let mut button = Button::toggle(0.0, 0.0, 10.0, 10.0, "rec");
        let press = PointerState::down(5.0, 5.0);
        let release = PointerState::up(5.0, 5.0);

        assert_eq!(
            button.handle_pointer(&press),
            Some(ControlEvent::Clicked { toggled: true })
        );
        button.handle_pointer(&release);
        assert_eq!(
            button.handle_pointer(&press),
            Some(ControlEvent::Clicked { toggled: false })
        );
        assert!(!button.is_on());

        button.set_on(true);
        assert!(button.is_on());
        let mut push = Button::new(0.0, 0.0, 10.0, 10.0, "copy");
        push.set_on(true);
        assert!(!push.is_on());
    }

    #[test]
    fn test_set_value_clamps_without_event() {
        let mut slider = rate_slider();
        slider.set_value(2.0);
        assert_eq!(slider.value(), 1.0);
        assert_eq!(slider.label(), "8x");
        assert!(slider.hit(SLIDER_WIDTH, 0.0));
        assert!(!slider.hit(-KNOB_SIZE * 2.0, 0.0));
    }
}
