//! Tape transport engine
//!
//! Each tape keeps its playback position implicitly: the clock time at which
//! the current (rate, start position) regime began, plus the position at that
//! instant. The current position is derived on demand from the engine clock,
//! so it stays exact no matter how often or how late the UI polls it.
//!
//! Every rate change first snapshots the position under the *old* rate and
//! only then switches, which keeps the position continuous across stops,
//! resumes and direction changes.

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::engine::buffer::{ReverseCache, TapeBuffer};
use crate::engine::source::{Direction, PlaybackSource};

/// Rate restored by the first `toggle_play` on a fresh tape
pub const DEFAULT_SAVED_RATE: f64 = 1.0;

/// Transport states derived from the sign of the rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    /// Rate is zero (default state)
    #[default]
    Stopped,
    /// Rate is positive
    PlayingForward,
    /// Rate is negative
    PlayingReverse,
}

impl TransportState {
    /// Classify a rate
    pub fn from_rate(rate: f64) -> Self {
        if rate > 0.0 {
            TransportState::PlayingForward
        } else if rate < 0.0 {
            TransportState::PlayingReverse
        } else {
            TransportState::Stopped
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportState::Stopped => write!(f, "Stopped"),
            TransportState::PlayingForward => write!(f, "Playing"),
            TransportState::PlayingReverse => write!(f, "Reversing"),
        }
    }
}

/// A tape: an audio buffer plus its independent transport state
///
/// All operations take the engine clock time `now` (seconds) explicitly.
///
/// # Example
/// ```
/// use reeltape::engine::{Tape, TapeBuffer};
///
/// let mut tape = Tape::new("loop", TapeBuffer::silence(441_000, 44100), 0.0);
/// tape.set_rate(0.0, 1.0);
/// tape.set_position(0.0, 9.5);
/// // One second later the position has wrapped around the 10s tape
/// assert!((tape.position(1.0) - 0.5).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct Tape {
    name: String,
    buffer: TapeBuffer,
    reverse: ReverseCache,
    source: Option<PlaybackSource>,
    rate: f64,
    saved_rate: f64,
    start_clock_time: f64,
    start_pos: f64,
    gain: f32,
    declick_frames: usize,
}

impl Tape {
    /// Create a stopped tape at position zero
    ///
    /// # Arguments
    /// * `name` - Display name
    /// * `buffer` - Decoded samples
    /// * `now` - Current engine clock time
    pub fn new(name: impl Into<String>, buffer: TapeBuffer, now: f64) -> Self {
        Self {
            name: name.into(),
            buffer,
            reverse: ReverseCache::default(),
            source: None,
            rate: 0.0,
            saved_rate: DEFAULT_SAVED_RATE,
            start_clock_time: now,
            start_pos: 0.0,
            gain: 1.0,
            declick_frames: 0,
        }
    }

    /// Set the fade-in length used for newly built playback sources
    pub fn with_declick(mut self, frames: usize) -> Self {
        self.declick_frames = frames;
        self
    }

    // ========================================================================
    // Position
    // ========================================================================

    /// Current playback position in seconds, wrapped into [0, duration)
    pub fn position(&self, now: f64) -> f64 {
        let duration = self.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        let pos = (now - self.start_clock_time) * self.rate + self.start_pos;
        wrap(pos, duration)
    }

    /// Current playback position as a fraction of the duration, in [0, 1)
    pub fn position_fraction(&self, now: f64) -> f64 {
        let duration = self.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        self.position(now) / duration
    }

    /// Seek to `pos` seconds (wrapped into the tape)
    ///
    /// Does not change the transport state. A running source is rebuilt at
    /// the new position under the current rate. Non-finite positions are
    /// ignored.
    pub fn set_position(&mut self, now: f64, pos: f64) {
        if !pos.is_finite() {
            warn!("[TRANSPORT] '{}' ignoring seek to {}", self.name, pos);
            return;
        }
        let duration = self.duration();
        self.start_pos = if duration > 0.0 { wrap(pos, duration) } else { 0.0 };
        self.start_clock_time = now;
        self.source = None;
        debug!("[TRANSPORT] '{}' seek to {:.3}s", self.name, self.start_pos);
        self.set_rate(now, self.rate);
    }

    /// Move the position by a fraction of the tape length (scrubbing)
    pub fn scrub(&mut self, now: f64, delta_fraction: f64) {
        let pos = self.position(now) + delta_fraction * self.duration();
        self.set_position(now, pos);
    }

    /// Rebuild a running source at the position derived for `now`
    ///
    /// Needed when the clock moved without this tape being rendered.
    pub fn resync(&mut self, now: f64) {
        if self.rate != 0.0 {
            let pos = self.position(now);
            self.set_position(now, pos);
        }
    }

    // ========================================================================
    // Rate
    // ========================================================================

    /// Set the signed playback rate, preserving the current position
    ///
    /// * `0` stops playback and remembers the previous non-zero rate
    /// * `> 0` plays the buffer forwards at that speed
    /// * `< 0` plays the reversed buffer at the magnitude of the rate
    ///
    /// Non-finite rates are ignored.
    pub fn set_rate(&mut self, now: f64, rate: f64) {
        if !rate.is_finite() {
            warn!("[TRANSPORT] '{}' ignoring rate {}", self.name, rate);
            return;
        }
        // Snapshot under the old rate before anything changes.
        self.start_pos = self.position(now);
        self.start_clock_time = now;

        let sample_pos = self.start_pos * self.buffer.sample_rate() as f64;

        if rate < 0.0 {
            let reversed = self.reverse.get_or_build(&self.buffer);
            if self.rate > 0.0 {
                self.source = None;
            }
            let declick = self.declick_frames;
            let source = self.source.get_or_insert_with(|| {
                PlaybackSource::start(reversed, Direction::Reverse, sample_pos, declick)
            });
            source.set_speed(rate);
        } else if rate == 0.0 {
            self.source = None;
            if self.rate != 0.0 {
                self.saved_rate = self.rate;
            }
        } else {
            if self.rate < 0.0 {
                self.source = None;
            }
            let forward = self.buffer.shared();
            let declick = self.declick_frames;
            let source = self.source.get_or_insert_with(|| {
                PlaybackSource::start(forward, Direction::Forward, sample_pos, declick)
            });
            source.set_speed(rate);
        }

        if TransportState::from_rate(rate) != TransportState::from_rate(self.rate) {
            debug!(
                "[TRANSPORT] '{}' {} -> {} at {:.3}s",
                self.name,
                TransportState::from_rate(self.rate),
                TransportState::from_rate(rate),
                self.start_pos
            );
        }
        self.rate = rate;
    }

    /// Resume at the saved rate if stopped, otherwise stop
    pub fn toggle_play(&mut self, now: f64) {
        if self.rate == 0.0 {
            self.set_rate(now, self.saved_rate);
        } else {
            self.saved_rate = self.rate;
            self.set_rate(now, 0.0);
        }
    }

    /// Set the rate restored by the next resume without changing playback
    pub fn set_saved_rate(&mut self, rate: f64) {
        if rate.is_finite() {
            self.saved_rate = rate;
        }
    }

    // ========================================================================
    // Buffer
    // ========================================================================

    /// Discard the playback source and reverse cache, then re-apply the rate
    ///
    /// Call after the buffer content changed.
    pub fn invalidate_buffer(&mut self, now: f64) {
        self.source = None;
        self.reverse.invalidate();
        self.set_rate(now, self.rate);
    }

    /// Replace the tape's samples and invalidate derived state
    pub fn replace_buffer(&mut self, now: f64, buffer: TapeBuffer) {
        // Capture under the old duration, then clamp into the new one.
        let pos = self.position(now);
        self.buffer = buffer;
        let duration = self.duration();
        self.start_pos = if duration > 0.0 { wrap(pos, duration) } else { 0.0 };
        self.start_clock_time = now;
        self.invalidate_buffer(now);
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Mix this tape into an output block (silent while stopped)
    pub fn render_add(&mut self, out: &mut [f32]) {
        let gain = self.gain;
        if let Some(source) = self.source.as_mut() {
            source.render_add(out, gain);
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the tape
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Sample data
    pub fn buffer(&self) -> &TapeBuffer {
        &self.buffer
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.buffer.duration_secs()
    }

    /// Signed playback rate
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Rate restored by the next resume
    pub fn saved_rate(&self) -> f64 {
        self.saved_rate
    }

    /// Linear output gain
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Set the linear output gain (negative values are clamped to zero)
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
    }

    /// Current transport state
    pub fn transport_state(&self) -> TransportState {
        TransportState::from_rate(self.rate)
    }

    /// Check if a playback source is currently built
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Direction of the built playback source, if any
    pub fn source_direction(&self) -> Option<Direction> {
        self.source.as_ref().map(PlaybackSource::direction)
    }

    /// Check if the reversed copy is cached for the current buffer
    pub fn has_reverse_cache(&self) -> bool {
        self.reverse.is_fresh_for(&self.buffer)
    }
}

/// Wrap `pos` into [0, duration)
#[inline]
fn wrap(pos: f64, duration: f64) -> f64 {
    let wrapped = pos.rem_euclid(duration);
    // rem_euclid can round up to exactly `duration` for tiny negative inputs
    if wrapped >= duration {
        0.0
    } else {
        wrapped
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
