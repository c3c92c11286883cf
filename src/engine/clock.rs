//! Engine clock
//!
//! Playback position is never integrated incrementally; it is derived from the
//! clock time at which the current rate regime began. The clock itself counts
//! rendered frames, so it only moves forward and matches the audio exactly.

/// Monotonic clock driven by rendered audio frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioClock {
    frames: u64,
    sample_rate: u32,
}

impl AudioClock {
    /// Create a clock at time zero
    pub fn new(sample_rate: u32) -> Self {
        Self {
            frames: 0,
            sample_rate,
        }
    }

    /// Current time in seconds
    #[inline]
    pub fn now(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.sample_rate as f64
    }

    /// Frames elapsed since the clock started
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Advance by a number of frames
    pub fn advance_frames(&mut self, frames: u64) {
        self.frames = self.frames.saturating_add(frames);
    }

    /// Advance by (approximately) a number of seconds, rounded to whole frames
    pub fn advance_secs(&mut self, secs: f64) {
        if secs > 0.0 {
            self.advance_frames((secs * self.sample_rate as f64).round() as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let clock = AudioClock::new(44100);
        assert_eq!(clock.now(), 0.0);
        assert_eq!(clock.frames(), 0);
    }

    #[test]
    fn test_advance() {
        let mut clock = AudioClock::new(44100);
        clock.advance_frames(22050);
        assert!((clock.now() - 0.5).abs() < 1e-12);
        clock.advance_secs(1.5);
        assert!((clock.now() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_never_moves_backwards() {
        let mut clock = AudioClock::new(44100);
        clock.advance_secs(1.0);
        clock.advance_secs(-5.0);
        assert!((clock.now() - 1.0).abs() < 1e-12);
    }
}
