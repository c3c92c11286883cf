//! Playback sources
//!
//! A source is a looped, rate-scaled read head over a tape's samples. Reverse
//! playback reads the reversed copy of the buffer forwards, so a source only
//! ever moves its cursor in one direction. Sources are cheap to build and are
//! rebuilt on every seek; they never carry transport state of their own.

use std::sync::Arc;

/// Which copy of the samples a source reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Reads the tape's samples
    Forward,
    /// Reads the reversed copy of the tape's samples
    Reverse,
}

/// Looped read head with linear interpolation and a fade-in ramp
#[derive(Debug, Clone)]
pub struct PlaybackSource {
    samples: Arc<[f32]>,
    direction: Direction,
    /// Read position in samples of `samples`, always in [0, len)
    cursor: f64,
    /// Samples advanced per output frame (non-negative)
    speed: f64,
    ramp_len: usize,
    ramp_pos: usize,
}

impl PlaybackSource {
    /// Start a source at a forward tape position given in samples
    ///
    /// # Arguments
    /// * `samples` - Forward samples for `Direction::Forward`, reversed samples
    ///   for `Direction::Reverse`
    /// * `direction` - Which buffer `samples` is
    /// * `position` - Tape position in samples of the *forward* buffer
    /// * `declick_frames` - Length of the fade-in ramp (0 disables it)
    pub fn start(
        samples: Arc<[f32]>,
        direction: Direction,
        position: f64,
        declick_frames: usize,
    ) -> Self {
        let len = samples.len() as f64;
        let cursor = if len == 0.0 {
            0.0
        } else {
            match direction {
                Direction::Forward => position.rem_euclid(len),
                // Forward index i lives at reversed index len - 1 - i.
                Direction::Reverse => (len - 1.0 - position).rem_euclid(len),
            }
        };

        Self {
            samples,
            direction,
            cursor,
            speed: 1.0,
            ramp_len: declick_frames,
            ramp_pos: 0,
        }
    }

    /// Set the playback speed; only the magnitude is used
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.abs();
    }

    /// Current speed
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Direction this source plays in
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current tape position in samples of the forward buffer
    pub fn tape_position(&self) -> f64 {
        let len = self.samples.len() as f64;
        if len == 0.0 {
            return 0.0;
        }
        match self.direction {
            Direction::Forward => self.cursor,
            Direction::Reverse => (len - 1.0 - self.cursor).rem_euclid(len),
        }
    }

    /// Produce the next output sample and advance the cursor
    pub fn next_sample(&mut self) -> f32 {
        let len = self.samples.len();
        if len == 0 {
            return 0.0;
        }

        let index = self.cursor.floor() as usize % len;
        let next = (index + 1) % len;
        let frac = (self.cursor - self.cursor.floor()) as f32;
        let mut sample = self.samples[index] * (1.0 - frac) + self.samples[next] * frac;

        if self.ramp_pos < self.ramp_len {
            sample *= self.ramp_pos as f32 / self.ramp_len as f32;
            self.ramp_pos += 1;
        }

        self.cursor = (self.cursor + self.speed).rem_euclid(len as f64);
        sample
    }

    /// Mix `out.len()` frames of this source, scaled by `gain`, into `out`
    pub fn render_add(&mut self, out: &mut [f32], gain: f32) {
        for frame in out.iter_mut() {
            *frame += self.next_sample() * gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(len: usize) -> Arc<[f32]> {
        (0..len).map(|i| i as f32).collect::<Vec<_>>().into()
    }

    fn reversed(samples: &Arc<[f32]>) -> Arc<[f32]> {
        samples.iter().rev().copied().collect::<Vec<_>>().into()
    }

    #[test]
    fn test_forward_unity_speed_reproduces_buffer() {
        let samples = ramp(8);
        let mut source = PlaybackSource::start(samples, Direction::Forward, 2.0, 0);
        let mut out = vec![0.0; 4];
        source.render_add(&mut out, 1.0);
        assert_eq!(out, vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_forward_loops() {
        let samples = ramp(4);
        let mut source = PlaybackSource::start(samples, Direction::Forward, 3.0, 0);
        let out: Vec<f32> = (0..3).map(|_| source.next_sample()).collect();
        assert_eq!(out, vec![3.0, 0.0, 1.0]);
    }

    #[test]
    fn test_reverse_plays_backwards_from_position() {
        let samples = ramp(8);
        let mut source = PlaybackSource::start(reversed(&samples), Direction::Reverse, 5.0, 0);
        let out: Vec<f32> = (0..4).map(|_| source.next_sample()).collect();
        assert_eq!(out, vec![5.0, 4.0, 3.0, 2.0]);
    }

    #[test]
    fn test_reverse_tape_position_tracks_cursor() {
        let samples = ramp(8);
        let mut source = PlaybackSource::start(reversed(&samples), Direction::Reverse, 5.0, 0);
        assert_relative_eq!(source.tape_position(), 5.0);
        source.next_sample();
        source.next_sample();
        assert_relative_eq!(source.tape_position(), 3.0);
    }

    #[test]
    fn test_half_speed_interpolates() {
        let samples = ramp(8);
        let mut source = PlaybackSource::start(samples, Direction::Forward, 0.0, 0);
        source.set_speed(-0.5);
        assert_relative_eq!(source.speed(), 0.5);
        let out: Vec<f32> = (0..4).map(|_| source.next_sample()).collect();
        assert_eq!(out, vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_declick_ramp() {
        let samples: Arc<[f32]> = vec![1.0; 16].into();
        let mut source = PlaybackSource::start(samples, Direction::Forward, 0.0, 4);
        let out: Vec<f32> = (0..6).map(|_| source.next_sample()).collect();
        assert_eq!(out, vec![0.0, 0.25, 0.5, 0.75, 1.0, 1.0]);
    }

    #[test]
    fn test_gain_applied() {
        let samples: Arc<[f32]> = vec![1.0; 4].into();
        let mut source = PlaybackSource::start(samples, Direction::Forward, 0.0, 0);
        let mut out = vec![0.5; 2];
        source.render_add(&mut out, 0.25);
        assert_eq!(out, vec![0.75, 0.75]);
    }

    #[test]
    fn test_empty_buffer_is_silent() {
        let samples: Arc<[f32]> = Vec::new().into();
        let mut source = PlaybackSource::start(samples, Direction::Reverse, 3.0, 0);
        assert_eq!(source.next_sample(), 0.0);
        assert_eq!(source.tape_position(), 0.0);
    }
}
