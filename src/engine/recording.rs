//! Recording sessions
//!
//! A recording pulls fixed-size blocks from an [`InputSource`] and appends
//! them, in order, to an append-only chunk list. The chunk list has a single
//! writer while the session is active; it is only read after the source has
//! been detached, when the session is consumed into a finished buffer.

use std::fmt;
use std::sync::mpsc::{Receiver, TryRecvError};

use crate::engine::buffer::TapeBuffer;
use crate::error::Result;

// ============================================================================
// Input Sources
// ============================================================================

/// A continuous mono audio input
///
/// Sources are owned and polled by the thread that owns the deck.
pub trait InputSource {
    /// Sample rate of the blocks this source produces
    fn sample_rate(&self) -> u32;

    /// Return the next available block, or `None` if nothing is ready
    ///
    /// Must not block.
    fn read_block(&mut self) -> Option<Vec<f32>>;

    /// Human-readable source description for logs
    fn describe(&self) -> String {
        "input".to_string()
    }

    /// Begin producing blocks (called when a recording starts)
    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    /// Stop producing blocks (called when a recording stops)
    fn pause(&mut self) {}
}

/// Input source that replays a buffer in fixed-size blocks
///
/// Used to record from a file, and in tests in place of a microphone.
#[derive(Debug, Clone)]
pub struct BufferInput {
    samples: Vec<f32>,
    sample_rate: u32,
    block_size: usize,
    cursor: usize,
}

impl BufferInput {
    /// Create an input that yields `samples` in blocks of `block_size`
    pub fn new(samples: Vec<f32>, sample_rate: u32, block_size: usize) -> Self {
        Self {
            samples,
            sample_rate,
            block_size: block_size.max(1),
            cursor: 0,
        }
    }

    /// Check whether every sample has been read
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.samples.len()
    }
}

impl InputSource for BufferInput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_block(&mut self) -> Option<Vec<f32>> {
        if self.is_exhausted() {
            return None;
        }
        let end = (self.cursor + self.block_size).min(self.samples.len());
        let block = self.samples[self.cursor..end].to_vec();
        self.cursor = end;
        Some(block)
    }

    fn describe(&self) -> String {
        format!("buffer ({} samples)", self.samples.len())
    }
}

/// Input source fed by another thread through a channel
///
/// The producer (typically an audio device callback) is the only writer.
pub struct ChannelInput {
    receiver: Receiver<Vec<f32>>,
    sample_rate: u32,
    name: String,
}

impl ChannelInput {
    /// Wrap the receiving end of a block channel
    pub fn new(receiver: Receiver<Vec<f32>>, sample_rate: u32, name: impl Into<String>) -> Self {
        Self {
            receiver,
            sample_rate,
            name: name.into(),
        }
    }
}

impl fmt::Debug for ChannelInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelInput")
            .field("sample_rate", &self.sample_rate)
            .field("name", &self.name)
            .finish()
    }
}

impl InputSource for ChannelInput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_block(&mut self) -> Option<Vec<f32>> {
        match self.receiver.try_recv() {
            Ok(block) => Some(block),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

// ============================================================================
// Recording Session
// ============================================================================

/// Progress notification emitted while recording
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordingProgress {
    /// Samples recorded so far
    pub samples: usize,
    /// Elapsed recorded time in seconds
    pub elapsed_secs: f64,
}

/// Accumulates recorded blocks until the recording stops
#[derive(Debug, Clone)]
pub struct RecordingSession {
    active: bool,
    chunks: Vec<Vec<f32>>,
    sample_rate: u32,
    total_samples: usize,
    last_progress_at: usize,
    progress_interval: usize,
}

impl RecordingSession {
    /// Start an active session
    ///
    /// # Arguments
    /// * `sample_rate` - Fixed sample rate of every appended block
    /// * `progress_interval` - Samples of new audio between progress reports
    pub fn new(sample_rate: u32, progress_interval: usize) -> Self {
        Self {
            active: true,
            chunks: Vec::new(),
            sample_rate,
            total_samples: 0,
            last_progress_at: 0,
            progress_interval: progress_interval.max(1),
        }
    }

    /// Append a block; returns a progress report once enough new audio has
    /// accumulated since the previous one
    ///
    /// Blocks appended after the session was stopped are dropped.
    pub fn append(&mut self, block: Vec<f32>) -> Option<RecordingProgress> {
        if !self.active || block.is_empty() {
            return None;
        }
        self.total_samples += block.len();
        self.chunks.push(block);

        if self.total_samples - self.last_progress_at >= self.progress_interval {
            self.last_progress_at = self.total_samples;
            Some(self.progress())
        } else {
            None
        }
    }

    /// Mark the session inactive; further blocks are ignored
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Check whether the session still accepts blocks
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current progress
    pub fn progress(&self) -> RecordingProgress {
        RecordingProgress {
            samples: self.total_samples,
            elapsed_secs: self.elapsed_secs(),
        }
    }

    /// Samples recorded so far
    pub fn total_samples(&self) -> usize {
        self.total_samples
    }

    /// Number of blocks recorded so far
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Recorded time in seconds
    pub fn elapsed_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.total_samples as f64 / self.sample_rate as f64
    }

    /// Sample rate of the recording
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Consume the session into one contiguous buffer
    pub fn finish(self) -> TapeBuffer {
        TapeBuffer::from_chunks(&self.chunks, self.sample_rate)
    }
}
