//! Tape Buffer Management
//!
//! Tapes hold a single channel of 32-bit float samples at the fixed session
//! sample rate. Sample data is shared (`Arc<[f32]>`) so copying a tape is
//! cheap; content changes always produce a new buffer with a fresh version
//! stamp, which is what derived caches (the reversed copy) key on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// Helper Functions
// ============================================================================

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// Convert decibels to linear amplitude
///
/// # Arguments
/// * `db` - Value in decibels
///
/// # Returns
/// Linear amplitude (0.0 to 1.0+ range)
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Concatenate sample blocks in order into one contiguous vector
///
/// The result holds exactly the sum of the block lengths.
pub fn concat_chunks<C: AsRef<[f32]>>(chunks: &[C]) -> Vec<f32> {
    let total: usize = chunks.iter().map(|c| c.as_ref().len()).sum();
    let mut out = Vec::with_capacity(total);
    for chunk in chunks {
        out.extend_from_slice(chunk.as_ref());
    }
    out
}

// ============================================================================
// Tape Buffer
// ============================================================================

/// Decoded mono audio owned by a tape
///
/// # Example
/// ```
/// use reeltape::engine::TapeBuffer;
///
/// let buffer = TapeBuffer::silence(44100, 44100);
/// assert_eq!(buffer.len(), 44100);
/// assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct TapeBuffer {
    samples: Arc<[f32]>,
    sample_rate: u32,
    version: u64,
}

impl TapeBuffer {
    /// Wrap decoded samples
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            version: next_version(),
        }
    }

    /// Create a silent buffer of `num_samples` samples
    pub fn silence(num_samples: usize, sample_rate: u32) -> Self {
        Self::new(vec![0.0; num_samples], sample_rate)
    }

    /// Build a buffer from recorded blocks, preserving order and length
    pub fn from_chunks<C: AsRef<[f32]>>(chunks: &[C], sample_rate: u32) -> Self {
        Self::new(concat_chunks(chunks), sample_rate)
    }

    /// Sample data
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Shared handle to the sample data
    #[inline]
    pub fn shared(&self) -> Arc<[f32]> {
        Arc::clone(&self.samples)
    }

    /// Number of samples
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Version stamp, unique per content
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Time-reversed copy of the samples
    pub fn reversed(&self) -> Arc<[f32]> {
        self.samples.iter().rev().copied().collect::<Vec<f32>>().into()
    }

    /// Check whether two buffers share the same sample storage
    pub fn shares_samples_with(&self, other: &TapeBuffer) -> bool {
        Arc::ptr_eq(&self.samples, &other.samples)
    }
}

// ============================================================================
// Reverse Cache
// ============================================================================

/// Lazily built reversed copy of a [`TapeBuffer`]
///
/// Stale once the source buffer's version changes.
#[derive(Debug, Clone, Default)]
pub struct ReverseCache {
    cached: Option<(u64, Arc<[f32]>)>,
}

impl ReverseCache {
    /// Return the reversed samples, rebuilding them if missing or stale
    pub fn get_or_build(&mut self, buffer: &TapeBuffer) -> Arc<[f32]> {
        match &self.cached {
            Some((version, samples)) if *version == buffer.version() => Arc::clone(samples),
            _ => {
                let reversed = buffer.reversed();
                self.cached = Some((buffer.version(), Arc::clone(&reversed)));
                reversed
            }
        }
    }

    /// Drop the cached copy
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Check whether a copy matching `buffer` is cached
    pub fn is_fresh_for(&self, buffer: &TapeBuffer) -> bool {
        matches!(&self.cached, Some((version, _)) if *version == buffer.version())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_to_linear() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-6.0206) - 0.5).abs() < 1e-4);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_linear_to_db() {
        assert!((linear_to_db(1.0) - 0.0).abs() < 1e-6);
        assert!((linear_to_db(0.1) - (-20.0)).abs() < 1e-4);
        assert!(linear_to_db(0.0).is_infinite() && linear_to_db(0.0).is_sign_negative());
    }

    #[test]
    fn test_concat_chunks_preserves_length_and_order() {
        let chunks: Vec<Vec<f32>> = [100usize, 250, 37]
            .iter()
            .enumerate()
            .map(|(i, &len)| vec![i as f32; len])
            .collect();

        let joined = concat_chunks(&chunks);
        assert_eq!(joined.len(), 387);
        assert!(joined[..100].iter().all(|&s| s == 0.0));
        assert!(joined[100..350].iter().all(|&s| s == 1.0));
        assert!(joined[350..].iter().all(|&s| s == 2.0));
    }

    #[test]
    fn test_concat_no_chunks() {
        let chunks: Vec<Vec<f32>> = Vec::new();
        assert!(concat_chunks(&chunks).is_empty());
    }

    #[test]
    fn test_duration() {
        let buffer = TapeBuffer::silence(22050, 44100);
        assert!((buffer.duration_secs() - 0.5).abs() < 1e-12);
        assert_eq!(TapeBuffer::silence(10, 0).duration_secs(), 0.0);
    }

    #[test]
    fn test_versions_are_unique() {
        let a = TapeBuffer::new(vec![0.0; 4], 44100);
        let b = TapeBuffer::new(vec![0.0; 4], 44100);
        assert_ne!(a.version(), b.version());
        // Cloning shares content and version
        let c = a.clone();
        assert_eq!(a.version(), c.version());
        assert!(a.shares_samples_with(&c));
        assert!(!a.shares_samples_with(&b));
    }

    #[test]
    fn test_reversed() {
        let buffer = TapeBuffer::new(vec![1.0, 2.0, 3.0], 44100);
        assert_eq!(&*buffer.reversed(), &[3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_reverse_cache_rebuilds_when_stale() {
        let mut cache = ReverseCache::default();
        let first = TapeBuffer::new(vec![1.0, 2.0], 44100);
        let rev = cache.get_or_build(&first);
        assert_eq!(&*rev, &[2.0, 1.0]);
        assert!(cache.is_fresh_for(&first));

        // Same buffer reuses the cached allocation
        let again = cache.get_or_build(&first);
        assert!(Arc::ptr_eq(&rev, &again));

        let second = TapeBuffer::new(vec![5.0, 6.0, 7.0], 44100);
        assert!(!cache.is_fresh_for(&second));
        assert_eq!(&*cache.get_or_build(&second), &[7.0, 6.0, 5.0]);

        cache.invalidate();
        assert!(!cache.is_fresh_for(&second));
    }
}
