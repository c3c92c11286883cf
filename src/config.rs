//! Deck configuration
//!
//! Loaded from a JSON file; every field has a default so an empty object (or
//! no file at all) yields a working deck.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, Result};

/// Fixed session sample rate used for every tape and recording (44.1kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Samples pulled from an input source per recording block
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Interval at which the UI polls tape positions
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30;

/// Amount of new audio between recording progress notifications
pub const DEFAULT_PROGRESS_INTERVAL_SECS: f64 = 0.1;

/// Length of the silent tape created when a recording starts
pub const DEFAULT_PLACEHOLDER_SECS: f64 = 0.1;

/// Fade-in length applied to freshly built playback sources
pub const DEFAULT_DECLICK_FRAMES: usize = 64;

/// Runtime configuration for a [`Deck`](crate::session::Deck)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Session sample rate in Hz
    pub sample_rate: u32,

    /// Block size for recording input
    pub block_size: usize,

    /// UI position poll interval in milliseconds
    pub poll_interval_ms: u64,

    /// Seconds of new audio between recording progress callbacks
    pub progress_interval_secs: f64,

    /// Duration of the placeholder tape created on record start
    pub placeholder_secs: f64,

    /// De-click ramp length in frames (0 disables the ramp)
    pub declick_frames: usize,

    /// Asset names preloaded from the asset directory (`<dir>/<name>.wav`).
    /// When empty, every WAV file in the directory is loaded.
    pub preload: Vec<String>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            progress_interval_secs: DEFAULT_PROGRESS_INTERVAL_SECS,
            placeholder_secs: DEFAULT_PLACEHOLDER_SECS,
            declick_frames: DEFAULT_DECLICK_FRAMES,
            preload: Vec::new(),
        }
    }
}

impl DeckConfig {
    /// Load configuration from a JSON file
    ///
    /// # Errors
    /// * `FileNotFound` - If the file does not exist
    /// * `Serialization` - If the JSON is malformed
    /// * `Config` - If a value is out of range
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ReelError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        })?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: DeckConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(ReelError::Config {
                reason: "sample_rate must be positive".to_string(),
            });
        }
        if self.block_size == 0 {
            return Err(ReelError::Config {
                reason: "block_size must be positive".to_string(),
            });
        }
        if !(self.progress_interval_secs.is_finite() && self.progress_interval_secs > 0.0) {
            return Err(ReelError::Config {
                reason: "progress_interval_secs must be a positive number".to_string(),
            });
        }
        if !(self.placeholder_secs.is_finite() && self.placeholder_secs > 0.0) {
            return Err(ReelError::Config {
                reason: "placeholder_secs must be a positive number".to_string(),
            });
        }
        Ok(())
    }

    /// Number of samples between recording progress notifications
    pub fn progress_interval_samples(&self) -> usize {
        (self.progress_interval_secs * self.sample_rate as f64).round() as usize
    }

    /// Number of samples in a placeholder tape
    pub fn placeholder_samples(&self) -> usize {
        ((self.placeholder_secs * self.sample_rate as f64).round() as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = DeckConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.poll_interval_ms, 30);
        assert_eq!(config.progress_interval_samples(), 4410);
        assert_eq!(config.placeholder_samples(), 4410);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = DeckConfig::from_json("{}").unwrap();
        assert_eq!(config, DeckConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config =
            DeckConfig::from_json(r#"{"sample_rate": 48000, "preload": ["Tim", "Ian"]}"#).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.preload, vec!["Tim".to_string(), "Ian".to_string()]);
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let err = DeckConfig::from_json(r#"{"sample_rate": 0}"#).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_malformed_json() {
        let err = DeckConfig::from_json("{ sample_rate: ").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.json");
        fs::write(&path, r#"{"block_size": 256}"#).unwrap();

        let config = DeckConfig::load(&path).unwrap();
        assert_eq!(config.block_size, 256);
    }

    #[test]
    fn test_load_missing_file() {
        let err = DeckConfig::load(Path::new("/nonexistent/deck.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }
}
