//! Error handling for Reeltape
//!
//! Every error carries a stable code and, where it helps, recovery
//! suggestions. None of these are fatal: the deck keeps running after any of
//! them.

use thiserror::Error;

use crate::session::TapeId;

/// Result type alias for Reeltape operations
pub type Result<T> = std::result::Result<T, ReelError>;

/// Main error type for Reeltape operations
#[derive(Error, Debug)]
pub enum ReelError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    // Device Errors
    #[error("No audio input source available")]
    NoInputSource,

    #[error("Audio device error: {reason}")]
    Device { reason: String },

    // Operation Errors
    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("Tape not found: {0}")]
    TapeNotFound(TapeId),

    #[error("Invalid {name}: {value}")]
    InvalidValue { name: &'static str, value: f64 },

    #[error("Input sample rate {input} Hz does not match deck rate {deck} Hz")]
    SampleRateMismatch { input: u32, deck: u32 },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReelError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ReelError::FileNotFound { .. } => "FILE_NOT_FOUND",
            ReelError::InvalidAudio { .. } => "INVALID_AUDIO",
            ReelError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            ReelError::EmptyAudio => "EMPTY_AUDIO",
            ReelError::NoInputSource => "NO_INPUT_SOURCE",
            ReelError::Device { .. } => "DEVICE_ERROR",
            ReelError::AlreadyRecording => "ALREADY_RECORDING",
            ReelError::NotRecording => "NOT_RECORDING",
            ReelError::TapeNotFound(_) => "TAPE_NOT_FOUND",
            ReelError::InvalidValue { .. } => "INVALID_VALUE",
            ReelError::SampleRateMismatch { .. } => "SAMPLE_RATE_MISMATCH",
            ReelError::Config { .. } => "CONFIG_ERROR",
            ReelError::Io(_) => "IO_ERROR",
            ReelError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave the deck untouched; the caller can retry with
    /// different input.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ReelError::Config { .. } | ReelError::Io(_) | ReelError::Serialization(_)
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ReelError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            ReelError::InvalidAudio { .. } => vec![
                "Check if the file plays in another application",
                "The file may be corrupted - try re-exporting from source",
            ],
            ReelError::UnsupportedFormat { .. } => vec![
                "Convert the file to WAV format",
                "Supported encodings: 8/16/24/32-bit integer and 32-bit float PCM",
            ],
            ReelError::NoInputSource | ReelError::Device { .. } => vec![
                "Check that a microphone is connected",
                "Grant microphone access to this application",
                "Load existing tapes instead of recording",
            ],
            ReelError::AlreadyRecording => vec!["Stop the current recording first"],
            ReelError::SampleRateMismatch { .. } => {
                vec!["Set the deck sample rate to match the input device"]
            }
            _ => vec![],
        }
    }
}
