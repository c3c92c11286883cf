//! Tape Engine Module
//!
//! Core audio engine including:
//! - Tape buffer management and the reverse cache
//! - The frame-driven engine clock
//! - Playback sources and the per-tape transport
//! - Recording sessions and input sources
//! - File I/O operations

pub mod buffer;
pub mod clock;
pub mod io;
pub mod recording;
pub mod source;
pub mod transport;

pub use buffer::{concat_chunks, db_to_linear, linear_to_db, ReverseCache, TapeBuffer};
pub use clock::AudioClock;
pub use io::{
    decode_wav_bytes, export_buffer, export_wav, generate_test_tone, import_wav, resample_buffer,
    tape_name_from_path, ExportFormat,
};
pub use recording::{BufferInput, ChannelInput, InputSource, RecordingProgress, RecordingSession};
pub use source::{Direction, PlaybackSource};
pub use transport::{Tape, TransportState};
