//! Audio file I/O for Reeltape
//!
//! Tapes are mono at the session sample rate. Imported WAV files are
//! converted to 32-bit float, down-mixed by averaging channels and resampled
//! with linear interpolation. Exports write mono WAV at 16, 24 or 32 bits.

use std::io::{Cursor, Read};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};
use num_traits::ToPrimitive;

use crate::engine::buffer::TapeBuffer;
use crate::error::{ReelError, Result};

/// File extensions accepted by [`import_wav`]
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "wave"];

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// Bit depth: 16, 24, or 32 (float). Default: 24
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat { bit_depth: 24 }
    }
}

impl ExportFormat {
    /// Create a new export format with the given bit depth
    pub fn new(bit_depth: u16) -> Self {
        ExportFormat { bit_depth }
    }
}

// ============================================================================
// Import
// ============================================================================

/// Import a WAV file as a mono tape buffer at `target_rate`
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `UnsupportedFormat` - If the extension is not a WAV extension, or the
///   sample encoding is not supported
/// * `InvalidAudio` - If the file cannot be decoded
/// * `EmptyAudio` - If the file contains no samples
pub fn import_wav(path: &Path, target_rate: u32) -> Result<TapeBuffer> {
    if !path.exists() {
        return Err(ReelError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if !SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
            return Err(ReelError::UnsupportedFormat {
                format: format!(".{} files (only WAV is supported)", ext),
            });
        }
    }

    let reader = WavReader::open(path).map_err(|e| ReelError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let buffer = decode_reader(reader, target_rate)?;
    info!(
        "Imported {} ({:.2}s, {} samples)",
        path.display(),
        buffer.duration_secs(),
        buffer.len()
    );
    Ok(buffer)
}

/// Decode in-memory WAV bytes as a mono tape buffer at `target_rate`
pub fn decode_wav_bytes(bytes: &[u8], target_rate: u32) -> Result<TapeBuffer> {
    let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| ReelError::InvalidAudio {
        reason: format!("Failed to parse WAV data: {}", e),
        source: Some(Box::new(e)),
    })?;
    decode_reader(reader, target_rate)
}

fn decode_reader<R: Read>(mut reader: WavReader<R>, target_rate: u32) -> Result<TapeBuffer> {
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(ReelError::InvalidAudio {
            reason: "WAV header declares zero channels".to_string(),
            source: None,
        });
    }

    let interleaved = read_samples_as_f32(&mut reader, spec.bits_per_sample, spec.sample_format)?;
    if interleaved.is_empty() {
        return Err(ReelError::EmptyAudio);
    }

    let mono = downmix(&interleaved, channels);
    let samples = if spec.sample_rate != target_rate {
        debug!("Resampling {} Hz -> {} Hz", spec.sample_rate, target_rate);
        resample_linear(&mono, target_rate as f64 / spec.sample_rate as f64)
    } else {
        mono
    };

    Ok(TapeBuffer::new(samples, target_rate))
}

/// Derive a tape name from a file path: the file name with its last
/// extension stripped
///
/// A leading dot counts as an extension separator, so `.hidden` names an
/// unnamed tape.
pub fn tape_name_from_path(path: &Path) -> String {
    let Some(file_name) = path.file_name() else {
        return String::new();
    };
    let name = file_name.to_string_lossy();
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() => name[..dot].to_string(),
        _ => name.into_owned(),
    }
}

/// Resample a buffer to `target_rate` (returned as is if already there)
pub fn resample_buffer(buffer: &TapeBuffer, target_rate: u32) -> TapeBuffer {
    if buffer.sample_rate() == target_rate {
        return buffer.clone();
    }
    let ratio = target_rate as f64 / buffer.sample_rate() as f64;
    TapeBuffer::new(resample_linear(buffer.samples(), ratio), target_rate)
}

// ============================================================================
// Export
// ============================================================================

/// Export mono samples to a WAV file
///
/// # Arguments
/// * `samples` - Mono samples
/// * `sample_rate` - Sample rate to write in the header
/// * `path` - Path where the file will be written
/// * `format` - Export bit depth
pub fn export_wav(samples: &[f32], sample_rate: u32, path: &Path, format: ExportFormat) -> Result<()> {
    let sample_format = match format.bit_depth {
        16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        other => {
            return Err(ReelError::UnsupportedFormat {
                format: format!("{}-bit audio (only 16, 24, 32 supported)", other),
            })
        }
    };

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format,
    };

    let mut writer = WavWriter::create(path, spec).map_err(wav_write_error)?;

    match format.bit_depth {
        16 => {
            for &sample in samples {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(wav_write_error)?;
            }
        }
        24 => {
            for &sample in samples {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(wav_write_error)?;
            }
        }
        _ => {
            for &sample in samples {
                writer.write_sample(sample).map_err(wav_write_error)?;
            }
        }
    }

    writer.finalize().map_err(wav_write_error)?;
    info!("Exported {} samples to {}", samples.len(), path.display());
    Ok(())
}

/// Export a tape buffer to a WAV file at its own sample rate
pub fn export_buffer(buffer: &TapeBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    export_wav(buffer.samples(), buffer.sample_rate(), path, format)
}

/// Generate a mono test tone (sine wave)
///
/// # Arguments
/// * `frequency` - Frequency of the sine wave in Hz
/// * `duration_secs` - Duration of the tone in seconds
/// * `sample_rate` - Sample rate in Hz
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> TapeBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
    let samples = (0..num_samples)
        .map(|i| (angular_freq * i as f32).sin())
        .collect();
    TapeBuffer::new(samples, sample_rate)
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn wav_write_error(e: hound::Error) -> ReelError {
    match e {
        hound::Error::IoError(io) => ReelError::Io(io),
        other => ReelError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            other.to_string(),
        )),
    }
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: Read>(
    reader: &mut WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| ReelError::InvalidAudio {
                reason: format!("Failed to read float samples: {}", e),
                source: Some(Box::new(e)),
            }),
        SampleFormat::Int => match bits_per_sample {
            8 => read_int_samples::<R, i8>(reader, bits_per_sample),
            16 => read_int_samples::<R, i16>(reader, bits_per_sample),
            // 24-bit stored as i32 in hound
            24 | 32 => read_int_samples::<R, i32>(reader, bits_per_sample),
            _ => Err(ReelError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits_per_sample),
            }),
        },
    }
}

/// Read integer samples, normalising full scale to [-1.0, 1.0)
fn read_int_samples<R, S>(reader: &mut WavReader<R>, bits_per_sample: u16) -> Result<Vec<f32>>
where
    R: Read,
    S: hound::Sample + ToPrimitive,
{
    let full_scale = (1u64 << (bits_per_sample - 1)) as f64;
    reader
        .samples::<S>()
        .map(|s| s.map(|v| (v.to_f64().unwrap_or(0.0) / full_scale) as f32))
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|e| ReelError::InvalidAudio {
            reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
            source: Some(Box::new(e)),
        })
}

/// Average interleaved frames down to one channel
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear interpolation resampling
fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ============================================================================
// Tests
// ============================================================================
