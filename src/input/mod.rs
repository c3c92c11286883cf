//! Live Audio Input Module
//!
//! Microphone access for the deck. With the `live-input` feature the default
//! cpal input device is captured; without it, or when no device can be
//! opened, the deck runs without live input.

#[cfg(feature = "live-input")]
mod live;

#[cfg(feature = "live-input")]
pub use live::LiveInput;

use log::{info, warn};

use crate::engine::InputSource;

/// Open the default microphone at `sample_rate`
///
/// Returns `None` (with a logged notice) when no usable device exists, access
/// is denied, or live input support was not compiled in.
pub fn request_microphone(sample_rate: u32) -> Option<Box<dyn InputSource>> {
    #[cfg(feature = "live-input")]
    {
        match LiveInput::open(sample_rate) {
            Ok(input) => {
                info!("[INPUT] Microphone ready: {}", input.describe());
                Some(Box::new(input))
            }
            Err(e) => {
                warn!("[INPUT] Microphone unavailable: {}", e);
                for suggestion in e.recovery_suggestions() {
                    info!("[INPUT]   {}", suggestion);
                }
                None
            }
        }
    }

    #[cfg(not(feature = "live-input"))]
    {
        warn!("[INPUT] Built without live input support; recording from a microphone is disabled");
        info!("[INPUT] Rebuild with `--features live-input` to capture at {} Hz", sample_rate);
        None
    }
}

/// Mix interleaved frames down to mono by averaging channels
pub fn downmix_interleaved<T: Copy>(data: &[T], channels: usize, to_f32: impl Fn(T) -> f32) -> Vec<f32> {
    let channels = channels.max(1);
    data.chunks(channels)
        .map(|frame| frame.iter().map(|&s| to_f32(s)).sum::<f32>() / frame.len() as f32)
        .collect()
}
