//! cpal-backed microphone input

use std::fmt::Display;
use std::sync::mpsc::{self, Sender};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use log::{debug, error, warn};

use super::downmix_interleaved;
use crate::engine::{ChannelInput, InputSource};
use crate::error::{ReelError, Result};

/// The default input device, captured as mono blocks
///
/// The device callback is the only writer of the block channel. The stream
/// starts paused and runs only while a recording is active.
pub struct LiveInput {
    stream: cpal::Stream,
    blocks: ChannelInput,
}

impl LiveInput {
    /// Open the default input device at `sample_rate`
    ///
    /// # Errors
    /// * `NoInputSource` - No input device exists
    /// * `Device` - The device cannot capture at the rate, or the stream fails
    /// * `UnsupportedFormat` - The device's sample format is not handled
    pub fn open(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(ReelError::NoInputSource)?;
        let name = device.name().unwrap_or_else(|_| "microphone".to_string());

        let supported = device
            .supported_input_configs()
            .map_err(device_error)?
            .find(|c| c.min_sample_rate().0 <= sample_rate && sample_rate <= c.max_sample_rate().0)
            .ok_or_else(|| ReelError::Device {
                reason: format!("{} cannot capture at {} Hz", name, sample_rate),
            })?
            .with_sample_rate(SampleRate(sample_rate));

        let channels = supported.channels() as usize;
        let format = supported.sample_format();
        let config: StreamConfig = supported.into();
        debug!(
            "[INPUT] Opening {} ({} channel(s), {:?}, {} Hz)",
            name, channels, format, sample_rate
        );

        let (tx, rx) = mpsc::channel();
        let err_fn = |err: cpal::StreamError| error!("[INPUT] Stream error: {}", err);

        let stream = match format {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    send_block(&tx, downmix_interleaved(data, channels, |s| s))
                },
                err_fn,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    send_block(&tx, downmix_interleaved(data, channels, |s| s as f32 / 32768.0))
                },
                err_fn,
                None,
            ),
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    send_block(
                        &tx,
                        downmix_interleaved(data, channels, |s| (s as f32 - 32768.0) / 32768.0),
                    )
                },
                err_fn,
                None,
            ),
            other => {
                return Err(ReelError::UnsupportedFormat {
                    format: format!("{:?} input", other),
                })
            }
        }
        .map_err(device_error)?;

        stream.pause().map_err(device_error)?;

        Ok(Self {
            stream,
            blocks: ChannelInput::new(rx, sample_rate, name),
        })
    }
}

impl InputSource for LiveInput {
    fn sample_rate(&self) -> u32 {
        self.blocks.sample_rate()
    }

    fn read_block(&mut self) -> Option<Vec<f32>> {
        self.blocks.read_block()
    }

    fn describe(&self) -> String {
        self.blocks.describe()
    }

    fn resume(&mut self) -> Result<()> {
        // Drop anything captured while paused
        while self.blocks.read_block().is_some() {}
        self.stream.play().map_err(device_error)
    }

    fn pause(&mut self) {
        if let Err(e) = self.stream.pause() {
            warn!("[INPUT] Failed to pause {}: {}", self.describe(), e);
        }
    }
}

fn send_block(tx: &Sender<Vec<f32>>, block: Vec<f32>) {
    // The receiver is gone once the input is dropped; nothing to do then.
    let _ = tx.send(block);
}

fn device_error(e: impl Display) -> ReelError {
    ReelError::Device {
        reason: e.to_string(),
    }
}
