// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio output via cpal.
//!
//! Drives a [`SliceMixer`] from the device callback, which also makes the
//! mixer's frame count the hardware-derived audio clock.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{AudioError, SliceMixer};

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioConfig {
    /// Output device name (None = system default)
    #[serde(default)]
    pub device: Option<String>,
    /// Sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Buffer size in frames
    #[serde(default = "default_buffer_size")]
    pub buffer_size: u32,
    /// Number of output channels
    #[serde(default = "default_channels")]
    pub channels: u16,
}

fn default_sample_rate() -> u32 {
    44100
}
fn default_buffer_size() -> u32 {
    512
}
fn default_channels() -> u16 {
    2
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            channels: default_channels(),
        }
    }
}

impl AudioConfig {
    /// Output latency of one buffer in milliseconds
    pub fn latency_ms(&self) -> f64 {
        (self.buffer_size as f64 / self.sample_rate as f64) * 1000.0
    }
}

/// Audio output stream
pub struct AudioOutput {
    /// cpal stream
    _stream: Stream,
    /// Output device
    _device: Device,
    /// Mixer feeding the stream
    mixer: Arc<SliceMixer>,
    /// Current configuration
    config: AudioConfig,
}

impl AudioOutput {
    /// Open the configured device and start streaming an empty mixer
    pub fn open(config: AudioConfig) -> Result<Self, AudioError> {
        let host = cpal::default_host();

        let device = match config.device.as_deref() {
            Some(name) => host
                .output_devices()
                .map_err(|e| AudioError::InitFailed(format!("Failed to list devices: {}", e)))?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or(AudioError::NoDevice)?,
            None => host.default_output_device().ok_or(AudioError::NoDevice)?,
        };

        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };

        let mixer = Arc::new(SliceMixer::new(config.sample_rate));
        let channels = config.channels as usize;

        let stream = {
            let mixer = Arc::clone(&mixer);
            device
                .build_output_stream(
                    &stream_config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        mixer.render(data, channels);
                    },
                    move |err| {
                        error!(err = %err, "Audio stream error");
                    },
                    None, // No timeout
                )
                .map_err(|e| AudioError::StreamFailed(format!("Failed to build stream: {}", e)))?
        };

        stream
            .play()
            .map_err(|e| AudioError::StreamFailed(format!("Failed to start stream: {}", e)))?;

        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            latency_ms = config.latency_ms(),
            "Audio output started."
        );

        Ok(Self {
            _stream: stream,
            _device: device,
            mixer,
            config,
        })
    }

    /// Mixer rendered by this stream; also the audio clock
    pub fn mixer(&self) -> Arc<SliceMixer> {
        Arc::clone(&self.mixer)
    }

    /// Get current configuration
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }
}

/// Names of available output devices
pub fn list_devices() -> Vec<String> {
    let host = cpal::default_host();
    host.output_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}

/// Get default device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}
