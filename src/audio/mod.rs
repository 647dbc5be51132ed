// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio side of the kit player.
//!
//! This module provides:
//! - The shared kit recording as an in-memory buffer
//! - Scheduled, envelope-shaped slices of that buffer
//! - The output device seam, a sample-accurate slice mixer and a mock
//! - Audio output via cpal

pub mod envelope;
pub mod mixer;
pub mod mock;
pub mod output;
pub mod wav;

pub use envelope::{SliceEnvelope, DEFAULT_FADE_SECONDS};
pub use mixer::SliceMixer;
pub use mock::MockOutput;
pub use output::{AudioConfig, AudioOutput};

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Audio error types
#[derive(Debug, Error)]
pub enum AudioError {
    /// Failed to initialize audio
    #[error("audio initialization failed: {0}")]
    InitFailed(String),
    /// Failed to start audio stream
    #[error("audio stream failed: {0}")]
    StreamFailed(String),
    /// No audio device available
    #[error("no audio device available")]
    NoDevice,
    /// Failed to read a WAV file
    #[error("failed to read WAV file: {0}")]
    Wav(#[from] hound::Error),
    /// Sample format the loader does not handle
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    /// Buffer shape is unusable
    #[error("invalid audio buffer: {0}")]
    InvalidBuffer(String),
    /// Slice parameters are unusable
    #[error("invalid slice: {0}")]
    InvalidSlice(String),
    /// Failed to acquire lock
    #[error("failed to acquire audio lock")]
    LockFailed,
}

/// Decoded kit recording, interleaved `f32` samples
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Wrap interleaved samples. A trailing partial frame is dropped.
    pub fn new(mut samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self, AudioError> {
        if channels == 0 {
            return Err(AudioError::InvalidBuffer("zero channels".to_string()));
        }
        if sample_rate == 0 {
            return Err(AudioError::InvalidBuffer("zero sample rate".to_string()));
        }
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);

        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Number of channels
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Raw interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    fn frame_sample(&self, frame: usize, channel: usize) -> f32 {
        self.samples
            .get(frame * self.channels as usize + channel)
            .copied()
            .unwrap_or(0.0)
    }

    /// Sample of `channel` at `seconds`, linearly interpolated.
    ///
    /// Channels wrap, so a mono buffer feeds every output channel.
    /// Times outside the buffer read as silence.
    pub fn sample_at(&self, seconds: f64, channel: usize) -> f32 {
        if seconds < 0.0 {
            return 0.0;
        }
        let position = seconds * self.sample_rate as f64;
        let index = position.floor() as usize;
        if index >= self.frames() {
            return 0.0;
        }

        let channel = channel % self.channels as usize;
        let frac = (position - index as f64) as f32;
        let current = self.frame_sample(index, channel);
        let next = if index + 1 < self.frames() {
            self.frame_sample(index + 1, channel)
        } else {
            current
        };
        current + (next - current) * frac
    }
}

/// One beat of the kit recording, placed on the audio clock
#[derive(Debug, Clone)]
pub struct ScheduledSlice {
    /// Shared kit recording
    pub buffer: Arc<AudioBuffer>,
    /// Audio clock time the slice becomes audible
    pub start_time: f64,
    /// Read position in the recording, in seconds
    pub buffer_offset: f64,
    /// Gain shape; also carries the slice length
    pub envelope: SliceEnvelope,
}

impl ScheduledSlice {
    /// Slice length in seconds
    pub fn duration(&self) -> f64 {
        self.envelope.duration()
    }

    /// Audio clock time the slice falls silent
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration()
    }

    /// Enveloped sample for `channel` at audio clock time `time`
    pub fn sample(&self, time: f64, channel: usize) -> f32 {
        let local = time - self.start_time;
        let gain = self.envelope.gain_at(local);
        if gain == 0.0 {
            return 0.0;
        }
        self.buffer.sample_at(self.buffer_offset + local, channel) * gain
    }
}

/// Destination for scheduled slices
pub trait OutputDevice: fmt::Display + Send + Sync {
    /// Queue a slice for playback at its start time
    fn submit(&self, slice: ScheduledSlice) -> Result<(), AudioError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_buffer() -> AudioBuffer {
        // Mono, 10 Hz, value equals frame index
        AudioBuffer::new((0..10).map(|i| i as f32).collect(), 1, 10).unwrap()
    }

    #[test]
    fn test_buffer_shape() {
        let buffer = AudioBuffer::new(vec![0.0; 9], 2, 4).unwrap();
        assert_eq!(buffer.frames(), 4);
        assert_eq!(buffer.samples().len(), 8);
        assert_eq!(buffer.duration(), 1.0);
    }

    #[test]
    fn test_buffer_rejects_zero_channels() {
        assert!(AudioBuffer::new(vec![0.0; 4], 0, 44100).is_err());
        assert!(AudioBuffer::new(vec![0.0; 4], 1, 0).is_err());
    }

    #[test]
    fn test_sample_interpolation() {
        let buffer = ramp_buffer();
        assert!((buffer.sample_at(0.3, 0) - 3.0).abs() < 1e-5);
        assert!((buffer.sample_at(0.35, 0) - 3.5).abs() < 1e-5);
        assert_eq!(buffer.sample_at(-0.1, 0), 0.0);
        assert_eq!(buffer.sample_at(1.0, 0), 0.0);
        // Mono feeds any channel
        assert!((buffer.sample_at(0.3, 1) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_scheduled_slice_sample() {
        let slice = ScheduledSlice {
            buffer: Arc::new(ramp_buffer()),
            start_time: 2.0,
            buffer_offset: 0.5,
            envelope: SliceEnvelope::new(0.4, 0.0).unwrap(),
        };

        assert!((slice.end_time() - 2.4).abs() < 1e-9);
        assert_eq!(slice.sample(1.9, 0), 0.0);
        assert!((slice.sample(2.0, 0) - 5.0).abs() < 1e-5);
        assert!((slice.sample(2.2, 0) - 7.0).abs() < 1e-5);
        assert_eq!(slice.sample(2.5, 0), 0.0);
    }
}
