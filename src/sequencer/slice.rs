// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Plays single beats of the kit recording.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::{AudioBuffer, AudioError, OutputDevice, ScheduledSlice, SliceEnvelope};

/// Slice envelope settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SliceConfig {
    /// Fade at each end of a slice, in milliseconds
    #[serde(default = "default_fade_ms")]
    pub fade_ms: f64,
}

fn default_fade_ms() -> f64 {
    5.0
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            fade_ms: default_fade_ms(),
        }
    }
}

impl SliceConfig {
    /// Fade length in seconds
    pub fn fade(&self) -> f64 {
        self.fade_ms / 1000.0
    }
}

/// Submits envelope-shaped beats of one shared buffer to an output device
#[derive(Clone)]
pub struct SlicePlayer {
    buffer: Arc<AudioBuffer>,
    output: Arc<dyn OutputDevice>,
    fade: f64,
}

impl SlicePlayer {
    /// Create a player over `buffer`
    pub fn new(buffer: Arc<AudioBuffer>, output: Arc<dyn OutputDevice>, config: &SliceConfig) -> Self {
        Self {
            buffer,
            output,
            fade: config.fade(),
        }
    }

    /// The buffer slices are read from
    pub fn buffer(&self) -> &Arc<AudioBuffer> {
        &self.buffer
    }

    /// Play `duration` seconds of the buffer from `buffer_offset`, audible
    /// at audio clock time `start_time`
    pub fn play(&self, start_time: f64, buffer_offset: f64, duration: f64) -> Result<(), AudioError> {
        let envelope = SliceEnvelope::new(duration, self.fade)?;
        if buffer_offset >= self.buffer.duration() {
            debug!(
                offset = buffer_offset,
                buffer_seconds = self.buffer.duration(),
                "Slice starts past the end of the recording"
            );
        }

        self.output.submit(ScheduledSlice {
            buffer: Arc::clone(&self.buffer),
            start_time,
            buffer_offset,
            envelope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MockOutput;

    fn player(mock: Arc<MockOutput>, fade_ms: f64) -> SlicePlayer {
        let buffer = Arc::new(AudioBuffer::new(vec![0.0; 44100], 1, 44100).unwrap());
        SlicePlayer::new(buffer, mock, &SliceConfig { fade_ms })
    }

    #[test]
    fn test_play_submits_slice() {
        let mock = Arc::new(MockOutput::new("mock"));
        let player = player(mock.clone(), 5.0);

        player.play(1.25, 0.5, 0.5).unwrap();

        let slices = mock.submitted();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].start_time, 1.25);
        assert_eq!(slices[0].buffer_offset, 0.5);
        assert_eq!(slices[0].duration(), 0.5);
        assert!((slices[0].envelope.fade() - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_short_slice_is_clamped_not_rejected() {
        let mock = Arc::new(MockOutput::new("mock"));
        let player = player(mock.clone(), 5.0);

        player.play(0.0, 0.0, 0.004).unwrap();
        assert!((mock.submitted()[0].envelope.fade() - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let mock = Arc::new(MockOutput::new("mock"));
        let player = player(mock.clone(), 5.0);

        assert!(matches!(
            player.play(0.0, 0.0, 0.0),
            Err(AudioError::InvalidSlice(_))
        ));
        assert!(mock.is_empty());
    }

    #[test]
    fn test_calls_are_independent() {
        let mock = Arc::new(MockOutput::new("mock"));
        let player = player(mock.clone(), 5.0);

        // Overlapping windows are allowed
        player.play(0.0, 0.0, 0.5).unwrap();
        player.play(0.498, 0.5, 0.5).unwrap();
        assert_eq!(mock.len(), 2);
    }

    #[test]
    fn test_slice_config_default() {
        let config = SliceConfig::default();
        assert_eq!(config.fade_ms, 5.0);
        assert_eq!(config.fade(), 0.005);
    }
}
