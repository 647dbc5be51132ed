// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sample-accurate slice mixer.
//!
//! The mixer is both the output device the scheduler submits to and the
//! audio clock it measures against: time is the number of frames rendered
//! so far divided by the device sample rate.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::{trace, warn};

use super::{AudioError, OutputDevice, ScheduledSlice};
use crate::timing::AudioClock;

/// Mixes scheduled slices into an interleaved output stream
pub struct SliceMixer {
    /// Device sample rate
    sample_rate: u32,
    /// Frames rendered since creation
    frames_rendered: AtomicU64,
    /// Slices not yet finished
    slices: Mutex<Vec<ScheduledSlice>>,
}

impl SliceMixer {
    /// Create a mixer for a stream at `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            frames_rendered: AtomicU64::new(0),
            slices: Mutex::new(Vec::new()),
        }
    }

    /// Device sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames rendered so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered.load(Ordering::Acquire)
    }

    /// Slices queued or playing
    pub fn pending_slices(&self) -> usize {
        self.slices.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Drop every queued slice
    pub fn clear(&self) {
        if let Ok(mut slices) = self.slices.lock() {
            slices.clear();
        }
    }

    /// Fill `buffer` with the next block of audio and advance the clock.
    ///
    /// Each output frame is rendered at its own clock time, so a slice
    /// starts on the exact frame its start time falls on.
    pub fn render(&self, buffer: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frames = buffer.len() / channels;
        let first_frame = self.frames_rendered();
        let rate = self.sample_rate as f64;
        let block_start = first_frame as f64 / rate;
        let block_end = (first_frame + frames as u64) as f64 / rate;

        buffer.iter_mut().for_each(|s| *s = 0.0);

        // Waits out a concurrent submit; a block is never skipped
        {
            let mut slices = self.slices.lock().unwrap_or_else(PoisonError::into_inner);
            for slice in slices
                .iter()
                .filter(|s| s.start_time < block_end && s.end_time() > block_start)
            {
                for (i, frame) in buffer.chunks_exact_mut(channels).enumerate() {
                    let time = (first_frame + i as u64) as f64 / rate;
                    for (channel, sample) in frame.iter_mut().enumerate() {
                        *sample += slice.sample(time, channel);
                    }
                }
            }

            let before = slices.len();
            slices.retain(|s| s.end_time() > block_end);
            if slices.len() != before {
                trace!(finished = before - slices.len(), "Slices finished");
            }
        }

        self.frames_rendered
            .fetch_add(frames as u64, Ordering::AcqRel);
    }
}

impl AudioClock for SliceMixer {
    fn now(&self) -> f64 {
        self.frames_rendered() as f64 / self.sample_rate as f64
    }
}

impl OutputDevice for SliceMixer {
    fn submit(&self, slice: ScheduledSlice) -> Result<(), AudioError> {
        if slice.start_time < self.now() {
            warn!(
                start_time = slice.start_time,
                now = self.now(),
                "Slice submitted late, its head will be cut"
            );
        }
        let mut slices = self.slices.lock().map_err(|_| AudioError::LockFailed)?;
        slices.push(slice);
        Ok(())
    }
}

impl fmt::Display for SliceMixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slice mixer @ {} Hz", self.sample_rate)
    }
}
