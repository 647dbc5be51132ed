// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio clock sources.
//!
//! All scheduling is expressed in seconds on an audio clock. The real
//! clock is the output mixer's rendered frame count; the sources here
//! cover tests and the mock device.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic time source in seconds, shared with the output device
pub trait AudioClock: Send + Sync {
    /// Current time in seconds. Never decreases.
    fn now(&self) -> f64;
}

/// Wall-clock time since creation
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock starting at zero
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioClock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    /// Current time as f64 bits
    bits: AtomicU64,
}

impl ManualClock {
    /// Create a clock at the given time
    pub fn new(start: f64) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
        }
    }

    /// Move the clock forward. Negative deltas are ignored.
    pub fn advance(&self, seconds: f64) {
        if seconds <= 0.0 {
            return;
        }
        let now = self.now();
        self.bits.store((now + seconds).to_bits(), Ordering::SeqCst);
    }

    /// Jump to an absolute time, never backwards
    pub fn set(&self, seconds: f64) {
        if seconds > self.now() {
            self.bits.store(seconds.to_bits(), Ordering::SeqCst);
        }
    }
}

impl AudioClock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}
