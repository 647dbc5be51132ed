// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing and clock module.
//!
//! This module provides the audio clock abstraction the scheduler
//! measures its look-ahead horizon against.

pub mod clock;

pub use clock::{AudioClock, ManualClock, SystemClock};
