// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sequencer core for slicing and re-stitching a drum recording.
//!
//! This module provides the beat sequencing infrastructure:
//! - Look-ahead scheduler on the audio clock
//! - Section transition state machine
//! - Slice player with click-free envelopes
//! - Beat notifier firing when a beat becomes audible

pub mod notifier;
pub mod scheduler;
pub mod slice;
pub mod transition;

pub use notifier::{BeatCallback, BeatEvent, BeatNotifier};
pub use scheduler::{LookaheadScheduler, SchedulerConfig};
pub use slice::{SliceConfig, SlicePlayer};
pub use transition::{PlaybackPosition, SectionState, Transition};
