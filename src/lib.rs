// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Live playback of multi-section drum loop recordings.
//!
//! A kit is one continuous recording plus a descriptor naming its sections.
//! The engine slices the recording into beats and stitches them back
//! together in whatever order the player asks for, switching sections on
//! bar boundaries.

pub mod audio;
pub mod config;
pub mod engine;
pub mod kit;
pub mod sequencer;
pub mod timing;

pub use engine::{DrumEngine, EngineError};
