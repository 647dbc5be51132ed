// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for kitplay.
//!
//! Player settings live in one YAML file. Every field has a default, so an
//! empty file (or no file at all) gives a working player.

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::audio::AudioConfig;
use crate::sequencer::{SchedulerConfig, SliceConfig};

/// Root player configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlayerConfig {
    /// Look-ahead scheduling
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Slice envelopes
    #[serde(default)]
    pub slice: SliceConfig,
    /// Output device
    #[serde(default)]
    pub audio: AudioConfig,
}

impl PlayerConfig {
    /// Load a player configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a player configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml reads an empty document as null
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")?
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Reject settings the player cannot run with
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.scheduler.lookahead_ms > self.scheduler.poll_interval_ms,
            "scheduler.lookahead_ms ({}) must exceed scheduler.poll_interval_ms ({})",
            self.scheduler.lookahead_ms,
            self.scheduler.poll_interval_ms
        );
        ensure!(
            self.slice.fade_ms.is_finite() && self.slice.fade_ms >= 0.0,
            "slice.fade_ms must be a non-negative number, got {}",
            self.slice.fade_ms
        );
        ensure!(self.audio.sample_rate > 0, "audio.sample_rate must be positive");
        ensure!(self.audio.channels > 0, "audio.channels must be positive");
        Ok(())
    }
}
