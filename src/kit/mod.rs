// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Kit model.
//!
//! This module provides:
//! - The immutable kit (tempo, meter, section layout)
//! - Label-based section roles and variant letters
//! - The JSON descriptor a kit is loaded from

pub mod descriptor;
pub mod role;

pub use descriptor::{KitDescriptor, SectionDescriptor};
pub use role::{variant_letter, SectionRole};

use thiserror::Error;

/// Kit loading and lookup errors
#[derive(Debug, Error)]
pub enum KitError {
    /// Descriptor is structurally valid JSON but not a playable kit
    #[error("invalid kit: {0}")]
    InvalidKit(String),
    /// No section with this label exists in the layout
    #[error("unknown section: {0:?}")]
    UnknownSection(String),
    /// Descriptor is not valid JSON for a kit
    #[error("failed to parse kit descriptor: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A named region of the kit recording
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    label: String,
    start_offset: f64,
    bars: u32,
}

impl Section {
    /// Create a new section
    pub fn new(label: impl Into<String>, start_offset: f64, bars: u32) -> Self {
        Self {
            label: label.into(),
            start_offset,
            bars,
        }
    }

    /// Get the label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Offset into the recording in seconds
    pub fn start_offset(&self) -> f64 {
        self.start_offset
    }

    /// Length in bars
    pub fn bars(&self) -> u32 {
        self.bars
    }

    /// Role classified from the label
    pub fn role(&self) -> SectionRole {
        SectionRole::classify(&self.label)
    }

    /// Whether this section plays once before returning to a main groove
    pub fn is_one_shot(&self) -> bool {
        self.role().is_one_shot()
    }
}

/// A loaded kit. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Kit {
    bpm: f64,
    beats_per_bar: u32,
    layout: Vec<Section>,
}

impl Kit {
    /// Build a kit, validating tempo, meter and layout
    pub fn new(bpm: f64, beats_per_bar: u32, layout: Vec<Section>) -> Result<Self, KitError> {
        if layout.is_empty() {
            return Err(KitError::InvalidKit("layout is empty".to_string()));
        }
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(KitError::InvalidKit(format!("bpm must be positive, got {}", bpm)));
        }
        if beats_per_bar == 0 {
            return Err(KitError::InvalidKit("signature must be at least 1".to_string()));
        }
        for section in &layout {
            if section.bars == 0 {
                return Err(KitError::InvalidKit(format!(
                    "section {:?} has zero bars",
                    section.label
                )));
            }
            if !section.start_offset.is_finite() || section.start_offset < 0.0 {
                return Err(KitError::InvalidKit(format!(
                    "section {:?} has invalid start time {}",
                    section.label, section.start_offset
                )));
            }
        }

        Ok(Self {
            bpm,
            beats_per_bar,
            layout,
        })
    }

    /// Build a kit from a parsed descriptor
    pub fn from_descriptor(descriptor: &KitDescriptor) -> Result<Self, KitError> {
        let layout = descriptor
            .layout
            .iter()
            .map(|s| Section::new(s.label.clone(), s.time, s.bars))
            .collect();
        Self::new(descriptor.bpm, descriptor.signature, layout)
    }

    /// Tempo in BPM
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Beats per bar
    pub fn beats_per_bar(&self) -> u32 {
        self.beats_per_bar
    }

    /// Length of one beat in seconds
    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Sections in layout order
    pub fn layout(&self) -> &[Section] {
        &self.layout
    }

    /// Look up a section by exact label
    pub fn resolve(&self, label: &str) -> Result<&Section, KitError> {
        self.layout
            .iter()
            .find(|s| s.label == label)
            .ok_or_else(|| KitError::UnknownSection(label.to_string()))
    }

    /// Whether a label exists in the layout
    pub fn contains(&self, label: &str) -> bool {
        self.layout.iter().any(|s| s.label == label)
    }

    /// First main section, or the first section when there is none
    pub fn default_section(&self) -> &Section {
        self.first_main().unwrap_or(&self.layout[0])
    }

    fn first_main(&self) -> Option<&Section> {
        self.layout.iter().find(|s| s.role() == SectionRole::Main)
    }

    /// Section to continue with after the one-shot `label` finishes.
    ///
    /// Picks the first main section containing the label's variant letter,
    /// then falls back to the default section.
    pub fn return_target(&self, label: &str) -> &Section {
        variant_letter(label)
            .and_then(|letter| {
                self.layout
                    .iter()
                    .find(|s| s.role() == SectionRole::Main && s.label.contains(letter))
            })
            .unwrap_or_else(|| self.default_section())
    }

    /// Sections with the given role, in layout order
    pub fn sections_with_role(&self, role: SectionRole) -> impl Iterator<Item = &Section> {
        self.layout.iter().filter(move |s| s.role() == role)
    }

    /// Offset into the recording where the given beat of a section starts
    pub fn buffer_offset(&self, section: &Section, bar: u32, beat: u32) -> f64 {
        let beats_into_section = bar as u64 * self.beats_per_bar as u64 + beat as u64;
        section.start_offset + beats_into_section as f64 * self.seconds_per_beat()
    }

    /// End of a section's last beat in the recording, in seconds
    pub fn section_end(&self, section: &Section) -> f64 {
        self.buffer_offset(section, section.bars, 0)
    }
}
