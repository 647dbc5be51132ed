// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! JSON kit descriptor as shipped next to each kit recording.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::KitError;

/// Root of a kit descriptor file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KitDescriptor {
    /// Tempo in BPM
    pub bpm: f64,
    /// Beats per bar
    #[serde(default = "default_signature")]
    pub signature: u32,
    /// Sections in song-form order
    pub layout: Vec<SectionDescriptor>,
}

/// One entry of the descriptor layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionDescriptor {
    /// Human name, e.g. "Main A"
    pub label: String,
    /// Start offset into the recording in seconds
    pub time: f64,
    /// Length in bars
    pub bars: u32,
}

fn default_signature() -> u32 {
    4
}

impl KitDescriptor {
    /// Parse a descriptor from a JSON string
    pub fn from_json(json: &str) -> Result<Self, KitError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a descriptor from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, KitError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            KitError::InvalidKit(format!("cannot read {:?}: {}", path.as_ref(), e))
        })?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descriptor() {
        let json = r#"{
            "bpm": 96.5,
            "signature": 3,
            "layout": [
                { "label": "Intro A", "time": 0.0, "bars": 2 },
                { "label": "Main A", "time": 7.46, "bars": 8 }
            ]
        }"#;

        let desc = KitDescriptor::from_json(json).unwrap();
        assert_eq!(desc.bpm, 96.5);
        assert_eq!(desc.signature, 3);
        assert_eq!(desc.layout.len(), 2);
        assert_eq!(desc.layout[1].label, "Main A");
        assert_eq!(desc.layout[1].bars, 8);
    }

    #[test]
    fn test_signature_defaults_to_four() {
        let json = r#"{ "bpm": 120, "layout": [ { "label": "Main A", "time": 0, "bars": 4 } ] }"#;
        let desc = KitDescriptor::from_json(json).unwrap();
        assert_eq!(desc.signature, 4);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result = KitDescriptor::from_json(r#"{ "bpm": "fast" }"#);
        assert!(matches!(result, Err(KitError::Parse(_))));
    }
}
