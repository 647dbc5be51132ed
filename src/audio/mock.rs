// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! A mock output device. Doesn't actually play anything.

use std::fmt;
use std::sync::Mutex;

use tracing::debug;

use super::{AudioError, OutputDevice, ScheduledSlice};

/// Records every submitted slice
#[derive(Default)]
pub struct MockOutput {
    name: String,
    submitted: Mutex<Vec<ScheduledSlice>>,
}

impl MockOutput {
    /// Create a named mock device
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Slices submitted so far, in submission order
    pub fn submitted(&self) -> Vec<ScheduledSlice> {
        self.submitted
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Number of slices submitted so far
    pub fn len(&self) -> usize {
        self.submitted.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether nothing has been submitted
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget recorded slices
    pub fn clear(&self) {
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.clear();
        }
    }
}

impl OutputDevice for MockOutput {
    fn submit(&self, slice: ScheduledSlice) -> Result<(), AudioError> {
        debug!(
            device = %self.name,
            start_time = slice.start_time,
            offset = slice.buffer_offset,
            duration = slice.duration(),
            "Playing slice (mock)."
        );
        self.submitted
            .lock()
            .map_err(|_| AudioError::LockFailed)?
            .push(slice);
        Ok(())
    }
}

impl fmt::Display for MockOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
