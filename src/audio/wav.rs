// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! PCM WAV reading for kit recordings.

use std::io::Read;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use tracing::info;

use super::{AudioBuffer, AudioError};

impl AudioBuffer {
    /// Read a PCM or float WAV file into memory
    pub fn from_wav<P: AsRef<Path>>(path: P) -> Result<Self, AudioError> {
        let reader = WavReader::open(path.as_ref())?;
        let buffer = Self::from_wav_reader(reader)?;
        info!(
            path = ?path.as_ref(),
            channels = buffer.channels(),
            sample_rate = buffer.sample_rate(),
            seconds = buffer.duration(),
            "Loaded kit recording."
        );
        Ok(buffer)
    }

    /// Read samples from an open WAV reader, normalized to [-1.0, 1.0]
    pub fn from_wav_reader<R: Read>(mut reader: WavReader<R>) -> Result<Self, AudioError> {
        let spec = reader.spec();

        let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<_, _>>()?,
            (SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => {
                let scale = (1u64 << (bits - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
            (format, bits) => {
                return Err(AudioError::UnsupportedFormat(format!(
                    "{:?} {}-bit",
                    format, bits
                )));
            }
        };

        Self::new(samples, spec.channels, spec.sample_rate)
    }
}
