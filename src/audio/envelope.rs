// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Trapezoid gain envelope applied to every beat slice.

use super::AudioError;

/// Default fade length at each end of a slice, in seconds
pub const DEFAULT_FADE_SECONDS: f64 = 0.005;

/// Linear fade-in, flat top, linear fade-out over a slice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceEnvelope {
    /// Total slice length in seconds
    duration: f64,
    /// Length of each ramp in seconds
    fade: f64,
}

impl SliceEnvelope {
    /// Create an envelope for a slice of `duration` seconds.
    ///
    /// Ramps longer than half the slice are shortened to `duration / 2`
    /// so the two ramps meet in the middle instead of overlapping.
    pub fn new(duration: f64, fade: f64) -> Result<Self, AudioError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(AudioError::InvalidSlice(format!(
                "duration must be positive, got {}",
                duration
            )));
        }
        let fade = if fade.is_finite() { fade.max(0.0) } else { 0.0 };

        Ok(Self {
            duration,
            fade: fade.min(duration / 2.0),
        })
    }

    /// Slice length in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Effective ramp length in seconds
    pub fn fade(&self) -> f64 {
        self.fade
    }

    /// Gain at `t` seconds into the slice. Zero outside the slice.
    pub fn gain_at(&self, t: f64) -> f32 {
        if t < 0.0 || t >= self.duration {
            return 0.0;
        }
        if self.fade == 0.0 {
            return 1.0;
        }

        let rising = t / self.fade;
        let falling = (self.duration - t) / self.fade;
        rising.min(falling).min(1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let env = SliceEnvelope::new(0.5, DEFAULT_FADE_SECONDS).unwrap();

        assert_eq!(env.gain_at(0.0), 0.0);
        assert!((env.gain_at(0.0025) - 0.5).abs() < 1e-4);
        assert!((env.gain_at(0.005) - 1.0).abs() < 1e-6);
        assert_eq!(env.gain_at(0.25), 1.0);
        assert!((env.gain_at(0.4975) - 0.5).abs() < 1e-3);
        assert_eq!(env.gain_at(0.5), 0.0);
        assert_eq!(env.gain_at(-0.001), 0.0);
    }

    #[test]
    fn test_short_slice_clamps_fade() {
        let env = SliceEnvelope::new(0.006, DEFAULT_FADE_SECONDS).unwrap();
        assert!((env.fade() - 0.003).abs() < 1e-12);

        // Ramps meet at the midpoint
        assert!((env.gain_at(0.003) - 1.0).abs() < 1e-6);
        assert!(env.gain_at(0.0015) > 0.0 && env.gain_at(0.0015) < 1.0);
        assert!(env.gain_at(0.0045) > 0.0 && env.gain_at(0.0045) < 1.0);
    }

    #[test]
    fn test_zero_fade_is_flat() {
        let env = SliceEnvelope::new(0.1, 0.0).unwrap();
        assert_eq!(env.gain_at(0.0), 1.0);
        assert_eq!(env.gain_at(0.0999), 1.0);
    }

    #[test]
    fn test_invalid_duration() {
        assert!(SliceEnvelope::new(0.0, DEFAULT_FADE_SECONDS).is_err());
        assert!(SliceEnvelope::new(-1.0, DEFAULT_FADE_SECONDS).is_err());
        assert!(SliceEnvelope::new(f64::INFINITY, DEFAULT_FADE_SECONDS).is_err());
    }
}
