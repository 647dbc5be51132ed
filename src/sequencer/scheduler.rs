// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Look-ahead beat scheduler.
//!
//! A coarse poll timer wakes the scheduler every few tens of milliseconds.
//! The poll itself is never the timing source: on each wake-up every beat
//! whose start time falls inside the look-ahead horizon is handed to the
//! output device with its exact audio clock start time, so timer jitter
//! only changes how early a beat is queued, never when it sounds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the scheduler
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    /// How far ahead of the audio clock beats are submitted, in milliseconds
    #[serde(default = "default_lookahead_ms")]
    pub lookahead_ms: u32,
    /// Poll timer period in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u32,
    /// Delay between start and the first beat, in milliseconds
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u32,
}

fn default_lookahead_ms() -> u32 {
    100
}
fn default_poll_interval_ms() -> u32 {
    25
}
fn default_start_delay_ms() -> u32 {
    100
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookahead_ms: default_lookahead_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            start_delay_ms: default_start_delay_ms(),
        }
    }
}

impl SchedulerConfig {
    /// Look-ahead horizon in seconds
    pub fn lookahead(&self) -> f64 {
        self.lookahead_ms as f64 / 1000.0
    }

    /// Start delay in seconds
    pub fn start_delay(&self) -> f64 {
        self.start_delay_ms as f64 / 1000.0
    }

    /// Poll timer period, never zero
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1) as u64)
    }
}

/// Schedule cursor plus the look-ahead rule
#[derive(Debug, Clone)]
pub struct LookaheadScheduler {
    /// Configuration
    config: SchedulerConfig,
    /// Audio clock time of the next beat not yet submitted
    next_note_time: f64,
    /// Beats submitted since start
    beats_submitted: u64,
    /// Whether a session is running
    running: bool,
}

impl LookaheadScheduler {
    /// Create a new scheduler
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create scheduler with custom config
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            next_note_time: 0.0,
            beats_submitted: 0,
            running: false,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Begin a session; the first beat lands a short delay after `now`
    pub fn start(&mut self, now: f64) {
        self.next_note_time = now + self.config.start_delay();
        self.beats_submitted = 0;
        self.running = true;
    }

    /// End the session
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Check if running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Audio clock time of the next beat to submit
    pub fn next_note_time(&self) -> f64 {
        self.next_note_time
    }

    /// Beats submitted since start
    pub fn beats_submitted(&self) -> u64 {
        self.beats_submitted
    }

    /// Whether the next beat falls inside the horizon at `now`
    pub fn is_due(&self, now: f64) -> bool {
        self.running && self.next_note_time < now + self.config.lookahead()
    }

    /// Submit every beat due at `now`, in start-time order.
    ///
    /// `submit` receives each beat's start time; the cursor moves on by
    /// `seconds_per_beat` only after it succeeds. Returns the number of
    /// beats submitted.
    pub fn fill<E, F>(&mut self, now: f64, seconds_per_beat: f64, mut submit: F) -> Result<usize, E>
    where
        F: FnMut(f64) -> Result<(), E>,
    {
        if !(seconds_per_beat.is_finite() && seconds_per_beat > 0.0) {
            return Ok(0);
        }

        let mut count = 0;
        while self.is_due(now) {
            submit(self.next_note_time)?;
            self.next_note_time += seconds_per_beat;
            self.beats_submitted += 1;
            count += 1;
        }
        Ok(count)
    }
}

impl Default for LookaheadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn fill_collect(scheduler: &mut LookaheadScheduler, now: f64, spb: f64) -> Vec<f64> {
        let mut times = Vec::new();
        scheduler
            .fill(now, spb, |t| {
                times.push(t);
                Ok::<(), Infallible>(())
            })
            .unwrap();
        times
    }

    #[test]
    fn test_scheduler_creation() {
        let scheduler = LookaheadScheduler::new();
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.config().lookahead_ms, 100);
        assert_eq!(scheduler.config().poll_interval_ms, 25);
        assert_eq!(scheduler.config().start_delay_ms, 100);
    }

    #[test]
    fn test_start_sets_cursor_ahead_of_now() {
        let mut scheduler = LookaheadScheduler::new();
        scheduler.start(3.0);
        assert!(scheduler.is_running());
        assert!((scheduler.next_note_time() - 3.1).abs() < 1e-12);
    }

    #[test]
    fn test_nothing_due_right_after_start() {
        let mut scheduler = LookaheadScheduler::new();
        scheduler.start(1.0);
        assert!(fill_collect(&mut scheduler, 1.0, 0.5).is_empty());
    }

    #[test]
    fn test_beats_inside_horizon_are_submitted() {
        let mut scheduler = LookaheadScheduler::new();
        scheduler.start(0.0);

        // Horizon reaches 0.15; first beat at 0.1
        let times = fill_collect(&mut scheduler, 0.05, 0.5);
        assert_eq!(times.len(), 1);
        assert!((times[0] - 0.1).abs() < 1e-12);

        // Nothing more until the clock approaches 0.6
        assert!(fill_collect(&mut scheduler, 0.4, 0.5).is_empty());
        let times = fill_collect(&mut scheduler, 0.55, 0.5);
        assert_eq!(times.len(), 1);
        assert!((times[0] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_cursor_moves_by_one_beat_per_submission() {
        let mut scheduler = LookaheadScheduler::new();
        scheduler.start(0.0);

        let times = fill_collect(&mut scheduler, 10.0, 0.5);
        assert_eq!(times.len() as u64, scheduler.beats_submitted());
        for pair in times.windows(2) {
            assert!((pair[1] - pair[0] - 0.5).abs() < 1e-9);
        }
        assert!(scheduler.next_note_time() >= 10.1);
    }

    #[test]
    fn test_stalled_poll_catches_up_in_order() {
        let mut scheduler = LookaheadScheduler::new();
        scheduler.start(0.0);

        // A long stall releases every missed beat at once
        let times = fill_collect(&mut scheduler, 1.95, 0.25);
        assert_eq!(times.len(), 8);
        assert!(times.windows(2).all(|p| p[1] > p[0]));
    }

    #[test]
    fn test_stopped_scheduler_submits_nothing() {
        let mut scheduler = LookaheadScheduler::new();
        scheduler.start(0.0);
        scheduler.stop();
        assert!(fill_collect(&mut scheduler, 5.0, 0.5).is_empty());
    }

    #[test]
    fn test_failed_submit_keeps_cursor() {
        let mut scheduler = LookaheadScheduler::new();
        scheduler.start(0.0);

        let result = scheduler.fill(1.0, 0.5, |_| Err("device gone"));
        assert_eq!(result, Err("device gone"));
        assert!((scheduler.next_note_time() - 0.1).abs() < 1e-12);
        assert_eq!(scheduler.beats_submitted(), 0);
    }

    #[test]
    fn test_invalid_beat_length_is_ignored() {
        let mut scheduler = LookaheadScheduler::new();
        scheduler.start(0.0);
        assert!(fill_collect(&mut scheduler, 5.0, 0.0).is_empty());
    }

    #[test]
    fn test_config_conversions() {
        let config = SchedulerConfig {
            lookahead_ms: 250,
            poll_interval_ms: 0,
            start_delay_ms: 50,
        };
        assert_eq!(config.lookahead(), 0.25);
        assert_eq!(config.start_delay(), 0.05);
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }
}
