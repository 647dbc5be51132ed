// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Beat notifications at the moment a beat becomes audible.
//!
//! Beats are scheduled up to a look-ahead horizon early, so the callback
//! cannot run at scheduling time. Each beat arms its own one-shot timer
//! carrying the label and beat index captured when it was scheduled.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{trace, warn};

/// Callback invoked with the section label and beat index of each audible beat
pub type BeatCallback = Arc<dyn Fn(&str, u32) + Send + Sync>;

/// A beat captured at scheduling time
#[derive(Debug, Clone, PartialEq)]
pub struct BeatEvent {
    /// Section label
    pub section: String,
    /// Bar within the section (0-indexed)
    pub bar: u32,
    /// Beat within the bar (0-indexed)
    pub beat: u32,
    /// Audio clock time the beat becomes audible
    pub start_time: f64,
}

impl BeatEvent {
    /// Time from `now` until the beat is audible, zero if already past
    pub fn delay_from(&self, now: f64) -> Duration {
        let seconds = self.start_time - now;
        if seconds.is_finite() && seconds > 0.0 {
            Duration::from_secs_f64(seconds)
        } else {
            Duration::ZERO
        }
    }
}

#[derive(Debug, Default)]
struct Session {
    /// Bumped on every start and stop
    generation: AtomicU64,
    /// Whether playback is running
    active: AtomicBool,
}

impl Session {
    fn is_current(&self, generation: u64) -> bool {
        self.active.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Arms one-shot timers that report audible beats
#[derive(Clone, Default)]
pub struct BeatNotifier {
    callback: Arc<Mutex<Option<BeatCallback>>>,
    session: Arc<Session>,
}

impl BeatNotifier {
    /// Create a notifier with no callback
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the beat callback
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(&str, u32) + Send + Sync + 'static,
    {
        if let Ok(mut slot) = self.callback.lock() {
            *slot = Some(Arc::new(callback));
        }
    }

    /// Remove the beat callback
    pub fn clear_callback(&self) {
        if let Ok(mut slot) = self.callback.lock() {
            *slot = None;
        }
    }

    fn callback(&self) -> Option<BeatCallback> {
        self.callback.lock().ok().and_then(|slot| slot.clone())
    }

    /// Open a new playback session; timers armed earlier stay silent
    pub fn begin_session(&self) {
        self.session.generation.fetch_add(1, Ordering::SeqCst);
        self.session.active.store(true, Ordering::SeqCst);
    }

    /// Close the session; pending timers fire into nothing
    pub fn end_session(&self) {
        self.session.active.store(false, Ordering::SeqCst);
        self.session.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether a session is open
    pub fn is_active(&self) -> bool {
        self.session.active.load(Ordering::SeqCst)
    }

    /// Report `event` once its start time arrives on an audio clock
    /// currently reading `now`
    pub fn arm(&self, event: BeatEvent, now: f64) {
        let Some(callback) = self.callback() else {
            return;
        };
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(
                    section = %event.section,
                    beat = event.beat,
                    "No async runtime, dropping beat notification"
                );
                return;
            }
        };

        let delay = event.delay_from(now);
        let generation = self.session.generation.load(Ordering::SeqCst);
        let session = Arc::clone(&self.session);

        handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if session.is_current(generation) {
                callback(&event.section, event.beat);
            } else {
                trace!(section = %event.section, beat = event.beat, "Beat after stop suppressed");
            }
        });
    }
}
