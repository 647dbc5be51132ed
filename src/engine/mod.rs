// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Drum kit playback engine.
//!
//! Owns the loaded kit, the song form position and the schedule cursor
//! behind one mutex. A tokio interval task polls [`DrumEngine::tick`];
//! each tick submits every beat inside the look-ahead horizon to the
//! output device at its exact audio clock time, arms a beat notification,
//! then advances the section state machine.

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::audio::{AudioBuffer, AudioError, OutputDevice};
use crate::kit::{Kit, KitDescriptor, KitError};
use crate::sequencer::{
    BeatEvent, BeatNotifier, LookaheadScheduler, PlaybackPosition, SchedulerConfig, SectionState,
    SliceConfig, SlicePlayer, Transition,
};
use crate::timing::AudioClock;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Kit(#[from] KitError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    /// An operation needing a kit ran before any kit was loaded
    #[error("no kit loaded")]
    NotLoaded,
    #[error("engine state lock poisoned")]
    LockFailed,
    /// Playback was started outside a tokio runtime
    #[error("no tokio runtime available for the scheduler task")]
    NoRuntime,
}

/// A kit ready to play
struct LoadedKit {
    kit: Kit,
    player: SlicePlayer,
    section: SectionState,
}

struct EngineState {
    loaded: Option<LoadedKit>,
    scheduler: LookaheadScheduler,
    slice_config: SliceConfig,
    poll_task: Option<JoinHandle<()>>,
}

/// State shared between the engine handle and its poll task
struct Shared {
    state: Mutex<EngineState>,
    output: Arc<dyn OutputDevice>,
    clock: Arc<dyn AudioClock>,
    notifier: BeatNotifier,
}

impl Shared {
    fn lock(&self) -> Result<MutexGuard<'_, EngineState>, EngineError> {
        self.state.lock().map_err(|_| EngineError::LockFailed)
    }

    fn tick(&self) -> Result<usize, EngineError> {
        let now = self.clock.now();
        let mut guard = self.lock()?;
        self.schedule(&mut guard, now)
    }

    /// Submit every beat due at `now`
    fn schedule(&self, state: &mut EngineState, now: f64) -> Result<usize, EngineError> {
        let Some(loaded) = state.loaded.as_mut() else {
            return Ok(0);
        };
        let LoadedKit {
            kit,
            player,
            section,
        } = loaded;
        let (kit, player) = (&*kit, &*player);
        let seconds_per_beat = kit.seconds_per_beat();
        let notifier = &self.notifier;

        state.scheduler.fill(now, seconds_per_beat, |start_time| {
            let current = kit.resolve(section.section())?;
            let offset = kit.buffer_offset(current, section.bar(), section.beat());
            player.play(start_time, offset, seconds_per_beat)?;

            notifier.arm(
                BeatEvent {
                    section: current.label().to_string(),
                    bar: section.bar(),
                    beat: section.beat(),
                    start_time,
                },
                now,
            );

            match section.advance(kit)? {
                Transition::Pending { from, to } => {
                    debug!(%from, %to, start_time, "Switched to queued section");
                }
                Transition::ReturnToMain { from, to } => {
                    debug!(%from, %to, start_time, "One-shot section finished");
                }
                Transition::Loop => {
                    debug!(section = section.section(), start_time, "Section looped");
                }
                Transition::Beat | Transition::Bar => {}
            }
            Ok::<(), EngineError>(())
        })
    }

    /// Stop the poll task and the session, rewind to the default section.
    /// Returns whether playback was running.
    fn halt(&self, state: &mut EngineState) -> bool {
        if let Some(task) = state.poll_task.take() {
            task.abort();
        }
        let was_running = state.scheduler.is_running();
        state.scheduler.stop();
        self.notifier.end_session();

        if let Some(loaded) = state.loaded.as_mut() {
            loaded.section.reset(&loaded.kit);
        }
        was_running
    }
}

/// Plays one kit through an output device
pub struct DrumEngine {
    shared: Arc<Shared>,
}

impl DrumEngine {
    /// Create an engine submitting to `output`, timed by `clock`.
    ///
    /// `clock` must be the clock `output` plays against.
    pub fn new(
        output: Arc<dyn OutputDevice>,
        clock: Arc<dyn AudioClock>,
        scheduler: SchedulerConfig,
        slice: SliceConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(EngineState {
                    loaded: None,
                    scheduler: LookaheadScheduler::with_config(scheduler),
                    slice_config: slice,
                    poll_task: None,
                }),
                output,
                clock,
                notifier: BeatNotifier::new(),
            }),
        }
    }

    /// Replace the kit. Stops playback first.
    ///
    /// An invalid descriptor leaves the previous kit loaded.
    pub fn load_kit(&self, descriptor: &KitDescriptor, buffer: AudioBuffer) -> Result<(), EngineError> {
        let kit = Kit::from_descriptor(descriptor)?;
        self.stop()?;

        let buffer = Arc::new(buffer);
        for section in kit.layout() {
            let end = kit.section_end(section);
            if end > buffer.duration() {
                warn!(
                    section = section.label(),
                    section_end = end,
                    buffer_seconds = buffer.duration(),
                    "Section runs past the end of the recording"
                );
            }
        }

        let mut state = self.shared.lock()?;
        let player = SlicePlayer::new(
            Arc::clone(&buffer),
            Arc::clone(&self.shared.output),
            &state.slice_config,
        );

        info!(
            bpm = kit.bpm(),
            signature = kit.beats_per_bar(),
            sections = kit.layout().len(),
            default_section = kit.default_section().label(),
            buffer_seconds = buffer.duration(),
            "Kit loaded."
        );

        state.loaded = Some(LoadedKit {
            section: SectionState::new(&kit),
            kit,
            player,
        });
        Ok(())
    }

    /// Start playback from the current position. No-op if already playing.
    pub fn start(&self) -> Result<(), EngineError> {
        let handle = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;

        // Held until the poll task is stored: running implies a poll task
        let mut guard = self.shared.lock()?;
        let state = &mut *guard;
        if state.scheduler.is_running() {
            return Ok(());
        }
        let section = state
            .loaded
            .as_ref()
            .map(|l| l.section.section().to_string())
            .ok_or(EngineError::NotLoaded)?;

        let now = self.shared.clock.now();
        self.shared.notifier.begin_session();
        state.scheduler.start(now);
        info!(
            %section,
            first_beat = state.scheduler.next_note_time(),
            "Playback started."
        );

        if let Err(e) = self.shared.schedule(state, now) {
            self.shared.halt(state);
            return Err(e);
        }

        let poll_interval = state.scheduler.config().poll_interval();
        let shared = Arc::clone(&self.shared);
        let task = handle.spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = shared.tick() {
                    error!(err = %e, "Scheduler tick failed");
                }
            }
        });
        if let Some(previous) = state.poll_task.replace(task) {
            previous.abort();
        }
        Ok(())
    }

    /// Stop playback and rewind to the default section. Idempotent.
    ///
    /// Slices already handed to the device still play out; their beat
    /// notifications are suppressed.
    pub fn stop(&self) -> Result<(), EngineError> {
        let mut guard = self.shared.lock()?;
        if self.shared.halt(&mut guard) {
            info!("Playback stopped.");
        }
        Ok(())
    }

    /// Queue `label` to start at the next bar boundary.
    ///
    /// Ignored while stopped, after checking the label exists.
    pub fn queue_section(&self, label: &str) -> Result<(), EngineError> {
        let mut guard = self.shared.lock()?;
        let state = &mut *guard;
        let loaded = state.loaded.as_mut().ok_or(EngineError::NotLoaded)?;
        loaded.kit.resolve(label)?;

        if !state.scheduler.is_running() {
            debug!(section = label, "Not playing, queue request ignored");
            return Ok(());
        }
        if let Some(replaced) = loaded.section.pending() {
            debug!(replaced, section = label, "Replacing queued section");
        }
        loaded.section.queue(label);
        Ok(())
    }

    /// Switch to `label` immediately, from its first beat
    pub fn jump_to_section(&self, label: &str) -> Result<(), EngineError> {
        let mut guard = self.shared.lock()?;
        let state = &mut *guard;
        let loaded = state.loaded.as_mut().ok_or(EngineError::NotLoaded)?;
        loaded.kit.resolve(label)?;

        debug!(from = loaded.section.section(), to = label, "Jumping to section");
        loaded.section.jump(label);
        Ok(())
    }

    /// Pick a section the way a live player does: queued for the next bar
    /// line while playing, otherwise jumped to and started.
    pub fn select_section(&self, label: &str) -> Result<(), EngineError> {
        if self.is_playing()? {
            self.queue_section(label)
        } else {
            self.jump_to_section(label)?;
            self.start()
        }
    }

    /// Call `callback` with the section label and beat index of every beat
    /// as it becomes audible
    pub fn set_on_beat<F>(&self, callback: F)
    where
        F: Fn(&str, u32) + Send + Sync + 'static,
    {
        self.shared.notifier.set_callback(callback);
    }

    /// Stop reporting beats
    pub fn clear_on_beat(&self) {
        self.shared.notifier.clear_callback();
    }

    /// Whether playback is running
    pub fn is_playing(&self) -> Result<bool, EngineError> {
        Ok(self.shared.lock()?.scheduler.is_running())
    }

    /// Current song form position, if a kit is loaded
    pub fn position(&self) -> Result<Option<PlaybackPosition>, EngineError> {
        let state = self.shared.lock()?;
        Ok(state.loaded.as_ref().map(|l| l.section.position().clone()))
    }

    /// Audio clock time of the next beat to be scheduled
    pub fn next_note_time(&self) -> Result<f64, EngineError> {
        Ok(self.shared.lock()?.scheduler.next_note_time())
    }

    /// The loaded kit
    pub fn kit(&self) -> Result<Option<Kit>, EngineError> {
        let state = self.shared.lock()?;
        Ok(state.loaded.as_ref().map(|l| l.kit.clone()))
    }

    /// Run one scheduler pass. Returns the number of beats submitted.
    pub fn tick(&self) -> Result<usize, EngineError> {
        self.shared.tick()
    }
}

impl Drop for DrumEngine {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.state.lock() {
            if let Some(task) = state.poll_task.take() {
                task.abort();
            }
        }
        self.shared.notifier.end_session();
    }
}
