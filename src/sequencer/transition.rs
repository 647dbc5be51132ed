// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Section transition state machine.
//!
//! Tracks where playback is in the song form (section, bar, beat) and
//! decides, at every bar boundary, whether to honor a queued section,
//! loop the current one, or hand a finished one-shot back to a main groove.

use crate::kit::{Kit, KitError};

/// Where playback is in the song form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackPosition {
    /// Label of the section being played
    pub section: String,
    /// Bar within the section (0-indexed)
    pub bar: u32,
    /// Beat within the bar (0-indexed)
    pub beat: u32,
    /// Section queued for the next bar boundary
    pub pending: Option<String>,
}

impl PlaybackPosition {
    /// Position at the start of a section
    pub fn at_section(label: impl Into<String>) -> Self {
        Self {
            section: label.into(),
            bar: 0,
            beat: 0,
            pending: None,
        }
    }

    /// Format position as string
    pub fn format(&self) -> String {
        format!("{} {}.{}", self.section, self.bar + 1, self.beat + 1)
    }
}

/// What a single beat advance did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Moved to the next beat of the same bar
    Beat,
    /// Crossed into the next bar of the same section
    Bar,
    /// Switched to the queued section
    Pending { from: String, to: String },
    /// Section finished and started over
    Loop,
    /// One-shot section finished and handed back to a main section
    ReturnToMain { from: String, to: String },
}

/// Beat-by-beat song form state
#[derive(Debug, Clone)]
pub struct SectionState {
    position: PlaybackPosition,
}

impl SectionState {
    /// Start at the kit's default section
    pub fn new(kit: &Kit) -> Self {
        Self {
            position: PlaybackPosition::at_section(kit.default_section().label()),
        }
    }

    /// Current position
    pub fn position(&self) -> &PlaybackPosition {
        &self.position
    }

    /// Label of the current section
    pub fn section(&self) -> &str {
        &self.position.section
    }

    /// Current bar (0-indexed)
    pub fn bar(&self) -> u32 {
        self.position.bar
    }

    /// Current beat (0-indexed)
    pub fn beat(&self) -> u32 {
        self.position.beat
    }

    /// Queued section, if any
    pub fn pending(&self) -> Option<&str> {
        self.position.pending.as_deref()
    }

    /// Back to the default section with nothing queued
    pub fn reset(&mut self, kit: &Kit) {
        self.position = PlaybackPosition::at_section(kit.default_section().label());
    }

    /// Queue `label` for the next bar boundary, replacing any earlier request
    pub fn queue(&mut self, label: impl Into<String>) {
        self.position.pending = Some(label.into());
    }

    /// Switch to `label` right away, from its first beat.
    ///
    /// A queued section is left as it is.
    pub fn jump(&mut self, label: impl Into<String>) {
        self.position.section = label.into();
        self.position.bar = 0;
        self.position.beat = 0;
    }

    /// Advance one beat.
    ///
    /// At a bar boundary a queued section always wins, even mid-section.
    /// Otherwise a section that has played all its bars either loops or,
    /// for one-shot roles, returns to a main section.
    pub fn advance(&mut self, kit: &Kit) -> Result<Transition, KitError> {
        let section = kit.resolve(&self.position.section)?;
        let pos = &mut self.position;

        pos.beat += 1;
        if pos.beat < kit.beats_per_bar() {
            return Ok(Transition::Beat);
        }

        pos.beat = 0;
        pos.bar += 1;

        if let Some(to) = pos.pending.take() {
            let from = std::mem::replace(&mut pos.section, to.clone());
            pos.bar = 0;
            return Ok(Transition::Pending { from, to });
        }

        if pos.bar < section.bars() {
            return Ok(Transition::Bar);
        }

        pos.bar = 0;
        if section.is_one_shot() {
            let to = kit.return_target(section.label()).label().to_string();
            let from = std::mem::replace(&mut pos.section, to.clone());
            Ok(Transition::ReturnToMain { from, to })
        } else {
            Ok(Transition::Loop)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::Section;

    fn kit(sections: &[(&str, u32)]) -> Kit {
        let layout = sections
            .iter()
            .enumerate()
            .map(|(i, (label, bars))| Section::new(*label, i as f64 * 16.0, *bars))
            .collect();
        Kit::new(120.0, 4, layout).unwrap()
    }

    fn advance_n(state: &mut SectionState, kit: &Kit, n: usize) -> Vec<Transition> {
        (0..n).map(|_| state.advance(kit).unwrap()).collect()
    }

    #[test]
    fn test_starts_at_default_section() {
        let kit = kit(&[("Intro A", 1), ("Main A", 8)]);
        let state = SectionState::new(&kit);
        assert_eq!(state.section(), "Main A");
        assert_eq!(state.bar(), 0);
        assert_eq!(state.beat(), 0);
        assert_eq!(state.pending(), None);
    }

    #[test]
    fn test_beat_and_bar_counting() {
        let kit = kit(&[("Main A", 4)]);
        let mut state = SectionState::new(&kit);

        let transitions = advance_n(&mut state, &kit, 4);
        assert_eq!(
            transitions,
            vec![Transition::Beat, Transition::Beat, Transition::Beat, Transition::Bar]
        );
        assert_eq!(state.bar(), 1);
        assert_eq!(state.beat(), 0);
    }

    #[test]
    fn test_main_section_loops_forever() {
        let kit = kit(&[("Main A", 3)]);
        let mut state = SectionState::new(&kit);

        for _ in 0..10 {
            for bar in 0..3 {
                for beat in 0..4 {
                    assert_eq!(state.section(), "Main A");
                    assert_eq!(state.bar(), bar);
                    assert_eq!(state.beat(), beat);
                    state.advance(&kit).unwrap();
                }
            }
        }
        assert_eq!(state.bar(), 0);
    }

    #[test]
    fn test_unclassified_section_loops() {
        let kit = kit(&[("Break", 1), ("Main A", 2)]);
        let mut state = SectionState::new(&kit);
        state.jump("Break");

        let transitions = advance_n(&mut state, &kit, 4);
        assert_eq!(transitions[3], Transition::Loop);
        assert_eq!(state.section(), "Break");
    }

    #[test]
    fn test_one_shot_returns_to_main() {
        let kit = kit(&[("Main A", 8), ("Main B", 8), ("Fill In B", 2)]);
        let mut state = SectionState::new(&kit);
        state.jump("Fill In B");

        let transitions = advance_n(&mut state, &kit, 8);
        assert_eq!(
            transitions[7],
            Transition::ReturnToMain {
                from: "Fill In B".to_string(),
                to: "Main B".to_string()
            }
        );
        assert_eq!(state.section(), "Main B");
        assert_eq!(state.bar(), 0);
        assert_eq!(state.beat(), 0);
    }

    #[test]
    fn test_fill_returns_to_matching_main() {
        let kit = kit(&[("Main A", 4), ("Main B", 4), ("Fill In A", 1)]);
        let mut state = SectionState::new(&kit);
        state.jump("Fill In A");

        advance_n(&mut state, &kit, 4);
        assert_eq!(state.section(), "Main A");
    }

    #[test]
    fn test_fill_falls_back_to_first_main() {
        let kit = kit(&[("Main B", 4), ("Fill In A", 1)]);
        let mut state = SectionState::new(&kit);
        state.jump("Fill In A");

        advance_n(&mut state, &kit, 4);
        assert_eq!(state.section(), "Main B");
    }

    #[test]
    fn test_intro_and_ending_are_one_shot() {
        let kit = kit(&[("Intro A", 1), ("Main A", 4), ("Ending A", 2)]);
        let mut state = SectionState::new(&kit);

        state.jump("Intro A");
        advance_n(&mut state, &kit, 4);
        assert_eq!(state.section(), "Main A");

        state.jump("Ending A");
        advance_n(&mut state, &kit, 8);
        assert_eq!(state.section(), "Main A");
    }

    #[test]
    fn test_queued_section_lands_on_next_bar() {
        let kit = kit(&[("Main A", 8), ("Fill In A", 1)]);
        let mut state = SectionState::new(&kit);

        // Into bar 2, beat 1
        advance_n(&mut state, &kit, 9);
        assert_eq!((state.bar(), state.beat()), (2, 1));

        state.queue("Fill In A");
        advance_n(&mut state, &kit, 2);
        assert_eq!(state.section(), "Main A");
        assert_eq!(state.pending(), Some("Fill In A"));

        let transition = state.advance(&kit).unwrap();
        assert_eq!(
            transition,
            Transition::Pending {
                from: "Main A".to_string(),
                to: "Fill In A".to_string()
            }
        );
        assert_eq!(state.section(), "Fill In A");
        assert_eq!(state.bar(), 0);
        assert_eq!(state.beat(), 0);
        assert_eq!(state.pending(), None);
    }

    #[test]
    fn test_pending_overrides_return_to_main() {
        let kit = kit(&[("Main A", 4), ("Main B", 4), ("Fill In A", 1)]);
        let mut state = SectionState::new(&kit);
        state.jump("Fill In A");
        state.queue("Main B");

        advance_n(&mut state, &kit, 4);
        assert_eq!(state.section(), "Main B");
    }

    #[test]
    fn test_pending_overrides_loop() {
        let kit = kit(&[("Main A", 1), ("Main B", 4)]);
        let mut state = SectionState::new(&kit);
        state.queue("Main B");

        advance_n(&mut state, &kit, 4);
        assert_eq!(state.section(), "Main B");
        assert_eq!(state.bar(), 0);
    }

    #[test]
    fn test_last_queue_wins() {
        let kit = kit(&[("Main A", 4), ("Main B", 4), ("Fill In A", 1)]);
        let mut state = SectionState::new(&kit);

        state.queue("Fill In A");
        state.queue("Main B");
        assert_eq!(state.pending(), Some("Main B"));

        advance_n(&mut state, &kit, 4);
        assert_eq!(state.section(), "Main B");
    }

    #[test]
    fn test_jump_resets_bar_and_beat() {
        let kit = kit(&[("Main A", 4), ("Main B", 4)]);
        let mut state = SectionState::new(&kit);
        advance_n(&mut state, &kit, 6);

        state.jump("Main B");
        assert_eq!(state.section(), "Main B");
        assert_eq!(state.bar(), 0);
        assert_eq!(state.beat(), 0);
    }

    #[test]
    fn test_reset() {
        let kit = kit(&[("Intro A", 1), ("Main A", 4), ("Main B", 4)]);
        let mut state = SectionState::new(&kit);
        state.jump("Main B");
        advance_n(&mut state, &kit, 5);
        state.queue("Intro A");

        state.reset(&kit);
        assert_eq!(state.position(), &PlaybackPosition::at_section("Main A"));
    }

    #[test]
    fn test_unknown_current_section_is_error() {
        let kit = kit(&[("Main A", 4)]);
        let mut state = SectionState::new(&kit);
        state.jump("Missing");
        assert!(matches!(
            state.advance(&kit),
            Err(KitError::UnknownSection(_))
        ));
    }

    #[test]
    fn test_format_position() {
        let pos = PlaybackPosition::at_section("Main A");
        assert_eq!(pos.format(), "Main A 1.1");
    }
}
