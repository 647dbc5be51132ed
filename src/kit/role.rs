// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Section roles derived from free-form labels.

use std::fmt;

/// Musical role of a section, classified from its label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionRole {
    /// Count-in or opening groove, played once
    Intro,
    /// Main groove variation, loops until interrupted
    Main,
    /// Fill, played once then returns to a main groove
    Fill,
    /// Ending, played once
    Ending,
    /// Label matched none of the known roles
    Unclassified,
}

impl SectionRole {
    /// Classify a label by case-insensitive substring.
    ///
    /// One-shot roles are checked before `Main`, so a label carrying both
    /// keywords behaves as a one-shot section.
    pub fn classify(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("fill") {
            SectionRole::Fill
        } else if lower.contains("intro") {
            SectionRole::Intro
        } else if lower.contains("end") {
            // Covers "ending" as well
            SectionRole::Ending
        } else if lower.contains("main") {
            SectionRole::Main
        } else {
            SectionRole::Unclassified
        }
    }

    /// Whether sections of this role play once and hand back to a main groove
    pub fn is_one_shot(&self) -> bool {
        matches!(
            self,
            SectionRole::Fill | SectionRole::Intro | SectionRole::Ending
        )
    }

    /// All roles in display order
    pub fn all() -> [SectionRole; 5] {
        [
            SectionRole::Intro,
            SectionRole::Main,
            SectionRole::Fill,
            SectionRole::Ending,
            SectionRole::Unclassified,
        ]
    }
}

impl fmt::Display for SectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionRole::Intro => "intro",
            SectionRole::Main => "main",
            SectionRole::Fill => "fill",
            SectionRole::Ending => "ending",
            SectionRole::Unclassified => "other",
        };
        f.write_str(name)
    }
}

/// Variant letter of a label: first character of its last whitespace token.
///
/// "Fill In A" gives `Some('A')`; a blank label gives `None`.
pub fn variant_letter(label: &str) -> Option<char> {
    label.split_whitespace().last().and_then(|token| token.chars().next())
}
