//! # Maturity Assessment
//!
//! Eight yes/no checks scored into one of four maturity levels.
//!
//! | Level | Name       | True answers | Starting phase | Track     |
//! |-------|------------|--------------|----------------|-----------|
//! | 1     | Initial    | 0–2          | 1              | 18 months |
//! | 2     | Developing | 3–4          | 1              | 12 months |
//! | 3     | Defined    | 5–6          | 2              | 9 months  |
//! | 4     | Optimised  | 7–8          | 3              | 6 months  |
//!
//! The level only selects narrative recommendations and a starting
//! phase for the timeline. Nothing else depends on it.

use crate::primitives::MATURITY_QUESTIONS;
use crate::{PlaybookError, QuestionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// LEVEL THRESHOLDS
// =============================================================================

/// Minimum true answers for Level 2.
pub const LEVEL2_THRESHOLD: usize = 3;

/// Minimum true answers for Level 3.
pub const LEVEL3_THRESHOLD: usize = 5;

/// Minimum true answers for Level 4.
pub const LEVEL4_THRESHOLD: usize = 7;

// =============================================================================
// MATURITY LEVEL
// =============================================================================

/// Self-reported readiness bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaturityLevel {
    Level1,
    Level2,
    Level3,
    Level4,
}

impl MaturityLevel {
    /// Map a count of true answers to a level.
    #[must_use]
    pub fn from_score(score: usize) -> Self {
        if score >= LEVEL4_THRESHOLD {
            Self::Level4
        } else if score >= LEVEL3_THRESHOLD {
            Self::Level3
        } else if score >= LEVEL2_THRESHOLD {
            Self::Level2
        } else {
            Self::Level1
        }
    }

    /// Level number, 1 to 4.
    #[must_use]
    pub fn number(&self) -> u8 {
        match self {
            Self::Level1 => 1,
            Self::Level2 => 2,
            Self::Level3 => 3,
            Self::Level4 => 4,
        }
    }

    /// Get the level name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Level1 => "Initial",
            Self::Level2 => "Developing",
            Self::Level3 => "Defined",
            Self::Level4 => "Optimised",
        }
    }

    /// Roadmap phase (1-based) the organisation should start from.
    #[must_use]
    pub fn starting_phase(&self) -> u8 {
        match self {
            Self::Level1 | Self::Level2 => 1,
            Self::Level3 => 2,
            Self::Level4 => 3,
        }
    }

    /// Recommended preparation track in months.
    #[must_use]
    pub fn track_months(&self) -> u32 {
        match self {
            Self::Level1 => 18,
            Self::Level2 => 12,
            Self::Level3 => 9,
            Self::Level4 => 6,
        }
    }

    /// Narrative recommendation for the level.
    #[must_use]
    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::Level1 => {
                "Establish a risk framework and controls inventory before scoping material controls."
            }
            Self::Level2 => "Formalise material control definitions and assign accountable owners.",
            Self::Level3 => "Build the testing programme and route results into board reporting.",
            Self::Level4 => "Rehearse the declaration and tighten the assurance map.",
        }
    }

    /// Get the next level, if any.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Level1 => Some(Self::Level2),
            Self::Level2 => Some(Self::Level3),
            Self::Level3 => Some(Self::Level4),
            Self::Level4 => None,
        }
    }

    /// Minimum true answers for this level.
    #[must_use]
    pub fn threshold(&self) -> usize {
        match self {
            Self::Level1 => 0,
            Self::Level2 => LEVEL2_THRESHOLD,
            Self::Level3 => LEVEL3_THRESHOLD,
            Self::Level4 => LEVEL4_THRESHOLD,
        }
    }
}

impl std::fmt::Display for MaturityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Level {}: {}", self.number(), self.name())
    }
}

// =============================================================================
// ANSWER STATE (persisted)
// =============================================================================

/// Checkbox answers keyed by fixed question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaturityState {
    answers: BTreeMap<QuestionId, bool>,
}

impl MaturityState {
    /// Create an empty checklist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one of the eight fixed checks.
    pub fn set_answer(&mut self, id: QuestionId, value: bool) -> Result<(), PlaybookError> {
        if !MATURITY_QUESTIONS.contains(&id.as_str()) {
            return Err(PlaybookError::InvalidQuestion(id.to_string()));
        }
        self.answers.insert(id, value);
        Ok(())
    }

    /// The recorded value for a check (unanswered reads as false).
    #[must_use]
    pub fn answer(&self, id: &str) -> bool {
        self.answers
            .get(&QuestionId::new(id))
            .copied()
            .unwrap_or(false)
    }

    /// Count of true answers.
    #[must_use]
    pub fn score(&self) -> usize {
        self.answers.values().filter(|&&v| v).count()
    }

    /// Level derived from the score.
    #[must_use]
    pub fn maturity_level(&self) -> MaturityLevel {
        MaturityLevel::from_score(self.score())
    }

    /// Checks still missing to reach the next level, if any.
    #[must_use]
    pub fn answers_to_next_level(&self) -> Option<usize> {
        let next = self.maturity_level().next()?;
        Some(next.threshold().saturating_sub(self.score()))
    }

    /// Clear all answers.
    pub fn reset(&mut self) {
        self.answers.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
