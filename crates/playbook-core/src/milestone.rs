//! # Milestone Rules
//!
//! The five gamification milestones as a fixed rule table.
//!
//! Each rule names the progress events that can change its outcome.
//! After a mutation only the rules triggered by that event kind are
//! checked; a download never re-evaluates the streak rule.
//!
//! Achievement is monotonic: a rule that stops holding (a task gets
//! unchecked) does not take the milestone back.

use crate::progress::ProgressRecord;
use serde::{Deserialize, Serialize};
use time::Date;

/// Articles needed for `knowledge-seeker`.
pub const KNOWLEDGE_SEEKER_ARTICLES: usize = 5;

/// Consecutive visit days needed for `dedicated`.
pub const DEDICATED_STREAK_DAYS: u32 = 7;

// =============================================================================
// EVENTS
// =============================================================================

/// Kinds of progress-affecting mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressEvent {
    Task,
    Download,
    Article,
    Assessment,
    Visit,
}

// =============================================================================
// MILESTONES
// =============================================================================

/// Milestone identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MilestoneId {
    FirstSteps,
    FirstDownload,
    AssessmentComplete,
    KnowledgeSeeker,
    Dedicated,
}

impl MilestoneId {
    /// Stored identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstSteps => "first-steps",
            Self::FirstDownload => "first-download",
            Self::AssessmentComplete => "assessment-complete",
            Self::KnowledgeSeeker => "knowledge-seeker",
            Self::Dedicated => "dedicated",
        }
    }

    /// Display title from the rule table.
    #[must_use]
    pub fn title(&self) -> &'static str {
        rule(*self).map_or(self.as_str(), |r| r.title)
    }
}

impl std::fmt::Display for MilestoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A milestone condition and the events that can satisfy it.
#[derive(Debug, Clone, Copy)]
pub struct MilestoneRule {
    pub id: MilestoneId,
    pub title: &'static str,
    pub triggers: &'static [ProgressEvent],
    pub condition: fn(&ProgressRecord, Date) -> bool,
}

impl MilestoneRule {
    /// Whether this rule must be checked after `event`.
    #[must_use]
    pub fn is_triggered_by(&self, event: ProgressEvent) -> bool {
        self.triggers.contains(&event)
    }
}

fn has_completed_task(record: &ProgressRecord, _today: Date) -> bool {
    record.completed_task_count() > 0
}

fn has_download(record: &ProgressRecord, _today: Date) -> bool {
    !record.downloads().is_empty()
}

fn has_assessment(record: &ProgressRecord, _today: Date) -> bool {
    !record.assessments().is_empty()
}

fn is_knowledge_seeker(record: &ProgressRecord, _today: Date) -> bool {
    record.articles_read().len() >= KNOWLEDGE_SEEKER_ARTICLES
}

fn is_dedicated(record: &ProgressRecord, today: Date) -> bool {
    record.streak(today) >= DEDICATED_STREAK_DAYS
}

/// The fixed milestone table.
pub const MILESTONE_RULES: [MilestoneRule; 5] = [
    MilestoneRule {
        id: MilestoneId::FirstSteps,
        title: "First steps",
        triggers: &[ProgressEvent::Task],
        condition: has_completed_task,
    },
    MilestoneRule {
        id: MilestoneId::FirstDownload,
        title: "First download",
        triggers: &[ProgressEvent::Download],
        condition: has_download,
    },
    MilestoneRule {
        id: MilestoneId::AssessmentComplete,
        title: "Assessment complete",
        triggers: &[ProgressEvent::Assessment],
        condition: has_assessment,
    },
    MilestoneRule {
        id: MilestoneId::KnowledgeSeeker,
        title: "Knowledge seeker",
        triggers: &[ProgressEvent::Article],
        condition: is_knowledge_seeker,
    },
    MilestoneRule {
        id: MilestoneId::Dedicated,
        title: "Dedicated",
        triggers: &[ProgressEvent::Visit],
        condition: is_dedicated,
    },
];

/// Look up a rule by id.
#[must_use]
pub fn rule(id: MilestoneId) -> Option<&'static MilestoneRule> {
    MILESTONE_RULES.iter().find(|r| r.id == id)
}

/// Rules affected by an event.
pub fn rules_for(event: ProgressEvent) -> impl Iterator<Item = &'static MilestoneRule> {
    MILESTONE_RULES.iter().filter(move |r| r.is_triggered_by(event))
}

// =============================================================================
// TESTS
// =============================================================================
