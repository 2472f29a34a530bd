//! # Progress Tracker
//!
//! Points, milestones and completion metrics accumulated from user
//! actions.
//!
//! ## Invariants
//!
//! - `downloads` and `articles_read` hold each id at most once
//! - points only grow, except for the task-uncheck penalty (saturating at 0)
//! - points are adjusted by deltas, never recomputed from history
//! - a milestone once achieved stays achieved

use crate::ContentId;
use crate::dates::{format_date, parse_date};
use crate::milestone::{MilestoneId, ProgressEvent, rules_for, MILESTONE_RULES};
use crate::primitives::{
    MAX_VISIT_HISTORY, POINTS_ARTICLE_READ, POINTS_ASSESSMENT_COMPLETE, POINTS_DAILY_VISIT,
    POINTS_MILESTONE_BONUS, POINTS_TASK_COMPLETE, POINTS_TASK_UNCHECK_PENALTY,
    POINTS_TEMPLATE_DOWNLOAD,
};
use crate::PlaybookError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use time::{Date, OffsetDateTime};

// =============================================================================
// OVERALL PROGRESS WEIGHTS
// =============================================================================

/// Weight of having completed at least one assessment.
pub const WEIGHT_ASSESSMENT: u32 = 25;

/// Weight of the template download ratio.
pub const WEIGHT_DOWNLOADS: u32 = 25;

/// Weight of the task completion ratio.
pub const WEIGHT_TASKS: u32 = 35;

/// Weight of the article read ratio.
pub const WEIGHT_ARTICLES: u32 = 15;

// =============================================================================
// RECORD TYPES
// =============================================================================

/// A timestamped action on a piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ContentId,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// One completed assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub score: u32,
    pub domain_scores: BTreeMap<String, u32>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Achievement flag for one milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneState {
    pub id: MilestoneId,
    pub achieved: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}

/// role -> phase -> task -> checked
pub type TaskMap = BTreeMap<String, BTreeMap<String, BTreeMap<String, bool>>>;

/// Content counts used to normalise the overall percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressTotals {
    pub templates: usize,
    pub tasks: usize,
    pub articles: usize,
}

/// What a tracking call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackOutcome {
    /// Net change in points, milestone bonuses included.
    pub points_delta: i64,
    /// Milestones achieved by this call.
    pub milestones: Vec<MilestoneId>,
}

impl TrackOutcome {
    fn unchanged() -> Self {
        Self::default()
    }

    /// Whether the call changed the record.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.points_delta != 0 || !self.milestones.is_empty()
    }
}

// =============================================================================
// PROGRESS RECORD (persisted)
// =============================================================================

/// The whole progress document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(default)]
    tasks: TaskMap,
    #[serde(default)]
    downloads: Vec<Activity>,
    #[serde(default)]
    articles_read: Vec<Activity>,
    #[serde(default)]
    assessments: Vec<AssessmentRecord>,
    #[serde(default)]
    visit_dates: Vec<String>,
    #[serde(default)]
    milestones: Vec<MilestoneState>,
    #[serde(default)]
    points: u32,
}

impl ProgressRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Current points.
    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Task check state.
    #[must_use]
    pub fn tasks(&self) -> &TaskMap {
        &self.tasks
    }

    /// Whether a task is checked.
    #[must_use]
    pub fn is_task_complete(&self, role: &str, phase: &str, task: &str) -> bool {
        self.tasks
            .get(role)
            .and_then(|phases| phases.get(phase))
            .and_then(|tasks| tasks.get(task))
            .copied()
            .unwrap_or(false)
    }

    /// Number of checked tasks across all roles.
    #[must_use]
    pub fn completed_task_count(&self) -> usize {
        self.tasks
            .values()
            .flat_map(|phases| phases.values())
            .flat_map(|tasks| tasks.values())
            .filter(|&&done| done)
            .count()
    }

    /// Downloaded templates, oldest first.
    #[must_use]
    pub fn downloads(&self) -> &[Activity] {
        &self.downloads
    }

    /// Read articles, oldest first.
    #[must_use]
    pub fn articles_read(&self) -> &[Activity] {
        &self.articles_read
    }

    /// Completed assessments, oldest first.
    #[must_use]
    pub fn assessments(&self) -> &[AssessmentRecord] {
        &self.assessments
    }

    /// Visit days as `YYYY-MM-DD`.
    #[must_use]
    pub fn visit_dates(&self) -> &[String] {
        &self.visit_dates
    }

    /// Milestone flags, in table order.
    #[must_use]
    pub fn milestones(&self) -> Vec<MilestoneState> {
        MILESTONE_RULES
            .iter()
            .map(|rule| {
                self.milestones
                    .iter()
                    .find(|m| m.id == rule.id)
                    .cloned()
                    .unwrap_or(MilestoneState {
                        id: rule.id,
                        achieved: false,
                        timestamp: None,
                    })
            })
            .collect()
    }

    /// Whether a milestone has been achieved.
    #[must_use]
    pub fn is_achieved(&self, id: MilestoneId) -> bool {
        self.milestones.iter().any(|m| m.id == id && m.achieved)
    }

    // =========================================================================
    // TRACKING
    // =========================================================================

    /// Check or uncheck a roadmap task.
    ///
    /// Checking awards points once; unchecking a checked task applies the
    /// penalty. Repeating the current state changes nothing.
    pub fn track_task_completion(
        &mut self,
        role: &str,
        phase: &str,
        task: &str,
        completed: bool,
        now: OffsetDateTime,
    ) -> Result<TrackOutcome, PlaybookError> {
        if role.is_empty() || phase.is_empty() || task.is_empty() {
            return Err(PlaybookError::InvalidInput(
                "role, phase and task must be non-empty".to_string(),
            ));
        }
        let was_complete = self.is_task_complete(role, phase, task);
        if was_complete == completed {
            return Ok(TrackOutcome::unchanged());
        }

        self.tasks
            .entry(role.to_string())
            .or_default()
            .entry(phase.to_string())
            .or_default()
            .insert(task.to_string(), completed);

        let mut outcome = TrackOutcome::unchanged();
        if completed {
            self.award(POINTS_TASK_COMPLETE, &mut outcome);
        } else {
            let before = self.points;
            self.points = self.points.saturating_sub(POINTS_TASK_UNCHECK_PENALTY);
            outcome.points_delta -= i64::from(before - self.points);
        }
        self.evaluate(ProgressEvent::Task, now, &mut outcome);
        Ok(outcome)
    }

    /// Record a template download. Repeat downloads are ignored.
    pub fn track_template_download(
        &mut self,
        id: ContentId,
        now: OffsetDateTime,
    ) -> Result<TrackOutcome, PlaybookError> {
        if self.downloads.iter().any(|a| a.id == id) {
            return Ok(TrackOutcome::unchanged());
        }
        self.downloads.push(Activity { id, timestamp: now });

        let mut outcome = TrackOutcome::unchanged();
        self.award(POINTS_TEMPLATE_DOWNLOAD, &mut outcome);
        self.evaluate(ProgressEvent::Download, now, &mut outcome);
        Ok(outcome)
    }

    /// Record an article read. Re-reads are ignored.
    pub fn track_article_read(
        &mut self,
        id: ContentId,
        now: OffsetDateTime,
    ) -> Result<TrackOutcome, PlaybookError> {
        if self.articles_read.iter().any(|a| a.id == id) {
            return Ok(TrackOutcome::unchanged());
        }
        self.articles_read.push(Activity { id, timestamp: now });

        let mut outcome = TrackOutcome::unchanged();
        self.award(POINTS_ARTICLE_READ, &mut outcome);
        self.evaluate(ProgressEvent::Article, now, &mut outcome);
        Ok(outcome)
    }

    /// Record a completed assessment.
    ///
    /// Every completion is kept in history; only the first earns points.
    pub fn track_assessment_completion(
        &mut self,
        score: u32,
        domain_scores: BTreeMap<String, u32>,
        now: OffsetDateTime,
    ) -> Result<TrackOutcome, PlaybookError> {
        let first = self.assessments.is_empty();
        self.assessments.push(AssessmentRecord {
            score,
            domain_scores,
            timestamp: now,
        });

        let mut outcome = TrackOutcome::unchanged();
        if first {
            self.award(POINTS_ASSESSMENT_COMPLETE, &mut outcome);
        }
        self.evaluate(ProgressEvent::Assessment, now, &mut outcome);
        Ok(outcome)
    }

    /// Record a visit on the calendar day of `now`.
    pub fn track_visit(&mut self, now: OffsetDateTime) -> Result<TrackOutcome, PlaybookError> {
        let day = format_date(now.date())?;
        if self.visit_dates.contains(&day) {
            return Ok(TrackOutcome::unchanged());
        }
        self.visit_dates.push(day);
        // ISO dates sort chronologically; the oldest days go first
        self.visit_dates.sort_unstable();
        if self.visit_dates.len() > MAX_VISIT_HISTORY {
            let excess = self.visit_dates.len() - MAX_VISIT_HISTORY;
            self.visit_dates.drain(..excess);
        }

        let mut outcome = TrackOutcome::unchanged();
        self.award(POINTS_DAILY_VISIT, &mut outcome);
        self.evaluate(ProgressEvent::Visit, now, &mut outcome);
        Ok(outcome)
    }

    fn award(&mut self, points: u32, outcome: &mut TrackOutcome) {
        self.points = self.points.saturating_add(points);
        outcome.points_delta += i64::from(points);
    }

    /// Check the rules triggered by `event` and flip newly met milestones.
    fn evaluate(
        &mut self,
        event: ProgressEvent,
        now: OffsetDateTime,
        outcome: &mut TrackOutcome,
    ) {
        let today = now.date();
        let newly_met: Vec<MilestoneId> = rules_for(event)
            .filter(|rule| !self.is_achieved(rule.id) && (rule.condition)(self, today))
            .map(|rule| rule.id)
            .collect();

        for id in newly_met {
            self.mark_achieved(id, now);
            self.award(POINTS_MILESTONE_BONUS, outcome);
            outcome.milestones.push(id);
            tracing::info!(milestone = %id, "milestone achieved");
        }
    }

    /// Re-check every rule, e.g. after importing a record.
    pub fn evaluate_all(&mut self, now: OffsetDateTime) -> TrackOutcome {
        let mut outcome = TrackOutcome::unchanged();
        for event in [
            ProgressEvent::Task,
            ProgressEvent::Download,
            ProgressEvent::Article,
            ProgressEvent::Assessment,
            ProgressEvent::Visit,
        ] {
            self.evaluate(event, now, &mut outcome);
        }
        outcome
    }

    fn mark_achieved(&mut self, id: MilestoneId, now: OffsetDateTime) {
        match self.milestones.iter_mut().find(|m| m.id == id) {
            Some(m) => {
                m.achieved = true;
                m.timestamp = Some(now);
            }
            None => self.milestones.push(MilestoneState {
                id,
                achieved: true,
                timestamp: Some(now),
            }),
        }
    }

    // =========================================================================
    // DERIVED METRICS
    // =========================================================================

    /// Weighted completion percentage, clamped to 0..=100.
    #[must_use]
    pub fn overall_progress(&self, totals: &ProgressTotals) -> u8 {
        let assessment = if self.assessments.is_empty() { 0 } else { 100 };
        let downloads = ratio_percent(self.downloads.len(), totals.templates);
        let tasks = ratio_percent(self.completed_task_count(), totals.tasks);
        let articles = ratio_percent(self.articles_read.len(), totals.articles);

        let weighted = assessment * WEIGHT_ASSESSMENT
            + downloads * WEIGHT_DOWNLOADS
            + tasks * WEIGHT_TASKS
            + articles * WEIGHT_ARTICLES;
        (weighted / 100).min(100) as u8
    }

    /// Consecutive visit days ending today. Zero if today has no visit.
    #[must_use]
    pub fn streak(&self, today: Date) -> u32 {
        let days: BTreeSet<Date> = self
            .visit_dates
            .iter()
            .filter_map(|d| parse_date(d).ok())
            .collect();

        let mut streak = 0;
        let mut cursor = Some(today);
        while let Some(day) = cursor {
            if !days.contains(&day) {
                break;
            }
            streak += 1;
            cursor = day.previous_day();
        }
        streak
    }
}

/// `count / total` as a percentage capped at 100. Zero when `total` is zero.
fn ratio_percent(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count as u64).saturating_mul(100) / total as u64).min(100) as u32
}

// =============================================================================
// TESTS
// =============================================================================
