//! # Personalised Timeline
//!
//! Spreads the four roadmap phases over the preparation window that
//! ends with the first compliance period.
//!
//! The window starts `track_months` (from the maturity level) before the
//! period end. If that date is already behind us the plan starts today
//! and is flagged as behind schedule. Phases before the level's starting
//! phase are skipped; the remaining ones split the window by fixed
//! weights, the last phase absorbing rounding.

use crate::PlaybookError;
use crate::dates::{add_months, iso_date};
use crate::fiscal::{
    CompliancePeriod, FiscalYearEnd, TimeRemaining, compliance_period, declaration_period,
    time_remaining,
};
use crate::maturity::MaturityLevel;
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

/// Roadmap phase names and their share of the preparation window.
pub const ROADMAP_PHASES: [(&str, u32); 4] = [
    ("Scope and assess", 25),
    ("Design and document", 30),
    ("Test and remediate", 30),
    ("Declare and sustain", 15),
];

// =============================================================================
// TYPES
// =============================================================================

/// Where a phase sits relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Skipped,
    Done,
    Active,
    Upcoming,
}

/// Scheduled dates of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseWindow {
    #[serde(with = "iso_date")]
    pub start: Date,
    #[serde(with = "iso_date")]
    pub end: Date,
}

/// One phase of the personalised plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePhase {
    pub number: u8,
    pub name: String,
    pub window: Option<PhaseWindow>,
    pub status: PhaseStatus,
}

/// The personalised plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub fiscal_year_end: FiscalYearEnd,
    pub level: MaturityLevel,
    pub period: CompliancePeriod,
    /// Deadline of the report still due on the build date.
    #[serde(with = "iso_date")]
    pub reporting_deadline: Date,
    #[serde(with = "iso_date")]
    pub plan_start: Date,
    pub behind_schedule: bool,
    pub until_period_start: TimeRemaining,
    pub until_period_end: TimeRemaining,
    pub until_reporting_deadline: TimeRemaining,
    pub phases: Vec<TimelinePhase>,
}

impl Timeline {
    /// The phase that contains today, if any.
    #[must_use]
    pub fn active_phase(&self) -> Option<&TimelinePhase> {
        self.phases.iter().find(|p| p.status == PhaseStatus::Active)
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Build the plan for a year-end and maturity level as seen on `today`.
pub fn build_timeline(
    fye: FiscalYearEnd,
    level: MaturityLevel,
    today: Date,
) -> Result<Timeline, PlaybookError> {
    let period = compliance_period(fye, today)?;
    let reporting_deadline = declaration_period(fye, today)?.reporting_deadline()?;

    let ideal_start = add_months(period.end, -(level.track_months() as i32))?;
    let behind_schedule = today > ideal_start;
    let plan_start = if behind_schedule { today } else { ideal_start };

    let phases = schedule_phases(level.starting_phase(), plan_start, period.end, today);

    Ok(Timeline {
        fiscal_year_end: fye,
        level,
        period,
        reporting_deadline,
        plan_start,
        behind_schedule,
        until_period_start: time_remaining(period.start, today)?,
        until_period_end: time_remaining(period.end, today)?,
        until_reporting_deadline: time_remaining(reporting_deadline, today)?,
        phases,
    })
}

fn schedule_phases(starting_phase: u8, start: Date, end: Date, today: Date) -> Vec<TimelinePhase> {
    let total_days = (end - start).whole_days().max(0);
    let active_weight: u32 = ROADMAP_PHASES
        .iter()
        .enumerate()
        .filter(|(i, _)| (*i as u8 + 1) >= starting_phase)
        .map(|(_, (_, w))| *w)
        .sum();

    let mut cursor = start;
    let mut phases = Vec::with_capacity(ROADMAP_PHASES.len());
    for (i, (name, weight)) in ROADMAP_PHASES.iter().enumerate() {
        let number = i as u8 + 1;
        if number < starting_phase {
            phases.push(TimelinePhase {
                number,
                name: (*name).to_string(),
                window: None,
                status: PhaseStatus::Skipped,
            });
            continue;
        }

        let is_last = i + 1 == ROADMAP_PHASES.len();
        let phase_end = if is_last {
            end
        } else {
            let days = total_days * (*weight as i64) / (active_weight.max(1) as i64);
            cursor
                .checked_add(Duration::days(days))
                .unwrap_or(end)
                .min(end)
        };

        let status = if phase_end < today {
            PhaseStatus::Done
        } else if cursor <= today {
            PhaseStatus::Active
        } else {
            PhaseStatus::Upcoming
        };

        phases.push(TimelinePhase {
            number,
            name: (*name).to_string(),
            window: Some(PhaseWindow {
                start: cursor,
                end: phase_end,
            }),
            status,
        });
        cursor = phase_end.next_day().unwrap_or(phase_end).min(end);
    }
    phases
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn level_one_december_on_schedule() {
        let timeline = build_timeline(
            FiscalYearEnd::December,
            MaturityLevel::Level1,
            date!(2025 - 03 - 01),
        )
        .expect("timeline");

        assert_eq!(timeline.plan_start, date!(2025 - 06 - 30));
        assert!(!timeline.behind_schedule);
        assert!(timeline.phases.iter().all(|p| p.status == PhaseStatus::Upcoming));
        let last = timeline.phases.last().and_then(|p| p.window).expect("window");
        assert_eq!(last.end, date!(2026 - 12 - 31));
    }

    #[test]
    fn mature_organisation_skips_early_phases() {
        let timeline = build_timeline(
            FiscalYearEnd::March,
            MaturityLevel::Level4,
            date!(2026 - 01 - 10),
        )
        .expect("timeline");

        let statuses: Vec<_> = timeline.phases.iter().map(|p| p.status).collect();
        assert_eq!(statuses[0], PhaseStatus::Skipped);
        assert_eq!(statuses[1], PhaseStatus::Skipped);
        assert!(timeline.phases[2].window.is_some());
        assert_eq!(timeline.plan_start, date!(2026 - 09 - 30));
    }

    #[test]
    fn late_start_is_behind_schedule() {
        let today = date!(2026 - 10 - 19);
        let timeline =
            build_timeline(FiscalYearEnd::December, MaturityLevel::Level1, today).expect("timeline");

        assert!(timeline.behind_schedule);
        assert_eq!(timeline.plan_start, today);
        assert_eq!(timeline.active_phase().map(|p| p.number), Some(1));
        assert!(timeline.until_period_start.is_past);
        assert!(!timeline.until_period_end.is_past);
    }

    #[test]
    fn phase_windows_are_contiguous() {
        let timeline = build_timeline(
            FiscalYearEnd::September,
            MaturityLevel::Level2,
            date!(2025 - 01 - 01),
        )
        .expect("timeline");

        let windows: Vec<_> = timeline.phases.iter().filter_map(|p| p.window).collect();
        assert_eq!(windows.len(), 4);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end.next_day(), Some(pair[1].start));
        }
    }

    #[test]
    fn deadline_of_finished_period_until_published() {
        let today = date!(2027 - 02 - 01);
        let timeline =
            build_timeline(FiscalYearEnd::December, MaturityLevel::Level3, today).expect("timeline");

        assert_eq!(timeline.period.start, date!(2027 - 01 - 01));
        assert_eq!(timeline.reporting_deadline, date!(2027 - 04 - 30));
        assert_eq!(timeline.until_reporting_deadline.days, 88);
    }
}
