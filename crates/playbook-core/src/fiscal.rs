//! # Fiscal-Year Engine
//!
//! Maps a fiscal year-end to the first P29 compliance period and its
//! reporting deadline, and provides the single "time remaining"
//! calculation every countdown uses.
//!
//! P29 applies to financial years beginning on or after
//! [`P29_EFFECTIVE_DATE`]. The first period for each year-end:
//!
//! | Year-end  | Period start | Period end | Reporting deadline |
//! |-----------|--------------|------------|--------------------|
//! | December  | 2026-01-01   | 2026-12-31 | 2027-04-30         |
//! | March     | 2026-04-01   | 2027-03-31 | 2027-07-31         |
//! | June      | 2026-07-01   | 2027-06-30 | 2027-10-31         |
//! | September | 2026-10-01   | 2027-09-30 | 2028-01-31         |
//!
//! Nothing here is persisted; only the year-end choice is stored.

use crate::dates::{add_months, iso_date, last_day_of_month, whole_months_between};
use crate::PlaybookError;
use crate::primitives::{P29_EFFECTIVE_DATE, REPORTING_WINDOW_MONTHS};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, Month};

// =============================================================================
// FISCAL YEAR-END
// =============================================================================

/// The four supported fiscal year-ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiscalYearEnd {
    December,
    March,
    June,
    September,
}

impl FiscalYearEnd {
    /// All year-ends in display order.
    pub const ALL: [Self; 4] = [Self::December, Self::March, Self::June, Self::September];

    /// Calendar month in which the fiscal year ends.
    #[must_use]
    pub fn end_month(&self) -> Month {
        match self {
            Self::December => Month::December,
            Self::March => Month::March,
            Self::June => Month::June,
            Self::September => Month::September,
        }
    }

    /// Lower-case identifier, as stored.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::December => "december",
            Self::March => "march",
            Self::June => "june",
            Self::September => "september",
        }
    }
}

impl std::fmt::Display for FiscalYearEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FiscalYearEnd {
    type Err = PlaybookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|fye| fye.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                PlaybookError::InvalidInput(format!(
                    "Unknown fiscal year-end '{}' (expected december, march, june or september)",
                    s
                ))
            })
    }
}

// =============================================================================
// COMPLIANCE PERIOD
// =============================================================================

/// Where "today" sits relative to a compliance period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    NotStarted,
    InProgress,
    Ended,
}

/// A financial year subject to P29.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompliancePeriod {
    #[serde(with = "iso_date")]
    pub start: Date,
    #[serde(with = "iso_date")]
    pub end: Date,
}

impl CompliancePeriod {
    /// The period beginning exactly one year later.
    pub fn next_year(&self) -> Result<Self, PlaybookError> {
        let start = add_months(self.start, 12)?;
        Ok(Self {
            start,
            end: period_end(start)?,
        })
    }

    /// Last day for publishing the annual report that covers this period.
    pub fn reporting_deadline(&self) -> Result<Date, PlaybookError> {
        let shifted = add_months(self.end, REPORTING_WINDOW_MONTHS)?;
        last_day_of_month(shifted.year(), shifted.month())
    }

    /// Status of the period on `today`.
    #[must_use]
    pub fn status(&self, today: Date) -> PeriodStatus {
        if today < self.start {
            PeriodStatus::NotStarted
        } else if today <= self.end {
            PeriodStatus::InProgress
        } else {
            PeriodStatus::Ended
        }
    }
}

fn period_end(start: Date) -> Result<Date, PlaybookError> {
    add_months(start, 12)?
        .previous_day()
        .ok_or_else(|| PlaybookError::DateError("date out of range".to_string()))
}

/// First financial year beginning on or after the effective date.
pub fn first_compliance_period(fye: FiscalYearEnd) -> Result<CompliancePeriod, PlaybookError> {
    let start_month = fye.end_month().next();
    let mut start = Date::from_calendar_date(P29_EFFECTIVE_DATE.year(), start_month, 1)
        .map_err(|e| PlaybookError::DateError(e.to_string()))?;
    if start < P29_EFFECTIVE_DATE {
        start = add_months(start, 12)?;
    }
    Ok(CompliancePeriod {
        start,
        end: period_end(start)?,
    })
}

/// The compliance period relevant on `today`.
///
/// The first period, rolled forward by whole years while `today` is
/// already past its end.
pub fn compliance_period(
    fye: FiscalYearEnd,
    today: Date,
) -> Result<CompliancePeriod, PlaybookError> {
    let mut period = first_compliance_period(fye)?;
    while today > period.end {
        period = period.next_year()?;
    }
    Ok(period)
}

/// The period whose annual report is still due on `today`.
///
/// Stays on a finished period until its reporting deadline has passed.
pub fn declaration_period(
    fye: FiscalYearEnd,
    today: Date,
) -> Result<CompliancePeriod, PlaybookError> {
    let mut period = first_compliance_period(fye)?;
    while today > period.reporting_deadline()? {
        period = period.next_year()?;
    }
    Ok(period)
}

// =============================================================================
// TIME REMAINING
// =============================================================================

/// Countdown to a deadline.
///
/// `months` is rounded down: it counts whole calendar months that fit
/// between `now` and the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRemaining {
    pub days: i64,
    pub months: u32,
    pub is_past: bool,
}

/// Time left from `now` until `deadline`.
///
/// A deadline equal to `now` has zero time left but is not yet past.
pub fn time_remaining(deadline: Date, now: Date) -> Result<TimeRemaining, PlaybookError> {
    if now > deadline {
        return Ok(TimeRemaining {
            days: 0,
            months: 0,
            is_past: true,
        });
    }
    Ok(TimeRemaining {
        days: (deadline - now).whole_days(),
        months: whole_months_between(now, deadline)?,
        is_past: false,
    })
}

/// Time left until P29 takes effect.
pub fn time_until_effective(now: Date) -> Result<TimeRemaining, PlaybookError> {
    time_remaining(P29_EFFECTIVE_DATE, now)
}

// =============================================================================
// TESTS
// =============================================================================
