//! # Calendar Helpers
//!
//! Date formatting and month arithmetic shared by the timeline,
//! progress and checklist modules. Dates travel as `YYYY-MM-DD` strings.

use crate::PlaybookError;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Month};

/// `YYYY-MM-DD`
pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> Result<String, PlaybookError> {
    date.format(DATE_FORMAT)
        .map_err(|e| PlaybookError::DateError(e.to_string()))
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<Date, PlaybookError> {
    Date::parse(s.trim(), DATE_FORMAT)
        .map_err(|e| PlaybookError::DateError(format!("'{}': {}", s, e)))
}

/// Last day of the given month.
pub fn last_day_of_month(year: i32, month: Month) -> Result<Date, PlaybookError> {
    let (next_year, next_month) = if month == Month::December {
        (year + 1, Month::January)
    } else {
        (year, month.next())
    };
    Date::from_calendar_date(next_year, next_month, 1)
        .map_err(|e| PlaybookError::DateError(e.to_string()))?
        .previous_day()
        .ok_or_else(|| PlaybookError::DateError("date out of range".to_string()))
}

/// Shift a date by whole calendar months, clamping the day to the
/// length of the target month (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: Date, months: i32) -> Result<Date, PlaybookError> {
    let index = date.year() * 12 + (date.month() as i32 - 1) + months;
    let year = index.div_euclid(12);
    let month = Month::try_from((index.rem_euclid(12) + 1) as u8)
        .map_err(|e| PlaybookError::DateError(e.to_string()))?;
    let last = last_day_of_month(year, month)?;
    Date::from_calendar_date(year, month, date.day().min(last.day()))
        .map_err(|e| PlaybookError::DateError(e.to_string()))
}

/// Whole calendar months from `from` to `to`, rounded down.
///
/// Zero when `to` is not after `from`.
pub fn whole_months_between(from: Date, to: Date) -> Result<u32, PlaybookError> {
    if to <= from {
        return Ok(0);
    }
    let mut months =
        (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32);
    if months > 0 && add_months(from, months)? > to {
        months -= 1;
    }
    Ok(months.max(0) as u32)
}

/// Serde adapter for `Date` as `YYYY-MM-DD`.
pub mod iso_date {
    use super::{format_date, parse_date};
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let s = format_date(*date).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_date(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn month_end_clamps() {
        assert_eq!(
            add_months(date!(2026 - 01 - 31), 1).expect("add"),
            date!(2026 - 02 - 28)
        );
        assert_eq!(
            add_months(date!(2028 - 01 - 31), 1).expect("add"),
            date!(2028 - 02 - 29)
        );
    }

    #[test]
    fn negative_months_cross_year() {
        assert_eq!(
            add_months(date!(2026 - 03 - 15), -4).expect("add"),
            date!(2025 - 11 - 15)
        );
    }

    #[test]
    fn last_day_handles_december() {
        assert_eq!(
            last_day_of_month(2026, Month::December).expect("last"),
            date!(2026 - 12 - 31)
        );
    }

    #[test]
    fn whole_months_round_down() {
        assert_eq!(
            whole_months_between(date!(2026 - 01 - 15), date!(2026 - 03 - 14)).expect("months"),
            1
        );
        assert_eq!(
            whole_months_between(date!(2026 - 01 - 15), date!(2026 - 03 - 15)).expect("months"),
            2
        );
        assert_eq!(
            whole_months_between(date!(2026 - 03 - 15), date!(2026 - 01 - 15)).expect("months"),
            0
        );
    }

    #[test]
    fn parse_and_format() {
        let d = parse_date("2026-10-19").expect("parse");
        assert_eq!(format_date(d).expect("format"), "2026-10-19");
        assert!(parse_date("19/10/2026").is_err());
    }
}
