// Working-day counting for leave requests, with calendar-year splitting

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::domain::rules::GlobalRules;

/// Part of a leave request falling inside a single calendar year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearSegment {
    pub year: i32,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Decimal,
}

/// Splits `[start, end]` at every January 1st it crosses
pub fn split_by_year(start: NaiveDate, end: NaiveDate) -> Vec<(i32, NaiveDate, NaiveDate)> {
    let mut parts = Vec::new();
    if end < start {
        return parts;
    }
    let mut cursor = start;
    while cursor <= end {
        let year = cursor.year();
        let year_end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(end);
        let part_end = year_end.min(end);
        parts.push((year, cursor, part_end));
        match part_end.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }
    parts
}

/// Leave days consumed by `[start, end]`
///
/// Only working days count. A half-day request counts 0.5 when its
/// single date is a working day.
pub fn leave_days(rules: &GlobalRules, start: NaiveDate, end: NaiveDate, half_day: bool) -> Decimal {
    let working = Decimal::from(rules.working_days_between(start, end));
    if half_day {
        working * dec!(0.5)
    } else {
        working
    }
}

/// Leave days of `[start, end]` that fall inside `[window_start, window_end]`
pub fn leave_days_within(
    rules: &GlobalRules,
    start: NaiveDate,
    end: NaiveDate,
    half_day: bool,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Decimal {
    let from = start.max(window_start);
    let to = end.min(window_end);
    if to < from {
        return Decimal::ZERO;
    }
    leave_days(rules, from, to, half_day)
}

/// Per-year breakdown of a leave range; years without working days are kept
/// with zero days so callers see the full span
pub fn year_segments(
    rules: &GlobalRules,
    start: NaiveDate,
    end: NaiveDate,
    half_day: bool,
) -> Vec<YearSegment> {
    split_by_year(start, end)
        .into_iter()
        .map(|(year, from, to)| YearSegment {
            year,
            start: from,
            end: to,
            days: leave_days(rules, from, to, half_day),
        })
        .collect()
}
