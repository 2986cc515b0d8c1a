use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// A public holiday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
    /// Falls on the same date every year
    #[serde(default)]
    pub fixed: bool,
}

/// Organisation-wide rules used by leave and timesheet computations
///
/// A single instance exists; it is created with [`GlobalRules::default`]
/// on first access.
///
/// # Invariants
/// - At least one working day
/// - `work_start < work_end`
/// - Lunch break lies within working hours and `lunch_start < lunch_end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalRules {
    pub working_days: Vec<Weekday>,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
    #[serde(default)]
    pub holiday_country: Option<String>,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub lunch_start: NaiveTime,
    pub lunch_end: NaiveTime,
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

impl Default for GlobalRules {
    fn default() -> Self {
        Self {
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            holidays: Vec::new(),
            holiday_country: None,
            work_start: hm(9, 0),
            work_end: hm(17, 0),
            lunch_start: hm(13, 30),
            lunch_end: hm(14, 0),
        }
    }
}

impl GlobalRules {
    /// Checks the rule set invariants and normalizes the lists
    pub fn validate(mut self) -> DomainResult<Self> {
        self.working_days.sort_by_key(|d| d.num_days_from_monday());
        self.working_days.dedup();
        if self.working_days.is_empty() {
            return Err(DomainError::validation("At least one working day is required"));
        }
        if self.work_start >= self.work_end {
            return Err(DomainError::validation("Work start must be before work end"));
        }
        if self.lunch_start >= self.lunch_end {
            return Err(DomainError::validation("Lunch start must be before lunch end"));
        }
        if self.lunch_start < self.work_start || self.lunch_end > self.work_end {
            return Err(DomainError::validation("Lunch break must be within working hours"));
        }
        self.holidays.sort_by_key(|h| h.date);
        self.holidays.dedup_by_key(|h| h.date);
        Ok(self)
    }

    /// True when `date` is a configured public holiday
    ///
    /// Fixed holidays recur every year on the same month and day.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.iter().any(|h| {
            h.date == date || (h.fixed && h.date.month() == date.month() && h.date.day() == date.day())
        })
    }

    /// True when `date` is a working weekday and not a holiday
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.working_days.contains(&date.weekday()) && !self.is_holiday(date)
    }

    /// Number of working days in `[start, end]`, zero when the range is empty
    pub fn working_days_between(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        if end < start {
            return 0;
        }
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_working_day(*d))
            .count() as u32
    }

    /// Number of holidays that fall inside `year`
    pub fn holidays_in_year(&self, year: i32) -> u32 {
        let (Some(first), Some(last)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return 0;
        };
        first
            .iter_days()
            .take_while(|d| *d <= last)
            .filter(|d| self.is_holiday(*d))
            .count() as u32
    }

    /// Paid working hours per day (working span minus lunch break)
    pub fn daily_hours(&self) -> Decimal {
        let worked = (self.work_end - self.work_start) - (self.lunch_end - self.lunch_start);
        Decimal::from(worked.num_minutes()) / Decimal::from(60)
    }
}
