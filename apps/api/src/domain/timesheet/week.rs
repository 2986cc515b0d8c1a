use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// ISO-8601 week identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IsoWeek {
    pub year: i32,
    pub week: u32,
}

impl IsoWeek {
    /// Fails when `week` does not exist in `year` (e.g. week 53 of 2025)
    pub fn new(year: i32, week: u32) -> DomainResult<Self> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(|_| Self { year, week })
            .ok_or_else(|| DomainError::validation(format!("Invalid ISO week {}/{}", week, year)))
    }

    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    pub fn monday(&self) -> NaiveDate {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn sunday(&self) -> NaiveDate {
        self.monday() + Duration::days(6)
    }

    /// Monday through Sunday
    pub fn dates(&self) -> [NaiveDate; 7] {
        let monday = self.monday();
        std::array::from_fn(|i| monday + Duration::days(i as i64))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        IsoWeek::of(date) == *self
    }
}

impl std::fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// Submission state of an employee's week
///
/// # Status Transitions
/// ```text
/// Draft ----> Submitted ----> Validated
///               ^    |
///               |    v
///             Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "week_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WeekStatus {
    #[default]
    Draft,
    Submitted,
    Validated,
    Rejected,
}

impl WeekStatus {
    pub fn can_transition_to(&self, next: WeekStatus) -> bool {
        use WeekStatus::*;
        matches!(
            (self, next),
            (Draft, Submitted) | (Rejected, Submitted) | (Submitted, Validated) | (Submitted, Rejected)
        )
    }

    /// Entries of a submitted or validated week are frozen
    pub fn is_locked(&self) -> bool {
        matches!(self, WeekStatus::Submitted | WeekStatus::Validated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeekStatus::Draft => "draft",
            WeekStatus::Submitted => "submitted",
            WeekStatus::Validated => "validated",
            WeekStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for WeekStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One employee's ISO week of imputations
///
/// A week row only exists once it has been submitted; a missing row
/// reads as `Draft`.
#[derive(Debug, Clone)]
pub struct TimesheetWeek {
    id: Uuid,
    employee_id: Uuid,
    week: IsoWeek,
    status: WeekStatus,
    submitted_at: Option<DateTime<Utc>>,
    validated_at: Option<DateTime<Utc>>,
    validated_by: Option<Uuid>,
    comment: String,
}

impl TimesheetWeek {
    pub fn new(employee_id: Uuid, week: IsoWeek) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id,
            week,
            status: WeekStatus::Draft,
            submitted_at: None,
            validated_at: None,
            validated_by: None,
            comment: String::new(),
        }
    }

    /// `entry_count` is the number of imputations recorded in the week
    pub fn submit(&mut self, entry_count: usize, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.status.can_transition_to(WeekStatus::Submitted) {
            return Err(DomainError::validation(format!(
                "Week {} is already {}",
                self.week, self.status
            )));
        }
        if entry_count == 0 {
            return Err(DomainError::validation(
                "Cannot submit a week without any imputation",
            ));
        }
        self.status = WeekStatus::Submitted;
        self.submitted_at = Some(now);
        self.validated_at = None;
        self.validated_by = None;
        Ok(())
    }

    pub fn validate(&mut self, by: Uuid, comment: Option<String>, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(WeekStatus::Validated)?;
        self.validated_at = Some(now);
        self.validated_by = Some(by);
        self.comment = comment.unwrap_or_default();
        Ok(())
    }

    pub fn reject(&mut self, by: Uuid, comment: Option<String>, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(WeekStatus::Rejected)?;
        self.validated_at = Some(now);
        self.validated_by = Some(by);
        self.comment = comment.unwrap_or_default();
        Ok(())
    }

    fn transition(&mut self, next: WeekStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Fails when entries of this week can no longer change
    pub fn ensure_editable(&self) -> DomainResult<()> {
        ensure_week_editable(self.week, self.status)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn employee_id(&self) -> Uuid {
        self.employee_id
    }

    pub fn week(&self) -> IsoWeek {
        self.week
    }

    pub fn status(&self) -> WeekStatus {
        self.status
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn validated_at(&self) -> Option<DateTime<Utc>> {
        self.validated_at
    }

    pub fn validated_by(&self) -> Option<Uuid> {
        self.validated_by
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        employee_id: Uuid,
        week: IsoWeek,
        status: WeekStatus,
        submitted_at: Option<DateTime<Utc>>,
        validated_at: Option<DateTime<Utc>>,
        validated_by: Option<Uuid>,
        comment: String,
    ) -> Self {
        Self {
            id,
            employee_id,
            week,
            status,
            submitted_at,
            validated_at,
            validated_by,
            comment,
        }
    }
}

/// Same check as [`TimesheetWeek::ensure_editable`] for callers holding
/// only a status (missing rows are drafts)
pub fn ensure_week_editable(week: IsoWeek, status: WeekStatus) -> DomainResult<()> {
    if status.is_locked() {
        return Err(DomainError::WeekLocked {
            year: week.year,
            week: week.week,
            status: status.to_string(),
        });
    }
    Ok(())
}
