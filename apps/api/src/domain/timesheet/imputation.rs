use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

const MAX_DAILY_HOURS: Decimal = dec!(24);

/// What a block of hours was spent on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "time_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TimeCategory {
    #[default]
    Project,
    Training,
    Absence,
    Other,
}

impl TimeCategory {
    pub const ALL: [TimeCategory; 4] = [
        TimeCategory::Project,
        TimeCategory::Training,
        TimeCategory::Absence,
        TimeCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeCategory::Project => "project",
            TimeCategory::Training => "training",
            TimeCategory::Absence => "absence",
            TimeCategory::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeCategory::Project => "Productive hours (projects)",
            TimeCategory::Training => "Training",
            TimeCategory::Absence => "Absence",
            TimeCategory::Other => "Other activity",
        }
    }
}

/// User-supplied fields of an imputation, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct ImputationDraft {
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub training_id: Option<Uuid>,
    pub date: NaiveDate,
    pub hours: Decimal,
    #[serde(default)]
    pub category: TimeCategory,
    #[serde(default)]
    pub description: String,
}

impl ImputationDraft {
    /// Field-level rules; project membership and weekly locks are checked
    /// by the caller
    pub fn validate(&self) -> DomainResult<()> {
        if self.hours <= Decimal::ZERO || self.hours > MAX_DAILY_HOURS {
            return Err(DomainError::validation("Hours must be between 0 and 24"));
        }
        match self.category {
            TimeCategory::Project if self.project_id.is_none() => Err(DomainError::validation(
                "A project is required for project hours",
            )),
            TimeCategory::Project => Ok(()),
            _ if self.project_id.is_some() => Err(DomainError::validation(
                "Only project hours can reference a project",
            )),
            TimeCategory::Training => Ok(()),
            _ if self.training_id.is_some() => Err(DomainError::validation(
                "Only training hours can reference a training",
            )),
            _ => Ok(()),
        }
    }
}

/// A daily time entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Imputation {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub project_id: Option<Uuid>,
    pub training_id: Option<Uuid>,
    pub date: NaiveDate,
    pub hours: Decimal,
    pub category: TimeCategory,
    pub description: String,
    pub validated: bool,
    pub entered_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
    pub validated_by: Option<Uuid>,
}

impl Imputation {
    pub fn new(employee_id: Uuid, draft: ImputationDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            employee_id,
            project_id: draft.project_id,
            training_id: draft.training_id,
            date: draft.date,
            hours: draft.hours,
            category: draft.category,
            description: draft.description,
            validated: false,
            entered_at: now,
            validated_at: None,
            validated_by: None,
        })
    }

    pub fn amend(&mut self, draft: ImputationDraft) -> DomainResult<()> {
        if self.validated {
            return Err(DomainError::validation(
                "A validated imputation cannot be modified",
            ));
        }
        draft.validate()?;
        self.project_id = draft.project_id;
        self.training_id = draft.training_id;
        self.date = draft.date;
        self.hours = draft.hours;
        self.category = draft.category;
        self.description = draft.description;
        Ok(())
    }

    pub fn mark_validated(&mut self, by: Uuid, now: DateTime<Utc>) {
        self.validated = true;
        self.validated_at = Some(now);
        self.validated_by = Some(by);
    }
}

/// Fails when adding `hours` on a day already holding `same_day` entries
/// would exceed 24 hours
///
/// `editing` excludes the entry being replaced from the total.
pub fn ensure_daily_limit(
    same_day: &[Imputation],
    hours: Decimal,
    editing: Option<Uuid>,
) -> DomainResult<()> {
    let booked: Decimal = same_day
        .iter()
        .filter(|i| Some(i.id) != editing)
        .map(|i| i.hours)
        .sum();
    if booked + hours > MAX_DAILY_HOURS {
        return Err(DomainError::validation(format!(
            "Daily total cannot exceed 24 hours ({} already recorded)",
            booked
        )));
    }
    Ok(())
}
