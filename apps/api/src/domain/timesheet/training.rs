use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "training_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrainingKind {
    Internal,
    External,
    SelfStudy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingDraft {
    pub kind: TrainingKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours: Decimal,
}

/// A training declared by an employee
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Training {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub kind: TrainingKind,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours: Decimal,
}

impl Training {
    pub fn new(employee_id: Uuid, draft: TrainingDraft) -> DomainResult<Self> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("Training title cannot be empty"));
        }
        if draft.end_date < draft.start_date {
            return Err(DomainError::validation(
                "End date must be on or after start date",
            ));
        }
        if draft.hours <= Decimal::ZERO {
            return Err(DomainError::validation("Training hours must be positive"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            employee_id,
            kind: draft.kind,
            title,
            description: draft.description,
            start_date: draft.start_date,
            end_date: draft.end_date,
            hours: draft.hours,
        })
    }
}
