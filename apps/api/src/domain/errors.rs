use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Business rule violations raised by domain entities
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Insufficient leave balance: requested {requested} days, available {available}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Leave request overlaps an existing request from {start} to {end}")]
    Overlap { start: NaiveDate, end: NaiveDate },

    #[error("Week {week}/{year} is {status} and can no longer be modified")]
    WeekLocked { year: i32, week: u32, status: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
