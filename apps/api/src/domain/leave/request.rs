use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Kind of absence being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "leave_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    /// Paid leave, debited from the balance
    Paid,
    /// Reduction of working time days
    Rtt,
    Sick,
    Unpaid,
    Exceptional,
}

impl LeaveType {
    /// True for leave types charged against the paid-leave balance
    pub fn debits_balance(&self) -> bool {
        matches!(self, LeaveType::Paid)
    }
}

/// Lifecycle status of a leave request
///
/// # Status Transitions
/// ```text
/// Pending -> Approved
///         -> Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "leave_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn can_transition_to(&self, next: LeaveStatus) -> bool {
        use LeaveStatus::*;
        matches!((self, next), (Pending, Approved) | (Pending, Rejected))
    }
}

impl std::fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeaveStatus::Pending => write!(f, "pending"),
            LeaveStatus::Approved => write!(f, "approved"),
            LeaveStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Leave request aggregate
///
/// # Invariants
/// - `end_date >= start_date`
/// - A half-day request covers a single date
/// - Only pending requests can be edited or decided
#[derive(Debug, Clone)]
pub struct LeaveRequest {
    id: Uuid,
    user_id: Uuid,
    leave_type: LeaveType,
    start_date: NaiveDate,
    end_date: NaiveDate,
    half_day: bool,
    status: LeaveStatus,
    comment: String,
    submitted_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
    decided_by: Option<Uuid>,
}

fn validate_range(
    start_date: NaiveDate,
    end_date: NaiveDate,
    half_day: bool,
    today: NaiveDate,
) -> DomainResult<()> {
    if start_date < today {
        return Err(DomainError::validation("Start date cannot be in the past"));
    }
    if end_date < start_date {
        return Err(DomainError::validation("End date must be on or after start date"));
    }
    if half_day && start_date != end_date {
        return Err(DomainError::validation("A half-day request must cover a single day"));
    }
    Ok(())
}

impl LeaveRequest {
    /// Creates a pending leave request
    ///
    /// `today` is the reference date for the "not in the past" rule.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: Uuid,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        half_day: bool,
        comment: String,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_range(start_date, end_date, half_day, today)?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            leave_type,
            start_date,
            end_date,
            half_day,
            status: LeaveStatus::Pending,
            comment,
            submitted_at: now,
            decided_at: None,
            decided_by: None,
        })
    }

    /// Edits a pending request
    pub fn amend(
        &mut self,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        half_day: bool,
        comment: String,
        today: NaiveDate,
    ) -> DomainResult<()> {
        self.ensure_pending("Only pending requests can be modified")?;
        validate_range(start_date, end_date, half_day, today)?;
        self.leave_type = leave_type;
        self.start_date = start_date;
        self.end_date = end_date;
        self.half_day = half_day;
        self.comment = comment;
        Ok(())
    }

    /// Fails unless the request is still pending
    pub fn ensure_pending(&self, message: &str) -> DomainResult<()> {
        if self.status != LeaveStatus::Pending {
            return Err(DomainError::validation(message));
        }
        Ok(())
    }

    /// Records a manager decision
    pub fn decide(
        &mut self,
        next: LeaveStatus,
        decided_by: Uuid,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.decided_by = Some(decided_by);
        self.decided_at = Some(now);
        if let Some(comment) = comment.filter(|c| !c.trim().is_empty()) {
            self.comment = comment;
        }
        Ok(())
    }

    /// Inclusive date-range intersection test
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    /// Pending and approved requests block their date range
    pub fn blocks_dates(&self) -> bool {
        matches!(self.status, LeaveStatus::Pending | LeaveStatus::Approved)
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn leave_type(&self) -> LeaveType {
        self.leave_type
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn half_day(&self) -> bool {
        self.half_day
    }

    pub fn status(&self) -> LeaveStatus {
        self.status
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    pub fn decided_by(&self) -> Option<Uuid> {
        self.decided_by
    }

    /// Reconstructs a LeaveRequest from persistence layer data
    ///
    /// Only to be used by repository implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        user_id: Uuid,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        half_day: bool,
        status: LeaveStatus,
        comment: String,
        submitted_at: DateTime<Utc>,
        decided_at: Option<DateTime<Utc>>,
        decided_by: Option<Uuid>,
    ) -> Self {
        Self {
            id,
            user_id,
            leave_type,
            start_date,
            end_date,
            half_day,
            status,
            comment,
            submitted_at,
            decided_at,
            decided_by,
        }
    }
}

/// Rejects `[start, end]` when it intersects another blocking request
///
/// `ignore` is the id of the request being edited, if any.
pub fn ensure_no_overlap(
    existing: &[LeaveRequest],
    start: NaiveDate,
    end: NaiveDate,
    ignore: Option<Uuid>,
) -> DomainResult<()> {
    match existing
        .iter()
        .filter(|r| Some(r.id()) != ignore && r.blocks_dates())
        .find(|r| r.overlaps(start, end))
    {
        Some(clash) => Err(DomainError::Overlap {
            start: clash.start_date(),
            end: clash.end_date(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(start: NaiveDate, end: NaiveDate) -> LeaveRequest {
        LeaveRequest::new(
            Uuid::new_v4(),
            LeaveType::Paid,
            start,
            end,
            false,
            String::new(),
            date(2025, 1, 1),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn new_request_is_pending() {
        let r = request(date(2025, 8, 10), date(2025, 8, 15));
        assert_eq!(r.status(), LeaveStatus::Pending);
        assert!(r.decided_at().is_none());
    }

    #[test]
    fn start_in_past_is_rejected() {
        let result = LeaveRequest::new(
            Uuid::new_v4(),
            LeaveType::Paid,
            date(2024, 12, 30),
            date(2025, 1, 2),
            false,
            String::new(),
            date(2025, 1, 1),
            Utc::now(),
        );
        assert!(result.unwrap_err().to_string().contains("past"));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let result = LeaveRequest::new(
            Uuid::new_v4(),
            LeaveType::Paid,
            date(2025, 3, 5),
            date(2025, 3, 3),
            false,
            String::new(),
            date(2025, 1, 1),
            Utc::now(),
        );
        assert!(result.unwrap_err().to_string().contains("End date"));
    }

    #[test]
    fn half_day_over_several_days_is_rejected() {
        let result = LeaveRequest::new(
            Uuid::new_v4(),
            LeaveType::Paid,
            date(2025, 3, 3),
            date(2025, 3, 4),
            true,
            String::new(),
            date(2025, 1, 1),
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn approve_then_reject_is_invalid() {
        let mut r = request(date(2025, 8, 10), date(2025, 8, 15));
        let manager = Uuid::new_v4();
        r.decide(LeaveStatus::Approved, manager, Some("ok".into()), Utc::now())
            .unwrap();
        assert_eq!(r.status(), LeaveStatus::Approved);
        assert_eq!(r.decided_by(), Some(manager));
        assert_eq!(r.comment(), "ok");

        let err = r
            .decide(LeaveStatus::Rejected, manager, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn decided_request_cannot_be_amended() {
        let mut r = request(date(2025, 8, 10), date(2025, 8, 15));
        r.decide(LeaveStatus::Rejected, Uuid::new_v4(), None, Utc::now())
            .unwrap();
        let result = r.amend(
            LeaveType::Rtt,
            date(2025, 8, 11),
            date(2025, 8, 12),
            false,
            String::new(),
            date(2025, 1, 1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn overlap_detection_is_inclusive() {
        let r = request(date(2025, 8, 10), date(2025, 8, 15));
        assert!(r.overlaps(date(2025, 8, 15), date(2025, 8, 20)));
        assert!(r.overlaps(date(2025, 8, 1), date(2025, 8, 10)));
        assert!(!r.overlaps(date(2025, 8, 16), date(2025, 8, 20)));
    }

    #[test]
    fn rejected_requests_do_not_block_dates() {
        let mut rejected = request(date(2025, 8, 10), date(2025, 8, 15));
        rejected
            .decide(LeaveStatus::Rejected, Uuid::new_v4(), None, Utc::now())
            .unwrap();
        let pending = request(date(2025, 9, 1), date(2025, 9, 2));
        let existing = vec![rejected, pending.clone()];

        assert!(ensure_no_overlap(&existing, date(2025, 8, 12), date(2025, 8, 13), None).is_ok());
        assert!(ensure_no_overlap(&existing, date(2025, 9, 2), date(2025, 9, 3), None).is_err());
        // Editing a request never clashes with itself
        assert!(ensure_no_overlap(
            &existing,
            date(2025, 9, 2),
            date(2025, 9, 3),
            Some(pending.id())
        )
        .is_ok());
    }
}
