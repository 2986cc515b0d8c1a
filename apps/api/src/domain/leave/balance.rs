// Paid-leave balance computation and history entries

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::days::leave_days_within;
use super::policy::Entitlement;
use super::request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::rules::GlobalRules;

/// One movement of an employee's paid-leave balance
///
/// `balance` is the balance right after the movement. Entries tied to an
/// approved request carry its id; manual adjustments do not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub changed_at: DateTime<Utc>,
    pub difference: Option<Decimal>,
    pub balance: Decimal,
    pub leave_request_id: Option<Uuid>,
    pub note: String,
}

impl BalanceEntry {
    pub fn new(
        user_id: Uuid,
        difference: Decimal,
        balance: Decimal,
        leave_request_id: Option<Uuid>,
        note: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            changed_at: now,
            difference: Some(difference),
            balance,
            leave_request_id,
            note: note.into(),
        }
    }

    /// Manual adjustments are the entries not produced by a leave approval
    pub fn is_adjustment(&self) -> bool {
        self.leave_request_id.is_none()
    }
}

/// Everything needed to compute one employee's balance for a year
pub struct BalanceInputs<'a> {
    pub rules: &'a GlobalRules,
    pub entitlement: Entitlement,
    pub requests: &'a [LeaveRequest],
    pub history: &'a [BalanceEntry],
    pub today: NaiveDate,
}

/// Paid-leave position of an employee for one calendar year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSummary {
    pub year: i32,
    pub annual_entitlement: Decimal,
    pub accrued: Decimal,
    pub adjustments: Decimal,
    pub paid_taken: Decimal,
    pub rtt_taken: Decimal,
    pub taken_this_month: Decimal,
    pub pending_paid: Decimal,
    /// `accrued + adjustments - paid_taken`
    pub balance: Decimal,
    /// `balance - pending_paid`
    pub remaining: Decimal,
}

impl BalanceSummary {
    /// Fails when `requested` paid days exceed what is left once the
    /// other pending requests are accounted for
    ///
    /// `already_pending` is the part of `pending_paid` belonging to the
    /// request being checked, so re-checking a pending request at approval
    /// time does not count it twice.
    pub fn ensure_covers(&self, requested: Decimal, already_pending: Decimal) -> DomainResult<()> {
        let available = self.remaining + already_pending;
        if requested > available {
            return Err(DomainError::InsufficientBalance {
                requested,
                available: available.max(Decimal::ZERO),
            });
        }
        Ok(())
    }
}

/// Computes the balance for `year`
///
/// Accrual runs up to today for the current year and over the full year
/// otherwise. Request days are charged to the year they fall in; balances
/// do not carry over between years.
pub fn compute_balance(inputs: &BalanceInputs<'_>, year: i32) -> BalanceSummary {
    let rules = inputs.rules;
    let (Some(year_start), Some(year_end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return BalanceSummary::empty(year, inputs.entitlement.annual_days);
    };

    let accrual_end = if year == inputs.today.year() {
        inputs.today
    } else {
        year_end
    };
    let worked = rules.working_days_between(year_start, accrual_end);
    let accrued = inputs.entitlement.accrued(worked);

    let adjustments: Decimal = inputs
        .history
        .iter()
        .filter(|e| e.is_adjustment() && e.changed_at.year() == year)
        .filter_map(|e| e.difference)
        .sum();

    let (month_start, month_end) = month_window(inputs.today);

    let mut paid_taken = Decimal::ZERO;
    let mut rtt_taken = Decimal::ZERO;
    let mut pending_paid = Decimal::ZERO;
    let mut taken_this_month = Decimal::ZERO;

    for request in inputs.requests {
        let days = leave_days_within(
            rules,
            request.start_date(),
            request.end_date(),
            request.half_day(),
            year_start,
            year_end,
        );
        match (request.status(), request.leave_type()) {
            (LeaveStatus::Approved, LeaveType::Paid) => paid_taken += days,
            (LeaveStatus::Approved, LeaveType::Rtt) => rtt_taken += days,
            (LeaveStatus::Pending, LeaveType::Paid) => pending_paid += days,
            _ => {}
        }
        if request.status() == LeaveStatus::Approved && month_start.year() == year {
            taken_this_month += leave_days_within(
                rules,
                request.start_date(),
                request.end_date(),
                request.half_day(),
                month_start,
                month_end,
            );
        }
    }

    let balance = accrued + adjustments - paid_taken;
    BalanceSummary {
        year,
        annual_entitlement: inputs.entitlement.annual_days,
        accrued,
        adjustments,
        paid_taken,
        rtt_taken,
        taken_this_month,
        pending_paid,
        balance,
        remaining: balance - pending_paid,
    }
}

impl BalanceSummary {
    fn empty(year: i32, annual_entitlement: Decimal) -> Self {
        Self {
            year,
            annual_entitlement,
            accrued: Decimal::ZERO,
            adjustments: Decimal::ZERO,
            paid_taken: Decimal::ZERO,
            rtt_taken: Decimal::ZERO,
            taken_this_month: Decimal::ZERO,
            pending_paid: Decimal::ZERO,
            balance: Decimal::ZERO,
            remaining: Decimal::ZERO,
        }
    }
}

fn month_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today.with_day(1).unwrap_or(today);
    let next_month = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
    };
    let end = next_month.and_then(|d| d.pred_opt()).unwrap_or(today);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entitlement() -> Entitlement {
        Entitlement {
            annual_days: dec!(18),
            annual_working_days: 240,
        }
    }

    fn request(
        user: Uuid,
        leave_type: LeaveType,
        start: NaiveDate,
        end: NaiveDate,
        status: LeaveStatus,
    ) -> LeaveRequest {
        LeaveRequest::from_persistence(
            Uuid::new_v4(),
            user,
            leave_type,
            start,
            end,
            false,
            status,
            String::new(),
            Utc::now(),
            None,
            None,
        )
    }

    #[test]
    fn balance_with_no_activity_equals_accrual() {
        let rules = GlobalRules::default();
        let inputs = BalanceInputs {
            rules: &rules,
            entitlement: entitlement(),
            requests: &[],
            history: &[],
            // 2025-01-01..2025-02-28 holds 43 working days
            today: date(2025, 2, 28),
        };
        let summary = compute_balance(&inputs, 2025);

        assert_eq!(summary.accrued, dec!(3.23));
        assert_eq!(summary.balance, dec!(3.23));
        assert_eq!(summary.remaining, dec!(3.23));
    }

    #[test]
    fn approved_and_pending_paid_leave_are_tracked() {
        let rules = GlobalRules::default();
        let user = Uuid::new_v4();
        let requests = vec![
            // Mon 3 - Wed 5 March: 3 days approved
            request(user, LeaveType::Paid, date(2025, 3, 3), date(2025, 3, 5), LeaveStatus::Approved),
            // Thu 10 - Fri 11 April: 2 days pending
            request(user, LeaveType::Paid, date(2025, 4, 10), date(2025, 4, 11), LeaveStatus::Pending),
            // RTT day approved
            request(user, LeaveType::Rtt, date(2025, 3, 7), date(2025, 3, 7), LeaveStatus::Approved),
            // Rejected request ignored
            request(user, LeaveType::Paid, date(2025, 5, 5), date(2025, 5, 9), LeaveStatus::Rejected),
        ];
        let inputs = BalanceInputs {
            rules: &rules,
            entitlement: entitlement(),
            requests: &requests,
            history: &[],
            today: date(2025, 3, 20),
        };
        let summary = compute_balance(&inputs, 2025);

        assert_eq!(summary.paid_taken, dec!(3));
        assert_eq!(summary.rtt_taken, dec!(1));
        assert_eq!(summary.pending_paid, dec!(2));
        assert_eq!(summary.taken_this_month, dec!(4));
        assert_eq!(summary.balance, summary.accrued - dec!(3));
        assert_eq!(summary.remaining, summary.balance - dec!(2));
    }

    #[test]
    fn request_across_years_is_charged_per_year() {
        let rules = GlobalRules::default();
        let user = Uuid::new_v4();
        // Mon 29 Dec 2025 - Fri 2 Jan 2026: 3 days in 2025, 2 in 2026
        let requests = vec![request(
            user,
            LeaveType::Paid,
            date(2025, 12, 29),
            date(2026, 1, 2),
            LeaveStatus::Approved,
        )];
        let inputs = BalanceInputs {
            rules: &rules,
            entitlement: entitlement(),
            requests: &requests,
            history: &[],
            today: date(2025, 12, 1),
        };

        assert_eq!(compute_balance(&inputs, 2025).paid_taken, dec!(3));
        let next = compute_balance(&inputs, 2026);
        assert_eq!(next.paid_taken, dec!(2));
        // A future year accrues its full allowance
        assert_eq!(next.accrued, dec!(18));
    }

    #[test]
    fn adjustments_of_the_year_are_added() {
        let rules = GlobalRules::default();
        let user = Uuid::new_v4();
        let history = vec![
            BalanceEntry::new(user, dec!(2), dec!(2), None, "carry over", "2025-01-15T10:00:00Z".parse().unwrap()),
            BalanceEntry::new(user, dec!(-5), dec!(0), Some(Uuid::new_v4()), "leave", "2025-02-01T10:00:00Z".parse().unwrap()),
            BalanceEntry::new(user, dec!(4), dec!(4), None, "old", "2024-06-01T10:00:00Z".parse().unwrap()),
        ];
        let inputs = BalanceInputs {
            rules: &rules,
            entitlement: entitlement(),
            requests: &[],
            history: &history,
            today: date(2025, 1, 31),
        };
        let summary = compute_balance(&inputs, 2025);
        assert_eq!(summary.adjustments, dec!(2));
    }

    #[test]
    fn coverage_check_accounts_for_own_pending_days() {
        let summary = BalanceSummary {
            remaining: dec!(1),
            ..BalanceSummary::empty(2025, dec!(18))
        };
        assert!(summary.ensure_covers(dec!(3), dec!(0)).is_err());
        assert!(summary.ensure_covers(dec!(3), dec!(2)).is_ok());
    }

    #[test]
    fn month_window_handles_december() {
        let (start, end) = month_window(date(2025, 12, 15));
        assert_eq!(start, date(2025, 12, 1));
        assert_eq!(end, date(2025, 12, 31));
    }
}
