// Leave request workflow and balance bookkeeping

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::access::{ensure_manages, load_rules};
use crate::api::errors::ApiError;
use crate::domain::leave::{
    compute_balance, ensure_no_overlap, leave_days, year_segments, BalanceEntry, BalanceInputs,
    BalanceSummary, Entitlement, LeaveRequest, LeaveStatus, LeaveType,
};
use crate::domain::leave::days::leave_days_within;
use crate::domain::rules::GlobalRules;
use crate::domain::user::User;
use crate::state::AppState;

/// Body of leave creation and edition requests
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveInput {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub half_day: bool,
    #[serde(default)]
    pub comment: String,
}

/// Entitlement of `user_id` for `year`
///
/// Teams are scanned by name; the first one carrying a policy or a
/// member override for the user wins.
pub async fn entitlement_for(
    state: &AppState,
    rules: &GlobalRules,
    user_id: Uuid,
    year: i32,
) -> Result<Entitlement, ApiError> {
    for team in state.teams.find_by_member(user_id).await? {
        let policy = state.policies.find_policy(team.id()).await?;
        let rule = state.policies.find_member_rule(team.id(), user_id).await?;
        if policy.is_some() || rule.is_some() {
            return Ok(Entitlement::resolve(policy.as_ref(), rule.as_ref(), rules, year));
        }
    }
    Ok(Entitlement::resolve(None, None, rules, year))
}

/// Balance of `user_id` for `year` as of the state clock
pub async fn balance_summary(
    state: &AppState,
    rules: &GlobalRules,
    user_id: Uuid,
    year: i32,
) -> Result<BalanceSummary, ApiError> {
    let entitlement = entitlement_for(state, rules, user_id, year).await?;
    let requests = state.leaves.find_by_user(user_id).await?;
    let history = state.balances.history_for_user(user_id).await?;
    let inputs = BalanceInputs {
        rules,
        entitlement,
        requests: &requests,
        history: &history,
        today: state.clock.today(),
    };
    Ok(compute_balance(&inputs, year))
}

fn year_window(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

/// Checks every yearly segment of a paid request against that year's
/// remaining balance
///
/// `own` is the stored version of the request being edited or approved;
/// its pending days are not counted against itself.
async fn ensure_paid_coverage(
    state: &AppState,
    rules: &GlobalRules,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    half_day: bool,
    own: Option<&LeaveRequest>,
) -> Result<(), ApiError> {
    for segment in year_segments(rules, start, end, half_day) {
        if segment.days <= Decimal::ZERO {
            continue;
        }
        let summary = balance_summary(state, rules, user_id, segment.year).await?;
        let already_pending = match (own, year_window(segment.year)) {
            (Some(r), Some((from, to)))
                if r.status() == LeaveStatus::Pending && r.leave_type().debits_balance() =>
            {
                leave_days_within(rules, r.start_date(), r.end_date(), r.half_day(), from, to)
            }
            _ => Decimal::ZERO,
        };
        summary.ensure_covers(segment.days, already_pending)?;
    }
    Ok(())
}

/// Rules shared by creation and edition
async fn validate_input(
    state: &AppState,
    rules: &GlobalRules,
    user_id: Uuid,
    input: &LeaveInput,
    own: Option<&LeaveRequest>,
) -> Result<(), ApiError> {
    if leave_days(rules, input.start_date, input.end_date, input.half_day) <= Decimal::ZERO {
        return Err(ApiError::bad_request(
            "The requested period contains no working day",
        ));
    }
    let existing = state.leaves.find_by_user(user_id).await?;
    ensure_no_overlap(
        &existing,
        input.start_date,
        input.end_date,
        own.map(LeaveRequest::id),
    )?;
    if input.leave_type.debits_balance() {
        ensure_paid_coverage(
            state,
            rules,
            user_id,
            input.start_date,
            input.end_date,
            input.half_day,
            own,
        )
        .await?;
    }
    Ok(())
}

pub async fn create_leave(
    state: &AppState,
    user: &User,
    input: LeaveInput,
) -> Result<LeaveRequest, ApiError> {
    let rules = load_rules(state).await?;
    let request = LeaveRequest::new(
        user.id,
        input.leave_type,
        input.start_date,
        input.end_date,
        input.half_day,
        input.comment.clone(),
        state.clock.today(),
        state.clock.now(),
    )?;
    validate_input(state, &rules, user.id, &input, None).await?;
    state.leaves.save(&request).await?;

    tracing::info!(
        request_id = %request.id(),
        user_id = %user.id,
        leave_type = ?request.leave_type(),
        "leave request submitted"
    );
    Ok(request)
}

/// Loads a request owned by `user` (403 for someone else's)
pub async fn load_own_leave(state: &AppState, user: &User, id: Uuid) -> Result<LeaveRequest, ApiError> {
    let request = state
        .leaves
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Leave request not found"))?;
    if request.user_id() != user.id {
        return Err(ApiError::forbidden("This leave request belongs to another user"));
    }
    Ok(request)
}

pub async fn update_leave(
    state: &AppState,
    user: &User,
    id: Uuid,
    input: LeaveInput,
) -> Result<LeaveRequest, ApiError> {
    let rules = load_rules(state).await?;
    let stored = load_own_leave(state, user, id).await?;
    let mut request = stored.clone();
    request.amend(
        input.leave_type,
        input.start_date,
        input.end_date,
        input.half_day,
        input.comment.clone(),
        state.clock.today(),
    )?;
    validate_input(state, &rules, user.id, &input, Some(&stored)).await?;
    state.leaves.save(&request).await?;
    Ok(request)
}

pub async fn delete_leave(state: &AppState, user: &User, id: Uuid) -> Result<(), ApiError> {
    let request = load_own_leave(state, user, id).await?;
    request.ensure_pending("Only pending requests can be deleted")?;
    state.leaves.delete(id).await?;
    Ok(())
}

/// Approves or rejects a pending request
///
/// Approved paid leave is re-checked against the balance and logged in
/// the balance history, one entry per calendar year it touches.
pub async fn decide_leave(
    state: &AppState,
    manager: &User,
    id: Uuid,
    decision: LeaveStatus,
    comment: Option<String>,
) -> Result<LeaveRequest, ApiError> {
    if decision == LeaveStatus::Pending {
        return Err(ApiError::bad_request("Status must be approved or rejected"));
    }
    let stored = state
        .leaves
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Leave request not found"))?;
    if !manager.is_admin() {
        ensure_manages(state, manager, stored.user_id()).await?;
    }

    let rules = load_rules(state).await?;
    let debits = decision == LeaveStatus::Approved && stored.leave_type().debits_balance();
    if debits {
        ensure_paid_coverage(
            state,
            &rules,
            stored.user_id(),
            stored.start_date(),
            stored.end_date(),
            stored.half_day(),
            Some(&stored),
        )
        .await?;
    }

    let mut request = stored;
    request.decide(decision, manager.id, comment, state.clock.now())?;
    state.leaves.save(&request).await?;

    if debits {
        for segment in year_segments(&rules, request.start_date(), request.end_date(), request.half_day()) {
            if segment.days <= Decimal::ZERO {
                continue;
            }
            let after = balance_summary(state, &rules, request.user_id(), segment.year).await?;
            let entry = BalanceEntry::new(
                request.user_id(),
                -segment.days,
                after.balance,
                Some(request.id()),
                format!("Paid leave from {} to {}", segment.start, segment.end),
                state.clock.now(),
            );
            state.balances.append(&entry).await?;
        }
    }

    tracing::info!(
        request_id = %request.id(),
        decided_by = %manager.id,
        status = %request.status(),
        "leave request decided"
    );
    Ok(request)
}

/// Records a manual balance correction for the current year
pub async fn adjust_balance(
    state: &AppState,
    admin: &User,
    user_id: Uuid,
    difference: Decimal,
    note: Option<String>,
) -> Result<BalanceEntry, ApiError> {
    if difference.is_zero() {
        return Err(ApiError::bad_request("Difference cannot be zero"));
    }
    let rules = load_rules(state).await?;
    let year = state.clock.today().year();
    let before = balance_summary(state, &rules, user_id, year).await?;
    let entry = BalanceEntry::new(
        user_id,
        difference,
        before.balance + difference,
        None,
        note.unwrap_or_else(|| "Manual adjustment".to_string()),
        state.clock.now(),
    );
    state.balances.append(&entry).await?;

    tracing::info!(user_id = %user_id, by = %admin.id, %difference, "balance adjusted");
    Ok(entry)
}
