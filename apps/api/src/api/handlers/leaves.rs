use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::AuthUser;
use crate::domain::leave::{BalanceEntry, BalanceSummary, LeaveRequest, LeaveStatus, LeaveType};
use crate::domain::user::Role;
use crate::services::access::{full_names, load_rules, load_user, managed_member_ids};
use crate::services::leave::{self, LeaveInput};
use crate::services::reporting::{self, AdminDashboard};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub half_day: bool,
    pub status: LeaveStatus,
    pub comment: String,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<Uuid>,
}

impl From<&LeaveRequest> for LeaveResponse {
    fn from(request: &LeaveRequest) -> Self {
        Self {
            id: request.id(),
            user_id: request.user_id(),
            leave_type: request.leave_type(),
            start_date: request.start_date(),
            end_date: request.end_date(),
            half_day: request.half_day(),
            status: request.status(),
            comment: request.comment().to_string(),
            submitted_at: request.submitted_at(),
            decided_at: request.decided_at(),
            decided_by: request.decided_by(),
        }
    }
}

fn newest_first(mut requests: Vec<LeaveRequest>) -> Vec<LeaveResponse> {
    requests.sort_by_key(|r| std::cmp::Reverse(r.submitted_at()));
    requests.iter().map(LeaveResponse::from).collect()
}

/// POST /api/leaves
pub async fn create_leave(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<LeaveInput>,
) -> Result<(StatusCode, Json<LeaveResponse>), ApiError> {
    let request = leave::create_leave(&state, &user, input).await?;
    Ok((StatusCode::CREATED, Json(LeaveResponse::from(&request))))
}

/// GET /api/leaves
pub async fn list_leaves(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<LeaveResponse>>, ApiError> {
    let requests = state.leaves.find_by_user(user.id).await?;
    Ok(Json(newest_first(requests)))
}

/// GET /api/leaves/:id
pub async fn get_leave(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let request = leave::load_own_leave(&state, &user, id).await?;
    Ok(Json(LeaveResponse::from(&request)))
}

/// PUT /api/leaves/:id
pub async fn update_leave(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<LeaveInput>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let request = leave::update_leave(&state, &user, id, input).await?;
    Ok(Json(LeaveResponse::from(&request)))
}

/// DELETE /api/leaves/:id
pub async fn delete_leave(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    leave::delete_leave(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    pub year: Option<i32>,
}

/// GET /api/leaves/balance
pub async fn get_balance(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceSummary>, ApiError> {
    let rules = load_rules(&state).await?;
    let year = query.year.unwrap_or_else(|| state.clock.today().year());
    let summary = leave::balance_summary(&state, &rules, user.id, year).await?;
    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
pub struct LeaveDashboard {
    pub balance: BalanceSummary,
    pub requests: Vec<LeaveResponse>,
}

/// GET /api/leaves/dashboard
pub async fn leave_dashboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<LeaveDashboard>, ApiError> {
    let rules = load_rules(&state).await?;
    let year = state.clock.today().year();
    let balance = leave::balance_summary(&state, &rules, user.id, year).await?;
    let requests = newest_first(state.leaves.find_by_user(user.id).await?);
    Ok(Json(LeaveDashboard { balance, requests }))
}

#[derive(Debug, Serialize)]
pub struct PendingLeave {
    #[serde(flatten)]
    pub request: LeaveResponse,
    pub employee: String,
}

/// Pending requests of the members of the caller's teams
///
/// GET /api/manager/leaves/pending
pub async fn pending_leaves(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<PendingLeave>>, ApiError> {
    auth.require_role(&[Role::Manager, Role::Admin])?;
    let members = managed_member_ids(&state, auth.0.id).await?;
    if members.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let mut requests = state.leaves.find_pending_for_users(&members).await?;
    requests.sort_by_key(LeaveRequest::submitted_at);
    let names = full_names(&state, &members).await?;
    let pending = requests
        .iter()
        .map(|r| PendingLeave {
            request: LeaveResponse::from(r),
            employee: names.get(&r.user_id()).cloned().unwrap_or_default(),
        })
        .collect();
    Ok(Json(pending))
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub status: LeaveStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

/// POST /api/manager/leaves/:id/decision
pub async fn decide_leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<DecisionRequest>,
) -> Result<Json<LeaveResponse>, ApiError> {
    auth.require_role(&[Role::Manager, Role::Admin])?;
    let request = leave::decide_leave(&state, &auth.0, id, req.status, req.comment).await?;
    Ok(Json(LeaveResponse::from(&request)))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub user_id: Option<Uuid>,
}

/// Balance movements, newest first
///
/// GET /api/admin/balance-history
pub async fn balance_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<BalanceEntry>>, ApiError> {
    auth.require_admin()?;
    let mut entries = match query.user_id {
        Some(user_id) => state.balances.history_for_user(user_id).await?,
        None => state.balances.list_all().await?,
    };
    entries.sort_by_key(|e| std::cmp::Reverse(e.changed_at));
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentRequest {
    pub user_id: Uuid,
    pub difference: Decimal,
    #[serde(default)]
    pub note: Option<String>,
}

/// POST /api/admin/balance-adjustments
pub async fn adjust_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AdjustmentRequest>,
) -> Result<(StatusCode, Json<BalanceEntry>), ApiError> {
    auth.require_admin()?;
    load_user(&state, req.user_id).await?;
    let entry = leave::adjust_balance(&state, &auth.0, req.user_id, req.difference, req.note).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/admin/dashboard
pub async fn admin_dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<AdminDashboard>, ApiError> {
    auth.require_admin()?;
    Ok(Json(reporting::admin_dashboard(&state).await?))
}
