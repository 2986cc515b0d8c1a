use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::AuthUser;
use crate::domain::leave::{AccrualPeriod, Entitlement, LeavePolicy, MemberLeaveRule, DEFAULT_ANNUAL_DAYS};
use crate::services::access::{ensure_team_authority, load_rules, load_team};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub team_id: Uuid,
    /// False while the team runs on defaults
    pub configured: bool,
    pub annual_days: Decimal,
    pub annual_working_days: u32,
    /// Working days used for accrual this year once defaults are derived
    pub effective_working_days: u32,
    pub member_rules: Vec<MemberLeaveRule>,
}

async fn policy_response(state: &AppState, team_id: Uuid) -> Result<PolicyResponse, ApiError> {
    let policy = state.policies.find_policy(team_id).await?;
    let rules = load_rules(state).await?;
    let effective = Entitlement::resolve(policy.as_ref(), None, &rules, state.clock.today().year());
    Ok(PolicyResponse {
        team_id,
        configured: policy.is_some(),
        annual_days: policy.as_ref().map_or(DEFAULT_ANNUAL_DAYS, |p| p.annual_days),
        annual_working_days: policy.as_ref().map_or(0, |p| p.annual_working_days),
        effective_working_days: effective.annual_working_days,
        member_rules: state.policies.member_rules(team_id).await?,
    })
}

/// GET /api/manager/teams/:id/leave-policy
pub async fn get_policy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(team_id): Path<Uuid>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let team = load_team(&state, team_id).await?;
    ensure_team_authority(&user, &team)?;
    Ok(Json(policy_response(&state, team_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct PolicyRequest {
    pub annual_days: Decimal,
    #[serde(default)]
    pub annual_working_days: u32,
}

/// PUT /api/manager/teams/:id/leave-policy
pub async fn put_policy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(team_id): Path<Uuid>,
    Json(req): Json<PolicyRequest>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let team = load_team(&state, team_id).await?;
    ensure_team_authority(&user, &team)?;

    let policy = LeavePolicy::new(
        team_id,
        req.annual_days,
        req.annual_working_days,
        state.clock.now(),
    )?;
    state.policies.save_policy(&policy).await?;

    tracing::info!(team_id = %team_id, annual_days = %policy.annual_days, "leave policy updated");
    Ok(Json(policy_response(&state, team_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct MemberRuleRequest {
    pub max_days: Decimal,
    pub period: AccrualPeriod,
}

/// PUT /api/manager/teams/:id/leave-policy/members/:user_id
pub async fn put_member_rule(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((team_id, member_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<MemberRuleRequest>,
) -> Result<Json<MemberLeaveRule>, ApiError> {
    let team = load_team(&state, team_id).await?;
    ensure_team_authority(&user, &team)?;
    if !team.has_member(member_id) {
        return Err(ApiError::bad_request("This user is not a member of the team"));
    }

    let rule = MemberLeaveRule::new(team_id, member_id, req.max_days, req.period, state.clock.now())?;
    state.policies.save_member_rule(&rule).await?;
    Ok(Json(rule))
}
