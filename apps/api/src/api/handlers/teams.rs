use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::AuthUser;
use crate::domain::team::{Team, TeamStatus};
use crate::domain::user::Role;
use crate::services::access::load_team;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MemberView {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

/// Team with manager and members expanded
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub manager_id: Option<Uuid>,
    pub manager: Option<MemberView>,
    pub member_ids: Vec<Uuid>,
    pub members: Vec<MemberView>,
    pub created_on: NaiveDate,
    pub status: TeamStatus,
}

async fn member_view(state: &AppState, id: Uuid) -> Result<Option<MemberView>, ApiError> {
    Ok(state.users.find_by_id(id).await?.map(|u| MemberView {
        id: u.id,
        full_name: u.full_name(),
        email: u.email.to_string(),
        role: u.role,
    }))
}

pub async fn team_response(state: &AppState, team: &Team) -> Result<TeamResponse, ApiError> {
    let manager = match team.manager_id() {
        Some(id) => member_view(state, id).await?,
        None => None,
    };
    let mut members = Vec::with_capacity(team.member_ids().len());
    for id in team.member_ids() {
        if let Some(view) = member_view(state, *id).await? {
            members.push(view);
        }
    }
    Ok(TeamResponse {
        id: team.id(),
        name: team.name().to_string(),
        description: team.description().to_string(),
        manager_id: team.manager_id(),
        manager,
        member_ids: team.member_ids().to_vec(),
        members,
        created_on: team.created_on(),
        status: team.status(),
    })
}

async fn team_responses(state: &AppState, teams: &[Team]) -> Result<Vec<TeamResponse>, ApiError> {
    let mut out = Vec::with_capacity(teams.len());
    for team in teams {
        out.push(team_response(state, team).await?);
    }
    Ok(out)
}

/// Manager must exist and hold the manager role; every member must exist
async fn check_people(
    state: &AppState,
    manager_id: Option<Uuid>,
    member_ids: &[Uuid],
) -> Result<(), ApiError> {
    if let Some(id) = manager_id {
        let is_manager = state
            .users
            .find_by_id(id)
            .await?
            .map_or(false, |u| u.role == Role::Manager);
        if !is_manager {
            return Err(ApiError::bad_request(
                "The manager must be an existing user with the manager role",
            ));
        }
    }
    for id in member_ids {
        if state.users.find_by_id(*id).await?.is_none() {
            return Err(ApiError::bad_request(format!("Unknown member: {}", id)));
        }
    }
    Ok(())
}

/// Request body for creating a team
#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub manager_id: Option<Uuid>,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

/// Create a new team
///
/// POST /api/teams
pub async fn create_team(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    auth.require_admin()?;
    check_people(&state, req.manager_id, &req.member_ids).await?;

    let team = Team::new(
        req.name,
        req.description,
        req.manager_id,
        req.member_ids,
        state.clock.today(),
    )?;
    state.teams.save(&team).await?;

    tracing::info!(team_id = %team.id(), name = team.name(), "team created");
    Ok((StatusCode::CREATED, Json(team_response(&state, &team).await?)))
}

/// GET /api/teams
pub async fn list_teams(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    auth.require_admin()?;
    let teams = state.teams.list().await?;
    Ok(Json(team_responses(&state, &teams).await?))
}

/// Get a team by ID
///
/// GET /api/teams/:id
pub async fn get_team(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamResponse>, ApiError> {
    auth.require_admin()?;
    let team = load_team(&state, id).await?;
    Ok(Json(team_response(&state, &team).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub manager_id: Option<Uuid>,
    pub member_ids: Option<Vec<Uuid>>,
    pub status: Option<TeamStatus>,
}

/// PATCH /api/teams/:id
pub async fn update_team(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTeamRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    auth.require_admin()?;
    let mut team = load_team(&state, id).await?;
    check_people(&state, req.manager_id, req.member_ids.as_deref().unwrap_or_default()).await?;

    if let Some(name) = req.name {
        team.rename(name)?;
    }
    if let Some(description) = req.description {
        team.set_description(description);
    }
    if req.manager_id.is_some() {
        team.assign_manager(req.manager_id);
    }
    if let Some(member_ids) = req.member_ids {
        team.set_members(member_ids);
    }
    if let Some(status) = req.status {
        team.set_status(status);
    }
    state.teams.save(&team).await?;

    Ok(Json(team_response(&state, &team).await?))
}

/// Delete a team
///
/// DELETE /api/teams/:id
pub async fn delete_team(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;
    if !state.teams.delete(id).await? {
        return Err(ApiError::not_found("Team not found"));
    }
    tracing::info!(team_id = %id, "team deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Teams the caller manages
///
/// GET /api/manager/teams
pub async fn my_managed_teams(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    auth.require_role(&[Role::Manager, Role::Admin])?;
    let teams = state.teams.find_by_manager(auth.0.id).await?;
    Ok(Json(team_responses(&state, &teams).await?))
}

#[derive(Debug, Serialize)]
pub struct TeamOption {
    pub id: Uuid,
    pub name: String,
}

/// Teams a project can be attached to by the caller
///
/// GET /api/manager/teams/available
pub async fn available_teams(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<TeamOption>>, ApiError> {
    auth.require_role(&[Role::Manager, Role::Admin])?;
    let teams = if auth.0.is_admin() {
        state.teams.list().await?
    } else {
        state.teams.find_by_manager(auth.0.id).await?
    };
    Ok(Json(
        teams
            .iter()
            .filter(|t| t.status() == TeamStatus::Active)
            .map(|t| TeamOption {
                id: t.id(),
                name: t.name().to_string(),
            })
            .collect(),
    ))
}
