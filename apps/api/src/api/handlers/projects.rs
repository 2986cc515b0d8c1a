use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::AuthUser;
use crate::domain::team::Team;
use crate::domain::timesheet::{Project, ProjectDraft};
use crate::domain::user::{Role, User};
use crate::state::AppState;

/// Admins may touch any project; managers only those of a team they run
async fn ensure_project_authority(
    state: &AppState,
    user: &User,
    team_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if user.is_admin() {
        return Ok(());
    }
    if user.role == Role::Manager {
        if let Some(team_id) = team_id {
            let managed = state.teams.find_by_manager(user.id).await?;
            if managed.iter().any(|t| t.id() == team_id) {
                return Ok(());
            }
        }
    }
    Err(ApiError::forbidden("You cannot manage projects of this team"))
}

async fn check_team(state: &AppState, team_id: Option<Uuid>) -> Result<(), ApiError> {
    if let Some(id) = team_id {
        if state.teams.find_by_id(id).await?.is_none() {
            return Err(ApiError::bad_request("Team not found"));
        }
    }
    Ok(())
}

async fn load_project(state: &AppState, id: Uuid) -> Result<Project, ApiError> {
    state
        .projects
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

/// Active projects visible to `user`, by role
pub async fn visible_projects(state: &AppState, user: &User) -> Result<Vec<Project>, ApiError> {
    let mut projects = match user.role {
        Role::Admin => state.projects.list_active().await?,
        Role::Manager => {
            let ids: Vec<Uuid> = state
                .teams
                .find_by_manager(user.id)
                .await?
                .iter()
                .map(Team::id)
                .collect();
            state.projects.find_by_teams(&ids).await?
        }
        Role::Employee => {
            let ids: Vec<Uuid> = state
                .teams
                .find_by_member(user.id)
                .await?
                .iter()
                .map(Team::id)
                .collect();
            state.projects.find_by_teams(&ids).await?
        }
    };
    projects.retain(|p| p.active);
    projects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(projects)
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(visible_projects(&state, &user).await?))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(draft): Json<ProjectDraft>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    ensure_project_authority(&state, &user, draft.team_id).await?;
    check_team(&state, draft.team_id).await?;

    let project = Project::new(draft)?;
    state.projects.save(&project).await?;

    tracing::info!(project_id = %project.id, code = %project.code, created_by = %user.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/projects/:id
pub async fn update_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(draft): Json<ProjectDraft>,
) -> Result<Json<Project>, ApiError> {
    let mut project = load_project(&state, id).await?;
    ensure_project_authority(&state, &user, project.team_id).await?;
    if draft.team_id != project.team_id {
        ensure_project_authority(&state, &user, draft.team_id).await?;
        check_team(&state, draft.team_id).await?;
    }

    project.update(draft)?;
    state.projects.save(&project).await?;
    Ok(Json(project))
}

/// Deactivates the project; its imputations are kept
///
/// DELETE /api/projects/:id
pub async fn delete_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut project = load_project(&state, id).await?;
    ensure_project_authority(&state, &user, project.team_id).await?;

    project.deactivate();
    state.projects.save(&project).await?;

    tracing::info!(project_id = %id, "project deactivated");
    Ok(StatusCode::NO_CONTENT)
}
