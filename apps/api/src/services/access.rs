use std::collections::HashMap;

use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::domain::rules::GlobalRules;
use crate::domain::team::{members_managed_by, Team};
use crate::domain::user::User;
use crate::state::AppState;

/// Current rules, persisting the defaults on first read
pub async fn load_rules(state: &AppState) -> Result<GlobalRules, ApiError> {
    if let Some(rules) = state.rules.get().await? {
        return Ok(rules);
    }
    let rules = GlobalRules::default();
    state.rules.save(&rules).await?;
    tracing::info!("initialised default global rules");
    Ok(rules)
}

/// Members of every team `manager_id` manages
pub async fn managed_member_ids(state: &AppState, manager_id: Uuid) -> Result<Vec<Uuid>, ApiError> {
    let teams = state.teams.find_by_manager(manager_id).await?;
    Ok(members_managed_by(&teams, manager_id))
}

/// 403 unless `manager` manages a team `user_id` belongs to
pub async fn ensure_manages(state: &AppState, manager: &User, user_id: Uuid) -> Result<(), ApiError> {
    let members = managed_member_ids(state, manager.id).await?;
    if members.contains(&user_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not manage this employee"))
    }
}

/// 403 unless `user` is an admin, or holds the manager role and manages `team`
pub fn ensure_team_authority(user: &User, team: &Team) -> Result<(), ApiError> {
    if user.is_admin() || (user.is_manager() && team.is_managed_by(user.id)) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not manage this team"))
    }
}

/// Ids of the teams `user_id` belongs to or manages
pub async fn affiliated_team_ids(state: &AppState, user_id: Uuid) -> Result<Vec<Uuid>, ApiError> {
    let mut ids: Vec<Uuid> = state
        .teams
        .find_by_member(user_id)
        .await?
        .iter()
        .map(Team::id)
        .collect();
    for team in state.teams.find_by_manager(user_id).await? {
        if !ids.contains(&team.id()) {
            ids.push(team.id());
        }
    }
    Ok(ids)
}

pub async fn load_team(state: &AppState, id: Uuid) -> Result<Team, ApiError> {
    state
        .teams
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Team not found"))
}

pub async fn load_user(state: &AppState, id: Uuid) -> Result<User, ApiError> {
    state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Full names keyed by id for the given users
pub async fn full_names(state: &AppState, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, ApiError> {
    let mut names = HashMap::with_capacity(ids.len());
    for id in ids {
        if let Some(user) = state.users.find_by_id(*id).await? {
            names.insert(*id, user.full_name());
        }
    }
    Ok(names)
}
