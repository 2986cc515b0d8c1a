// Imputation bookkeeping and the weekly submission workflow

use serde::Deserialize;
use uuid::Uuid;

use super::access::{affiliated_team_ids, ensure_manages};
use crate::api::errors::ApiError;
use crate::domain::repositories::ImputationFilter;
use crate::domain::team::TeamStatus;
use crate::domain::timesheet::{
    ensure_daily_limit, ensure_week_editable, Imputation, ImputationDraft, IsoWeek, TimesheetWeek,
    WeekStatus,
};
use crate::domain::user::User;
use crate::state::AppState;

/// Stored status of an employee's week; missing rows are drafts
pub async fn week_status(state: &AppState, employee_id: Uuid, week: IsoWeek) -> Result<WeekStatus, ApiError> {
    Ok(state
        .weeks
        .find(employee_id, week)
        .await?
        .map_or(WeekStatus::Draft, |w| w.status()))
}

/// All entries of an employee for one ISO week, oldest first
pub async fn week_entries(state: &AppState, employee_id: Uuid, week: IsoWeek) -> Result<Vec<Imputation>, ApiError> {
    let mut entries = state
        .imputations
        .find(&[employee_id], &ImputationFilter::between(week.monday(), week.sunday()))
        .await?;
    entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.entered_at.cmp(&b.entered_at)));
    Ok(entries)
}

async fn ensure_editable_on(state: &AppState, employee_id: Uuid, entry: &ImputationDraft) -> Result<(), ApiError> {
    let week = IsoWeek::of(entry.date);
    ensure_week_editable(week, week_status(state, employee_id, week).await?)?;
    Ok(())
}

/// Project and training references must point at something the
/// employee may book time on
async fn check_references(state: &AppState, employee: &User, draft: &ImputationDraft) -> Result<(), ApiError> {
    if let Some(project_id) = draft.project_id {
        let project = state
            .projects
            .find_by_id(project_id)
            .await?
            .filter(|p| p.active)
            .ok_or_else(|| ApiError::bad_request("Project not found or inactive"))?;
        let teams = affiliated_team_ids(state, employee.id).await?;
        let Some(team_id) = project.team_id.filter(|t| teams.contains(t)) else {
            return Err(ApiError::bad_request(
                "You can only record time on projects of your teams",
            ));
        };
        let team_active = state
            .teams
            .find_by_id(team_id)
            .await?
            .map_or(false, |t| t.status() == TeamStatus::Active);
        if !team_active {
            return Err(ApiError::bad_request("The project's team is inactive"));
        }
    }
    if let Some(training_id) = draft.training_id {
        let owned = state
            .trainings
            .find_by_id(training_id)
            .await?
            .map_or(false, |t| t.employee_id == employee.id);
        if !owned {
            return Err(ApiError::bad_request("Training not found"));
        }
    }
    Ok(())
}

async fn check_daily_limit(
    state: &AppState,
    employee_id: Uuid,
    draft: &ImputationDraft,
    editing: Option<Uuid>,
) -> Result<(), ApiError> {
    let same_day = state
        .imputations
        .find(&[employee_id], &ImputationFilter::between(draft.date, draft.date))
        .await?;
    ensure_daily_limit(&same_day, draft.hours, editing)?;
    Ok(())
}

pub async fn record_imputation(
    state: &AppState,
    employee: &User,
    draft: ImputationDraft,
) -> Result<Imputation, ApiError> {
    draft.validate()?;
    ensure_editable_on(state, employee.id, &draft).await?;
    check_references(state, employee, &draft).await?;
    check_daily_limit(state, employee.id, &draft, None).await?;

    let entry = Imputation::new(employee.id, draft, state.clock.now())?;
    state.imputations.save(&entry).await?;
    Ok(entry)
}

pub async fn load_own_imputation(state: &AppState, employee: &User, id: Uuid) -> Result<Imputation, ApiError> {
    state
        .imputations
        .find_by_id(id)
        .await?
        .filter(|e| e.employee_id == employee.id)
        .ok_or_else(|| ApiError::not_found("Imputation not found"))
}

pub async fn amend_imputation(
    state: &AppState,
    employee: &User,
    id: Uuid,
    draft: ImputationDraft,
) -> Result<Imputation, ApiError> {
    let mut entry = load_own_imputation(state, employee, id).await?;
    // Both the week the entry leaves and the one it lands in must be open
    let current = IsoWeek::of(entry.date);
    ensure_week_editable(current, week_status(state, employee.id, current).await?)?;
    draft.validate()?;
    ensure_editable_on(state, employee.id, &draft).await?;
    check_references(state, employee, &draft).await?;
    check_daily_limit(state, employee.id, &draft, Some(id)).await?;

    entry.amend(draft)?;
    state.imputations.save(&entry).await?;
    Ok(entry)
}

pub async fn remove_imputation(state: &AppState, employee: &User, id: Uuid) -> Result<(), ApiError> {
    let entry = load_own_imputation(state, employee, id).await?;
    let week = IsoWeek::of(entry.date);
    ensure_week_editable(week, week_status(state, employee.id, week).await?)?;
    state.imputations.delete(id).await?;
    Ok(())
}

/// Body of a week submission; both fields default to the current week
#[derive(Debug, Default, Deserialize)]
pub struct SubmitWeekInput {
    pub year: Option<i32>,
    pub week: Option<u32>,
}

pub async fn submit_week(
    state: &AppState,
    employee: &User,
    input: SubmitWeekInput,
) -> Result<TimesheetWeek, ApiError> {
    let current = IsoWeek::of(state.clock.today());
    let target = IsoWeek::new(
        input.year.unwrap_or(current.year),
        input.week.unwrap_or(current.week),
    )?;

    let entries = week_entries(state, employee.id, target).await?;
    let mut week = state
        .weeks
        .find(employee.id, target)
        .await?
        .unwrap_or_else(|| TimesheetWeek::new(employee.id, target));
    week.submit(entries.len(), state.clock.now())?;
    state.weeks.save(&week).await?;

    tracing::info!(employee_id = %employee.id, week = %target, entries = entries.len(), "week submitted");
    Ok(week)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekAction {
    Validate,
    Reject,
}

/// Manager decision on a submitted week
///
/// Validating flags every entry of the week as validated.
pub async fn decide_week(
    state: &AppState,
    manager: &User,
    week_id: Uuid,
    action: WeekAction,
    comment: Option<String>,
) -> Result<TimesheetWeek, ApiError> {
    let mut week = state
        .weeks
        .find_by_id(week_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Week not found"))?;
    ensure_manages(state, manager, week.employee_id()).await?;

    let now = state.clock.now();
    match action {
        WeekAction::Validate => {
            week.validate(manager.id, comment, now)?;
            state.weeks.save(&week).await?;
            let flagged = state
                .imputations
                .mark_validated(week.employee_id(), week.week(), manager.id, now)
                .await?;
            tracing::info!(week_id = %week.id(), by = %manager.id, entries = flagged, "week validated");
        }
        WeekAction::Reject => {
            week.reject(manager.id, comment, now)?;
            state.weeks.save(&week).await?;
            tracing::info!(week_id = %week.id(), by = %manager.id, "week rejected");
        }
    }
    Ok(week)
}
