// Dashboards and the manager report (JSON or CSV)

use std::collections::{BTreeMap, HashMap};
use std::string::FromUtf8Error;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::access::{full_names, managed_member_ids};
use super::timesheet::week_entries;
use crate::api::errors::ApiError;
use crate::domain::leave::LeaveStatus;
use crate::domain::repositories::ImputationFilter;
use crate::domain::team::Team;
use crate::domain::timesheet::{
    report_rows, workload, CategoryLoad, IsoWeek, Project, ProjectLoad, ReportRow, TimeCategory,
    WeekStatus,
};
use crate::domain::user::{Role, User};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output is not UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        tracing::error!(error = %err, "report rendering failed");
        ApiError::internal_server_error("Could not render report")
    }
}

/// Renders report rows with a header line
pub fn rows_to_csv(rows: &[ReportRow]) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    if rows.is_empty() {
        writer.write_record(["date", "employee", "project", "hours", "category", "value"])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Projects referenced by `ids`, skipping unknown ones
pub async fn projects_by_id(
    state: &AppState,
    ids: impl Iterator<Item = Uuid> + Send,
) -> Result<HashMap<Uuid, Project>, ApiError> {
    let mut projects = HashMap::new();
    for id in ids {
        if projects.contains_key(&id) {
            continue;
        }
        if let Some(project) = state.projects.find_by_id(id).await? {
            projects.insert(id, project);
        }
    }
    Ok(projects)
}

/// Report rows for the members managed by `manager`
pub async fn manager_report(
    state: &AppState,
    manager: &User,
    filter: ImputationFilter,
) -> Result<Vec<ReportRow>, ApiError> {
    let members = managed_member_ids(state, manager.id).await?;
    if members.is_empty() {
        return Ok(Vec::new());
    }
    let entries = state.imputations.find(&members, &filter).await?;
    let projects = projects_by_id(state, entries.iter().filter_map(|e| e.project_id)).await?;
    let names = full_names(state, &members).await?;
    Ok(report_rows(&entries, &projects, &names))
}

#[derive(Debug, Serialize)]
pub struct WeekToValidate {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee: String,
    pub year: i32,
    pub week: u32,
    pub status: WeekStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub total_hours: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TeamOverview {
    pub id: Uuid,
    pub name: String,
    pub member_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ManagerDashboard {
    pub weeks_to_validate: Vec<WeekToValidate>,
    pub load_by_project: BTreeMap<String, ProjectLoad>,
    pub load_by_category: BTreeMap<TimeCategory, CategoryLoad>,
    pub load_by_employee: BTreeMap<String, Decimal>,
    pub total_hours: Decimal,
    pub overdue_projects: Vec<Project>,
    pub period: String,
    pub teams: Vec<TeamOverview>,
}

/// Consolidated view over the teams `manager` runs, for the current week
pub async fn manager_dashboard(state: &AppState, manager: &User) -> Result<ManagerDashboard, ApiError> {
    if manager.role != Role::Manager {
        return Err(ApiError::forbidden("Access restricted to managers"));
    }
    let teams = state.teams.find_by_manager(manager.id).await?;
    if teams.is_empty() {
        return Err(ApiError::bad_request("You do not manage any team"));
    }
    let members = managed_member_ids(state, manager.id).await?;
    let names = full_names(state, &members).await?;

    let mut weeks_to_validate = Vec::new();
    for week in state.weeks.find_submitted_for(&members).await? {
        let total_hours = week_entries(state, week.employee_id(), week.week())
            .await?
            .iter()
            .map(|e| e.hours)
            .sum();
        weeks_to_validate.push(WeekToValidate {
            id: week.id(),
            employee_id: week.employee_id(),
            employee: names.get(&week.employee_id()).cloned().unwrap_or_default(),
            year: week.week().year,
            week: week.week().week,
            status: week.status(),
            submitted_at: week.submitted_at(),
            total_hours,
        });
    }

    let today = state.clock.today();
    let current = IsoWeek::of(today);
    let entries = if members.is_empty() {
        Vec::new()
    } else {
        state
            .imputations
            .find(&members, &ImputationFilter::between(current.monday(), current.sunday()))
            .await?
    };
    let projects = projects_by_id(state, entries.iter().filter_map(|e| e.project_id)).await?;
    let load = workload(&entries, &projects, &names);

    let team_ids: Vec<Uuid> = teams.iter().map(Team::id).collect();
    let overdue_projects = state
        .projects
        .find_by_teams(&team_ids)
        .await?
        .into_iter()
        .filter(|p| p.is_overdue(today))
        .collect();

    Ok(ManagerDashboard {
        weeks_to_validate,
        load_by_project: load.by_project,
        load_by_category: load.by_category,
        load_by_employee: load.by_employee,
        total_hours: load.total_hours,
        overdue_projects,
        period: format!("{} - {}", current.monday(), current.sunday()),
        teams: teams
            .iter()
            .map(|t| TeamOverview {
                id: t.id(),
                name: t.name().to_string(),
                member_count: t.member_ids().len(),
            })
            .collect(),
    })
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub total_users: usize,
    pub active_users: usize,
    pub users_by_role: BTreeMap<&'static str, usize>,
    pub teams: usize,
    pub pending_leave_requests: i64,
    pub submitted_weeks: i64,
    pub as_of: NaiveDate,
}

pub async fn admin_dashboard(state: &AppState) -> Result<AdminDashboard, ApiError> {
    let users = state.users.list().await?;
    let mut users_by_role: BTreeMap<&'static str, usize> =
        Role::ALL.iter().map(|r| (r.as_str(), 0)).collect();
    for user in &users {
        *users_by_role.entry(user.role.as_str()).or_insert(0) += 1;
    }

    Ok(AdminDashboard {
        total_users: users.len(),
        active_users: users.iter().filter(|u| u.is_active).count(),
        users_by_role,
        teams: state.teams.list().await?.len(),
        pending_leave_requests: state.leaves.count_by_status(LeaveStatus::Pending).await?,
        submitted_weeks: state.weeks.count_by_status(WeekStatus::Submitted).await?,
        as_of: state.clock.today(),
    })
}
