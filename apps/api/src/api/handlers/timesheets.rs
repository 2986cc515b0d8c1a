use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::AuthUser;
use crate::domain::repositories::ImputationFilter;
use crate::domain::team::TeamStatus;
use crate::domain::timesheet::{
    month_bounds, monthly_summary, Imputation, ImputationDraft, IsoWeek, MonthlySummary, Project,
    TimesheetWeek, Training, TrainingDraft, WeekStatus,
};
use crate::domain::user::Role;
use crate::services::access::{affiliated_team_ids, ensure_manages, load_user};
use crate::services::reporting::{self, projects_by_id, rows_to_csv, ManagerDashboard};
use crate::services::timesheet::{self, SubmitWeekInput, WeekAction};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WeekResponse {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub year: i32,
    pub week: u32,
    pub status: WeekStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub validated_at: Option<DateTime<Utc>>,
    pub validated_by: Option<Uuid>,
    pub comment: String,
}

impl From<&TimesheetWeek> for WeekResponse {
    fn from(week: &TimesheetWeek) -> Self {
        Self {
            id: week.id(),
            employee_id: week.employee_id(),
            year: week.week().year,
            week: week.week().week,
            status: week.status(),
            submitted_at: week.submitted_at(),
            validated_at: week.validated_at(),
            validated_by: week.validated_by(),
            comment: week.comment().to_string(),
        }
    }
}

fn parse_date(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid {} date, expected YYYY-MM-DD", field))),
    }
}

/// `?project=&start=&end=` shared by history and reporting
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub project: Option<Uuid>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub format: Option<String>,
}

impl FilterQuery {
    fn filter(&self) -> Result<ImputationFilter, ApiError> {
        let filter = ImputationFilter {
            project_id: self.project,
            start: parse_date(self.start.as_deref(), "start")?,
            end: parse_date(self.end.as_deref(), "end")?,
        };
        if let (Some(start), Some(end)) = (filter.start, filter.end) {
            if end < start {
                return Err(ApiError::bad_request("End date must be on or after start date"));
            }
        }
        Ok(filter)
    }
}

fn total_hours(entries: &[Imputation]) -> Decimal {
    entries.iter().map(|e| e.hours).sum()
}

/// GET /api/imputations
pub async fn list_imputations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Imputation>>, ApiError> {
    let mut entries = state
        .imputations
        .find(&[user.id], &ImputationFilter::default())
        .await?;
    entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.entered_at.cmp(&a.entered_at)));
    Ok(Json(entries))
}

/// POST /api/imputations
pub async fn create_imputation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(draft): Json<ImputationDraft>,
) -> Result<(StatusCode, Json<Imputation>), ApiError> {
    let entry = timesheet::record_imputation(&state, &user, draft).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /api/imputations/:id
pub async fn update_imputation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(draft): Json<ImputationDraft>,
) -> Result<Json<Imputation>, ApiError> {
    Ok(Json(timesheet::amend_imputation(&state, &user, id, draft).await?))
}

/// DELETE /api/imputations/:id
pub async fn delete_imputation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    timesheet::remove_imputation(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct CurrentWeek {
    pub imputations: Vec<Imputation>,
    pub week_status: WeekStatus,
    pub week_dates: [NaiveDate; 7],
    pub total_hours: Decimal,
    pub year: i32,
    pub week: u32,
}

/// GET /api/imputations/current-week
pub async fn current_week(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CurrentWeek>, ApiError> {
    let week = IsoWeek::of(state.clock.today());
    let imputations = timesheet::week_entries(&state, user.id, week).await?;
    let week_status = timesheet::week_status(&state, user.id, week).await?;
    Ok(Json(CurrentWeek {
        total_hours: total_hours(&imputations),
        imputations,
        week_status,
        week_dates: week.dates(),
        year: week.year,
        week: week.week,
    }))
}

/// POST /api/imputations/submit-week
pub async fn submit_week(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    input: Option<Json<SubmitWeekInput>>,
) -> Result<Json<WeekResponse>, ApiError> {
    let input = input.map(|Json(i)| i).unwrap_or_default();
    let week = timesheet::submit_week(&state, &user, input).await?;
    Ok(Json(WeekResponse::from(&week)))
}

/// GET /api/imputations/history
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<Imputation>>, ApiError> {
    let mut entries = state.imputations.find(&[user.id], &query.filter()?).await?;
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(Json(entries))
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub year: Option<String>,
    pub month: Option<String>,
}

/// GET /api/imputations/monthly-summary?year=&month=
pub async fn monthly(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlySummary>, ApiError> {
    let today = state.clock.today();
    let invalid = || ApiError::bad_request("Year and month must be valid numbers");
    let year = match query.year.as_deref() {
        Some(raw) => raw.trim().parse::<i32>().map_err(|_| invalid())?,
        None => today.year(),
    };
    let month = match query.month.as_deref() {
        Some(raw) => raw.trim().parse::<u32>().map_err(|_| invalid())?,
        None => today.month(),
    };

    let (start, end) = month_bounds(year, month)?;
    let entries = state
        .imputations
        .find(&[user.id], &ImputationFilter::between(start, end))
        .await?;
    let projects = projects_by_id(&state, entries.iter().filter_map(|e| e.project_id)).await?;
    Ok(Json(monthly_summary(&entries, &projects, year, month)?))
}

/// Active projects the caller may book time on
///
/// GET /api/imputations/projects
pub async fn imputable_projects(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Project>>, ApiError> {
    let mut teams = Vec::new();
    for id in affiliated_team_ids(&state, user.id).await? {
        let active = state
            .teams
            .find_by_id(id)
            .await?
            .map_or(false, |t| t.status() == TeamStatus::Active);
        if active {
            teams.push(id);
        }
    }
    let mut projects: Vec<Project> = state
        .projects
        .find_by_teams(&teams)
        .await?
        .into_iter()
        .filter(|p| p.active)
        .collect();
    projects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(projects))
}

/// GET /api/trainings, also served at /api/imputations/trainings
pub async fn list_trainings(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Training>>, ApiError> {
    let mut trainings = state.trainings.find_by_employee(user.id).await?;
    trainings.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    Ok(Json(trainings))
}

/// POST /api/trainings
pub async fn create_training(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(draft): Json<TrainingDraft>,
) -> Result<(StatusCode, Json<Training>), ApiError> {
    let training = Training::new(user.id, draft)?;
    state.trainings.save(&training).await?;
    Ok((StatusCode::CREATED, Json(training)))
}

/// GET /api/manager/dashboard
pub async fn manager_dashboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ManagerDashboard>, ApiError> {
    Ok(Json(reporting::manager_dashboard(&state, &user).await?))
}

#[derive(Debug, Deserialize)]
pub struct WeekDecisionRequest {
    pub action: WeekAction,
    #[serde(default)]
    pub comment: Option<String>,
}

/// POST /api/manager/weeks/:id/decision
pub async fn decide_week(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<WeekDecisionRequest>,
) -> Result<Json<WeekResponse>, ApiError> {
    auth.require_role(&[Role::Manager, Role::Admin])?;
    let week = timesheet::decide_week(&state, &auth.0, id, req.action, req.comment).await?;
    Ok(Json(WeekResponse::from(&week)))
}

#[derive(Debug, Serialize)]
pub struct EmployeeWeek {
    pub employee_id: Uuid,
    pub employee: String,
    pub year: i32,
    pub week: u32,
    pub status: WeekStatus,
    pub week_dates: [NaiveDate; 7],
    pub imputations: Vec<Imputation>,
    pub total_hours: Decimal,
}

/// GET /api/manager/employees/:id/weeks/:year/:week
pub async fn employee_week(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((employee_id, year, week)): Path<(Uuid, i32, u32)>,
) -> Result<Json<EmployeeWeek>, ApiError> {
    auth.require_role(&[Role::Manager, Role::Admin])?;
    ensure_manages(&state, &auth.0, employee_id).await?;
    let employee = load_user(&state, employee_id).await?;
    let week = IsoWeek::new(year, week)?;

    let imputations = timesheet::week_entries(&state, employee_id, week).await?;
    Ok(Json(EmployeeWeek {
        employee_id,
        employee: employee.full_name(),
        year: week.year,
        week: week.week,
        status: timesheet::week_status(&state, employee_id, week).await?,
        week_dates: week.dates(),
        total_hours: total_hours(&imputations),
        imputations,
    }))
}

/// Time entries of the caller's teams, as JSON or CSV
///
/// GET /api/manager/reporting?project=&start=&end=&format=json|csv
pub async fn reporting(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FilterQuery>,
) -> Result<Response, ApiError> {
    auth.require_role(&[Role::Manager, Role::Admin])?;
    let rows = reporting::manager_report(&state, &auth.0, query.filter()?).await?;

    match query.format.as_deref().unwrap_or("json") {
        "json" => Ok(Json(rows).into_response()),
        "csv" => {
            let body = rows_to_csv(&rows)?;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (header::CONTENT_DISPOSITION, "attachment; filename=\"reporting.csv\""),
                ],
                body,
            )
                .into_response())
        }
        other => Err(ApiError::bad_request(format!("Unknown format: {}", other))),
    }
}
