use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::RepoResult;
use crate::domain::timesheet::{Imputation, IsoWeek, Project, TimesheetWeek, Training, WeekStatus};

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Insert or update; a duplicate code is a `Conflict`
    async fn save(&self, project: &Project) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Project>>;

    async fn list_active(&self) -> RepoResult<Vec<Project>>;

    /// Active projects attached to any of `team_ids`
    async fn find_by_teams(&self, team_ids: &[Uuid]) -> RepoResult<Vec<Project>>;
}

/// Optional filters for imputation listings
#[derive(Debug, Clone, Default)]
pub struct ImputationFilter {
    pub project_id: Option<Uuid>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ImputationFilter {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            project_id: None,
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn matches(&self, entry: &Imputation) -> bool {
        self.project_id.map_or(true, |p| entry.project_id == Some(p))
            && self.start.map_or(true, |s| entry.date >= s)
            && self.end.map_or(true, |e| entry.date <= e)
    }
}

#[async_trait]
pub trait ImputationRepository: Send + Sync {
    /// Insert or update; a second project entry for the same employee,
    /// project and date is a `Conflict`
    async fn save(&self, entry: &Imputation) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Imputation>>;

    /// Entries of `employee_ids` matching `filter`, most recent date first
    async fn find(&self, employee_ids: &[Uuid], filter: &ImputationFilter) -> RepoResult<Vec<Imputation>>;

    async fn delete(&self, id: Uuid) -> RepoResult<bool>;

    /// Flags every entry of `employee_id` dated inside `week` as validated
    async fn mark_validated(
        &self,
        employee_id: Uuid,
        week: IsoWeek,
        by: Uuid,
        at: DateTime<Utc>,
    ) -> RepoResult<u64>;
}

#[async_trait]
pub trait WeekRepository: Send + Sync {
    /// Insert or update; one row per employee and ISO week
    async fn save(&self, week: &TimesheetWeek) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<TimesheetWeek>>;

    async fn find(&self, employee_id: Uuid, week: IsoWeek) -> RepoResult<Option<TimesheetWeek>>;

    /// Submitted weeks of any of `employee_ids`
    async fn find_submitted_for(&self, employee_ids: &[Uuid]) -> RepoResult<Vec<TimesheetWeek>>;

    async fn count_by_status(&self, status: WeekStatus) -> RepoResult<i64>;
}

#[async_trait]
pub trait TrainingRepository: Send + Sync {
    async fn save(&self, training: &Training) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Training>>;

    /// Trainings of one employee, most recent start first
    async fn find_by_employee(&self, employee_id: Uuid) -> RepoResult<Vec<Training>>;
}
