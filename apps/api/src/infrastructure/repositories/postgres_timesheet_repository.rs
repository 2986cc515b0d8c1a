use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::repositories::{
    ImputationFilter, ImputationRepository, ProjectRepository, RepoResult, RepositoryError,
    TrainingRepository, WeekRepository,
};
use crate::domain::timesheet::{
    Imputation, IsoWeek, Project, ProjectCategory, TimeCategory, TimesheetWeek, Training,
    TrainingKind, WeekStatus,
};

/// PostgreSQL adapter for projects, imputations, timesheet weeks and
/// trainings
pub struct PostgresTimesheetRepository {
    pool: PgPool,
}

impl PostgresTimesheetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ===== Projects =====

const PROJECT_COLUMNS: &str = r#"
    id, code, name, description, start_date, end_date, hourly_rate,
    category, team_id, active
"#;

#[derive(FromRow)]
struct ProjectRow {
    id: Uuid,
    code: String,
    name: String,
    description: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    hourly_rate: Decimal,
    category: ProjectCategory,
    team_id: Option<Uuid>,
    active: bool,
}

impl From<ProjectRow> for Project {
    fn from(r: ProjectRow) -> Self {
        Project {
            id: r.id,
            code: r.code,
            name: r.name,
            description: r.description,
            start_date: r.start_date,
            end_date: r.end_date,
            hourly_rate: r.hourly_rate,
            category: r.category,
            team_id: r.team_id,
            active: r.active,
        }
    }
}

#[async_trait]
impl ProjectRepository for PostgresTimesheetRepository {
    async fn save(&self, project: &Project) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (
                id, code, name, description, start_date, end_date, hourly_rate,
                category, team_id, active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                code = EXCLUDED.code,
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                hourly_rate = EXCLUDED.hourly_rate,
                category = EXCLUDED.category,
                team_id = EXCLUDED.team_id,
                active = EXCLUDED.active
            "#,
        )
        .bind(project.id)
        .bind(&project.code)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.hourly_rate)
        .bind(project.category)
        .bind(project.team_id)
        .bind(project.active)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "A project with this code already exists"))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Project::from))
    }

    async fn list_active(&self) -> RepoResult<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM projects WHERE active ORDER BY name",
            PROJECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn find_by_teams(&self, team_ids: &[Uuid]) -> RepoResult<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM projects WHERE active AND team_id = ANY($1) ORDER BY name",
            PROJECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(team_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Project::from).collect())
    }
}

// ===== Imputations =====

const IMPUTATION_COLUMNS: &str = r#"
    id, employee_id, project_id, training_id, date, hours, category,
    description, validated, entered_at, validated_at, validated_by
"#;

#[derive(FromRow)]
struct ImputationRow {
    id: Uuid,
    employee_id: Uuid,
    project_id: Option<Uuid>,
    training_id: Option<Uuid>,
    date: NaiveDate,
    hours: Decimal,
    category: TimeCategory,
    description: String,
    validated: bool,
    entered_at: DateTime<Utc>,
    validated_at: Option<DateTime<Utc>>,
    validated_by: Option<Uuid>,
}

impl From<ImputationRow> for Imputation {
    fn from(r: ImputationRow) -> Self {
        Imputation {
            id: r.id,
            employee_id: r.employee_id,
            project_id: r.project_id,
            training_id: r.training_id,
            date: r.date,
            hours: r.hours,
            category: r.category,
            description: r.description,
            validated: r.validated,
            entered_at: r.entered_at,
            validated_at: r.validated_at,
            validated_by: r.validated_by,
        }
    }
}

#[async_trait]
impl ImputationRepository for PostgresTimesheetRepository {
    async fn save(&self, entry: &Imputation) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO imputations (
                id, employee_id, project_id, training_id, date, hours, category,
                description, validated, entered_at, validated_at, validated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                project_id = EXCLUDED.project_id,
                training_id = EXCLUDED.training_id,
                date = EXCLUDED.date,
                hours = EXCLUDED.hours,
                category = EXCLUDED.category,
                description = EXCLUDED.description,
                validated = EXCLUDED.validated,
                validated_at = EXCLUDED.validated_at,
                validated_by = EXCLUDED.validated_by
            "#,
        )
        .bind(entry.id)
        .bind(entry.employee_id)
        .bind(entry.project_id)
        .bind(entry.training_id)
        .bind(entry.date)
        .bind(entry.hours)
        .bind(entry.category)
        .bind(&entry.description)
        .bind(entry.validated)
        .bind(entry.entered_at)
        .bind(entry.validated_at)
        .bind(entry.validated_by)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_sqlx(e, "An entry already exists for this project on this date")
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Imputation>> {
        let sql = format!("SELECT {} FROM imputations WHERE id = $1", IMPUTATION_COLUMNS);
        let row = sqlx::query_as::<_, ImputationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Imputation::from))
    }

    async fn find(
        &self,
        employee_ids: &[Uuid],
        filter: &ImputationFilter,
    ) -> RepoResult<Vec<Imputation>> {
        let sql = format!(
            r#"
            SELECT {} FROM imputations
            WHERE employee_id = ANY($1)
              AND ($2::uuid IS NULL OR project_id = $2)
              AND ($3::date IS NULL OR date >= $3)
              AND ($4::date IS NULL OR date <= $4)
            ORDER BY date DESC, entered_at DESC
            "#,
            IMPUTATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, ImputationRow>(&sql)
            .bind(employee_ids)
            .bind(filter.project_id)
            .bind(filter.start)
            .bind(filter.end)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Imputation::from).collect())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM imputations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_validated(
        &self,
        employee_id: Uuid,
        week: IsoWeek,
        by: Uuid,
        at: DateTime<Utc>,
    ) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE imputations
            SET validated = TRUE, validated_at = $4, validated_by = $5
            WHERE employee_id = $1 AND date BETWEEN $2 AND $3
            "#,
        )
        .bind(employee_id)
        .bind(week.monday())
        .bind(week.sunday())
        .bind(at)
        .bind(by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// ===== Timesheet weeks =====

const WEEK_COLUMNS: &str = r#"
    id, employee_id, year, week, status, submitted_at, validated_at,
    validated_by, comment
"#;

#[derive(FromRow)]
struct WeekRow {
    id: Uuid,
    employee_id: Uuid,
    year: i32,
    week: i32,
    status: WeekStatus,
    submitted_at: Option<DateTime<Utc>>,
    validated_at: Option<DateTime<Utc>>,
    validated_by: Option<Uuid>,
    comment: String,
}

impl TryFrom<WeekRow> for TimesheetWeek {
    type Error = RepositoryError;

    fn try_from(r: WeekRow) -> Result<Self, Self::Error> {
        let week = u32::try_from(r.week)
            .ok()
            .and_then(|w| IsoWeek::new(r.year, w).ok())
            .ok_or_else(|| RepositoryError::Corrupt(format!("invalid week {}/{}", r.week, r.year)))?;
        Ok(TimesheetWeek::from_persistence(
            r.id,
            r.employee_id,
            week,
            r.status,
            r.submitted_at,
            r.validated_at,
            r.validated_by,
            r.comment,
        ))
    }
}

#[async_trait]
impl WeekRepository for PostgresTimesheetRepository {
    async fn save(&self, week: &TimesheetWeek) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO timesheet_weeks (
                id, employee_id, year, week, status, submitted_at, validated_at,
                validated_by, comment
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                submitted_at = EXCLUDED.submitted_at,
                validated_at = EXCLUDED.validated_at,
                validated_by = EXCLUDED.validated_by,
                comment = EXCLUDED.comment
            "#,
        )
        .bind(week.id())
        .bind(week.employee_id())
        .bind(week.week().year)
        .bind(week.week().week as i32)
        .bind(week.status())
        .bind(week.submitted_at())
        .bind(week.validated_at())
        .bind(week.validated_by())
        .bind(week.comment())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "This week already exists"))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<TimesheetWeek>> {
        let sql = format!("SELECT {} FROM timesheet_weeks WHERE id = $1", WEEK_COLUMNS);
        let row = sqlx::query_as::<_, WeekRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TimesheetWeek::try_from).transpose()
    }

    async fn find(&self, employee_id: Uuid, week: IsoWeek) -> RepoResult<Option<TimesheetWeek>> {
        let sql = format!(
            "SELECT {} FROM timesheet_weeks WHERE employee_id = $1 AND year = $2 AND week = $3",
            WEEK_COLUMNS
        );
        let row = sqlx::query_as::<_, WeekRow>(&sql)
            .bind(employee_id)
            .bind(week.year)
            .bind(week.week as i32)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TimesheetWeek::try_from).transpose()
    }

    async fn find_submitted_for(&self, employee_ids: &[Uuid]) -> RepoResult<Vec<TimesheetWeek>> {
        let sql = format!(
            r#"
            SELECT {} FROM timesheet_weeks
            WHERE status = 'submitted' AND employee_id = ANY($1)
            ORDER BY year DESC, week DESC
            "#,
            WEEK_COLUMNS
        );
        sqlx::query_as::<_, WeekRow>(&sql)
            .bind(employee_ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(TimesheetWeek::try_from)
            .collect()
    }

    async fn count_by_status(&self, status: WeekStatus) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM timesheet_weeks WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// ===== Trainings =====

#[derive(FromRow)]
struct TrainingRow {
    id: Uuid,
    employee_id: Uuid,
    kind: TrainingKind,
    title: String,
    description: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    hours: Decimal,
}

impl From<TrainingRow> for Training {
    fn from(r: TrainingRow) -> Self {
        Training {
            id: r.id,
            employee_id: r.employee_id,
            kind: r.kind,
            title: r.title,
            description: r.description,
            start_date: r.start_date,
            end_date: r.end_date,
            hours: r.hours,
        }
    }
}

#[async_trait]
impl TrainingRepository for PostgresTimesheetRepository {
    async fn save(&self, training: &Training) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO trainings (
                id, employee_id, kind, title, description, start_date, end_date, hours
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                kind = EXCLUDED.kind,
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                hours = EXCLUDED.hours
            "#,
        )
        .bind(training.id)
        .bind(training.employee_id)
        .bind(training.kind)
        .bind(&training.title)
        .bind(&training.description)
        .bind(training.start_date)
        .bind(training.end_date)
        .bind(training.hours)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Training>> {
        let row = sqlx::query_as::<_, TrainingRow>(
            r#"
            SELECT id, employee_id, kind, title, description, start_date, end_date, hours
            FROM trainings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Training::from))
    }

    async fn find_by_employee(&self, employee_id: Uuid) -> RepoResult<Vec<Training>> {
        let rows = sqlx::query_as::<_, TrainingRow>(
            r#"
            SELECT id, employee_id, kind, title, description, start_date, end_date, hours
            FROM trainings
            WHERE employee_id = $1
            ORDER BY start_date DESC
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Training::from).collect())
    }
}
