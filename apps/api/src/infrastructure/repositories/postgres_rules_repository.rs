use async_trait::async_trait;
use chrono::{NaiveTime, Weekday};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use crate::domain::repositories::{RepoResult, RepositoryError, RulesRepository};
use crate::domain::rules::{GlobalRules, Holiday};

/// Singleton row (`id = 1`) in `global_rules`
pub struct PostgresRulesRepository {
    pool: PgPool,
}

impl PostgresRulesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct RulesRow {
    working_days: Vec<String>,
    holidays: Json<Vec<Holiday>>,
    holiday_country: Option<String>,
    work_start: NaiveTime,
    work_end: NaiveTime,
    lunch_start: NaiveTime,
    lunch_end: NaiveTime,
}

impl TryFrom<RulesRow> for GlobalRules {
    type Error = RepositoryError;

    fn try_from(r: RulesRow) -> Result<Self, Self::Error> {
        let working_days = r
            .working_days
            .iter()
            .map(|d| {
                d.parse::<Weekday>()
                    .map_err(|_| RepositoryError::Corrupt(format!("unknown weekday {:?}", d)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GlobalRules {
            working_days,
            holidays: r.holidays.0,
            holiday_country: r.holiday_country,
            work_start: r.work_start,
            work_end: r.work_end,
            lunch_start: r.lunch_start,
            lunch_end: r.lunch_end,
        })
    }
}

#[async_trait]
impl RulesRepository for PostgresRulesRepository {
    async fn get(&self) -> RepoResult<Option<GlobalRules>> {
        let row = sqlx::query_as::<_, RulesRow>(
            r#"
            SELECT working_days, holidays, holiday_country,
                   work_start, work_end, lunch_start, lunch_end
            FROM global_rules
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(GlobalRules::try_from).transpose()
    }

    async fn save(&self, rules: &GlobalRules) -> RepoResult<()> {
        let working_days: Vec<String> = rules.working_days.iter().map(|d| d.to_string()).collect();

        sqlx::query(
            r#"
            INSERT INTO global_rules (
                id, working_days, holidays, holiday_country,
                work_start, work_end, lunch_start, lunch_end
            )
            VALUES (1, $1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                working_days = EXCLUDED.working_days,
                holidays = EXCLUDED.holidays,
                holiday_country = EXCLUDED.holiday_country,
                work_start = EXCLUDED.work_start,
                work_end = EXCLUDED.work_end,
                lunch_start = EXCLUDED.lunch_start,
                lunch_end = EXCLUDED.lunch_end
            "#,
        )
        .bind(&working_days)
        .bind(Json(&rules.holidays))
        .bind(&rules.holiday_country)
        .bind(rules.work_start)
        .bind(rules.work_end)
        .bind(rules.lunch_start)
        .bind(rules.lunch_end)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
