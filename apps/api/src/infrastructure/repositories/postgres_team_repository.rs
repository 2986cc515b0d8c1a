use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::repositories::{RepoResult, TeamRepository};
use crate::domain::team::{Team, TeamStatus};

/// PostgreSQL implementation of TeamRepository
///
/// Members live in `team_members` and are rewritten on every save.
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct TeamRow {
    id: Uuid,
    name: String,
    description: String,
    manager_id: Option<Uuid>,
    created_on: NaiveDate,
    status: TeamStatus,
}

#[derive(FromRow)]
struct MemberRow {
    team_id: Uuid,
    user_id: Uuid,
}

impl PostgresTeamRepository {
    /// Loads teams matching `filter` (a WHERE clause on alias `t`, may be
    /// empty) together with their members
    async fn load(&self, filter: &str, param: Option<Uuid>) -> RepoResult<Vec<Team>> {
        let sql = format!(
            r#"
            SELECT t.id, t.name, t.description, t.manager_id, t.created_on, t.status
            FROM teams t
            {}
            ORDER BY t.name
            "#,
            filter
        );
        let mut query = sqlx::query_as::<_, TeamRow>(&sql);
        if let Some(param) = param {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let members = sqlx::query_as::<_, MemberRow>(
            "SELECT team_id, user_id FROM team_members WHERE team_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_team: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for m in members {
            by_team.entry(m.team_id).or_default().push(m.user_id);
        }

        Ok(rows
            .into_iter()
            .map(|r| {
                let member_ids = by_team.remove(&r.id).unwrap_or_default();
                Team::from_persistence(
                    r.id,
                    r.name,
                    r.description,
                    r.manager_id,
                    member_ids,
                    r.created_on,
                    r.status,
                )
            })
            .collect())
    }
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn save(&self, team: &Team) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO teams (id, name, description, manager_id, created_on, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                manager_id = EXCLUDED.manager_id,
                status = EXCLUDED.status
            "#,
        )
        .bind(team.id())
        .bind(team.name())
        .bind(team.description())
        .bind(team.manager_id())
        .bind(team.created_on())
        .bind(team.status())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM team_members WHERE team_id = $1")
            .bind(team.id())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO team_members (team_id, user_id)
            SELECT $1, UNNEST($2::uuid[])
            "#,
        )
        .bind(team.id())
        .bind(team.member_ids())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Team>> {
        Ok(self
            .load("WHERE t.id = $1", Some(id))
            .await?
            .into_iter()
            .next())
    }

    async fn list(&self) -> RepoResult<Vec<Team>> {
        self.load("", None).await
    }

    async fn find_by_manager(&self, manager_id: Uuid) -> RepoResult<Vec<Team>> {
        self.load("WHERE t.manager_id = $1", Some(manager_id)).await
    }

    async fn find_by_member(&self, user_id: Uuid) -> RepoResult<Vec<Team>> {
        self.load(
            "WHERE EXISTS (SELECT 1 FROM team_members m WHERE m.team_id = t.id AND m.user_id = $1)",
            Some(user_id),
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
