use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::leave::{
    AccrualPeriod, BalanceEntry, LeavePolicy, LeaveRequest, LeaveStatus, LeaveType,
    MemberLeaveRule,
};
use crate::domain::repositories::{
    BalanceRepository, LeavePolicyRepository, LeaveRepository, RepoResult,
};

/// PostgreSQL implementation of LeaveRepository, BalanceRepository and
/// LeavePolicyRepository
pub struct PostgresLeaveRepository {
    pool: PgPool,
}

impl PostgresLeaveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const REQUEST_COLUMNS: &str = r#"
    id, user_id, leave_type, start_date, end_date, half_day, status,
    comment, submitted_at, decided_at, decided_by
"#;

#[derive(FromRow)]
struct LeaveRow {
    id: Uuid,
    user_id: Uuid,
    leave_type: LeaveType,
    start_date: NaiveDate,
    end_date: NaiveDate,
    half_day: bool,
    status: LeaveStatus,
    comment: String,
    submitted_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
    decided_by: Option<Uuid>,
}

impl From<LeaveRow> for LeaveRequest {
    fn from(r: LeaveRow) -> Self {
        LeaveRequest::from_persistence(
            r.id,
            r.user_id,
            r.leave_type,
            r.start_date,
            r.end_date,
            r.half_day,
            r.status,
            r.comment,
            r.submitted_at,
            r.decided_at,
            r.decided_by,
        )
    }
}

#[derive(FromRow)]
struct BalanceRow {
    id: Uuid,
    user_id: Uuid,
    changed_at: DateTime<Utc>,
    difference: Option<Decimal>,
    balance: Decimal,
    leave_request_id: Option<Uuid>,
    note: String,
}

impl From<BalanceRow> for BalanceEntry {
    fn from(r: BalanceRow) -> Self {
        BalanceEntry {
            id: r.id,
            user_id: r.user_id,
            changed_at: r.changed_at,
            difference: r.difference,
            balance: r.balance,
            leave_request_id: r.leave_request_id,
            note: r.note,
        }
    }
}

#[derive(FromRow)]
struct PolicyRow {
    team_id: Uuid,
    annual_days: Decimal,
    annual_working_days: i32,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct MemberRuleRow {
    team_id: Uuid,
    member_id: Uuid,
    max_days: Decimal,
    period: AccrualPeriod,
    updated_at: DateTime<Utc>,
}

impl From<MemberRuleRow> for MemberLeaveRule {
    fn from(r: MemberRuleRow) -> Self {
        MemberLeaveRule {
            team_id: r.team_id,
            member_id: r.member_id,
            max_days: r.max_days,
            period: r.period,
            updated_at: r.updated_at,
        }
    }
}

#[async_trait]
impl LeaveRepository for PostgresLeaveRepository {
    async fn save(&self, request: &LeaveRequest) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO leave_requests (
                id, user_id, leave_type, start_date, end_date, half_day, status,
                comment, submitted_at, decided_at, decided_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                leave_type = EXCLUDED.leave_type,
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                half_day = EXCLUDED.half_day,
                status = EXCLUDED.status,
                comment = EXCLUDED.comment,
                decided_at = EXCLUDED.decided_at,
                decided_by = EXCLUDED.decided_by
            "#,
        )
        .bind(request.id())
        .bind(request.user_id())
        .bind(request.leave_type())
        .bind(request.start_date())
        .bind(request.end_date())
        .bind(request.half_day())
        .bind(request.status())
        .bind(request.comment())
        .bind(request.submitted_at())
        .bind(request.decided_at())
        .bind(request.decided_by())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {} FROM leave_requests WHERE id = $1", REQUEST_COLUMNS);
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(LeaveRequest::from))
    }

    async fn find_by_user(&self, user_id: Uuid) -> RepoResult<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {} FROM leave_requests WHERE user_id = $1 ORDER BY start_date DESC",
            REQUEST_COLUMNS
        );
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(LeaveRequest::from).collect())
    }

    async fn find_pending_for_users(&self, user_ids: &[Uuid]) -> RepoResult<Vec<LeaveRequest>> {
        let sql = format!(
            r#"
            SELECT {} FROM leave_requests
            WHERE status = 'pending' AND user_id = ANY($1)
            ORDER BY submitted_at
            "#,
            REQUEST_COLUMNS
        );
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(LeaveRequest::from).collect())
    }

    async fn count_by_status(&self, status: LeaveStatus) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leave_requests WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM leave_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BalanceRepository for PostgresLeaveRepository {
    async fn append(&self, entry: &BalanceEntry) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO balance_history (
                id, user_id, changed_at, difference, balance, leave_request_id, note
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.changed_at)
        .bind(entry.difference)
        .bind(entry.balance)
        .bind(entry.leave_request_id)
        .bind(&entry.note)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn history_for_user(&self, user_id: Uuid) -> RepoResult<Vec<BalanceEntry>> {
        let rows = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT id, user_id, changed_at, difference, balance, leave_request_id, note
            FROM balance_history
            WHERE user_id = $1
            ORDER BY changed_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BalanceEntry::from).collect())
    }

    async fn list_all(&self) -> RepoResult<Vec<BalanceEntry>> {
        let rows = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT id, user_id, changed_at, difference, balance, leave_request_id, note
            FROM balance_history
            ORDER BY changed_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BalanceEntry::from).collect())
    }
}

#[async_trait]
impl LeavePolicyRepository for PostgresLeaveRepository {
    async fn find_policy(&self, team_id: Uuid) -> RepoResult<Option<LeavePolicy>> {
        let row = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT team_id, annual_days, annual_working_days, updated_at
            FROM leave_policies
            WHERE team_id = $1
            "#,
        )
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| LeavePolicy {
            team_id: r.team_id,
            annual_days: r.annual_days,
            annual_working_days: r.annual_working_days.max(0) as u32,
            updated_at: r.updated_at,
        }))
    }

    async fn save_policy(&self, policy: &LeavePolicy) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO leave_policies (team_id, annual_days, annual_working_days, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (team_id) DO UPDATE SET
                annual_days = EXCLUDED.annual_days,
                annual_working_days = EXCLUDED.annual_working_days,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(policy.team_id)
        .bind(policy.annual_days)
        .bind(policy.annual_working_days as i32)
        .bind(policy.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_member_rule(
        &self,
        team_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<Option<MemberLeaveRule>> {
        let row = sqlx::query_as::<_, MemberRuleRow>(
            r#"
            SELECT team_id, member_id, max_days, period, updated_at
            FROM member_leave_rules
            WHERE team_id = $1 AND member_id = $2
            "#,
        )
        .bind(team_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MemberLeaveRule::from))
    }

    async fn save_member_rule(&self, rule: &MemberLeaveRule) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO member_leave_rules (team_id, member_id, max_days, period, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (team_id, member_id) DO UPDATE SET
                max_days = EXCLUDED.max_days,
                period = EXCLUDED.period,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(rule.team_id)
        .bind(rule.member_id)
        .bind(rule.max_days)
        .bind(rule.period)
        .bind(rule.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn member_rules(&self, team_id: Uuid) -> RepoResult<Vec<MemberLeaveRule>> {
        let rows = sqlx::query_as::<_, MemberRuleRow>(
            r#"
            SELECT team_id, member_id, max_days, period, updated_at
            FROM member_leave_rules
            WHERE team_id = $1
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MemberLeaveRule::from).collect())
    }
}
