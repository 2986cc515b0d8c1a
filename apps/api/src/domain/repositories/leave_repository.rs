use async_trait::async_trait;
use uuid::Uuid;

use super::RepoResult;
use crate::domain::leave::{BalanceEntry, LeavePolicy, LeaveRequest, LeaveStatus, MemberLeaveRule};

#[async_trait]
pub trait LeaveRepository: Send + Sync {
    /// Insert or update
    async fn save(&self, request: &LeaveRequest) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<LeaveRequest>>;

    /// Requests of one user, most recent start date first
    async fn find_by_user(&self, user_id: Uuid) -> RepoResult<Vec<LeaveRequest>>;

    /// Pending requests of any of `user_ids`, oldest submission first
    async fn find_pending_for_users(&self, user_ids: &[Uuid]) -> RepoResult<Vec<LeaveRequest>>;

    async fn count_by_status(&self, status: LeaveStatus) -> RepoResult<i64>;

    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}

/// Append-only balance history
#[async_trait]
pub trait BalanceRepository: Send + Sync {
    async fn append(&self, entry: &BalanceEntry) -> RepoResult<()>;

    /// Entries of one user, oldest first
    async fn history_for_user(&self, user_id: Uuid) -> RepoResult<Vec<BalanceEntry>>;

    /// Every entry, most recent first
    async fn list_all(&self) -> RepoResult<Vec<BalanceEntry>>;
}

#[async_trait]
pub trait LeavePolicyRepository: Send + Sync {
    async fn find_policy(&self, team_id: Uuid) -> RepoResult<Option<LeavePolicy>>;

    /// Insert or replace the team's policy
    async fn save_policy(&self, policy: &LeavePolicy) -> RepoResult<()>;

    async fn find_member_rule(
        &self,
        team_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<Option<MemberLeaveRule>>;

    /// Insert or replace a member override
    async fn save_member_rule(&self, rule: &MemberLeaveRule) -> RepoResult<()>;

    async fn member_rules(&self, team_id: Uuid) -> RepoResult<Vec<MemberLeaveRule>>;
}
