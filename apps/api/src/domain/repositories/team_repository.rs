use async_trait::async_trait;
use uuid::Uuid;

use super::RepoResult;
use crate::domain::team::Team;

/// Repository trait for Team aggregate
///
/// Membership is persisted together with the team.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Save a team (insert or update), replacing its member list
    async fn save(&self, team: &Team) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Team>>;

    /// All teams ordered by name
    async fn list(&self) -> RepoResult<Vec<Team>>;

    /// Teams whose manager is `manager_id`
    async fn find_by_manager(&self, manager_id: Uuid) -> RepoResult<Vec<Team>>;

    /// Teams listing `user_id` as a member
    async fn find_by_member(&self, user_id: Uuid) -> RepoResult<Vec<Team>>;

    /// Returns false when no team had this id
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}
