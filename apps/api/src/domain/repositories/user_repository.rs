use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::RepoResult;
use crate::domain::user::{Email, User};

/// Repository trait for User aggregate
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; a duplicate e-mail is a `Conflict`
    async fn create(&self, user: &User) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> RepoResult<Option<User>>;

    async fn find_by_reset_token(&self, token: &str) -> RepoResult<Option<User>>;

    /// All users ordered by last name
    async fn list(&self) -> RepoResult<Vec<User>>;

    /// Overwrite every mutable field of an existing user
    async fn update(&self, user: &User) -> RepoResult<()>;

    async fn update_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> RepoResult<()>;
}
