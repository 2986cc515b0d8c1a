use async_trait::async_trait;

use super::RepoResult;
use crate::domain::rules::GlobalRules;

/// Storage for the singleton rule set
#[async_trait]
pub trait RulesRepository: Send + Sync {
    /// `None` until rules are saved for the first time
    async fn get(&self) -> RepoResult<Option<GlobalRules>>;

    async fn save(&self, rules: &GlobalRules) -> RepoResult<()>;
}
