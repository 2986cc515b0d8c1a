// Repository ports
// One trait per aggregate; adapters live in infrastructure::repositories

use thiserror::Error;

pub mod leave_repository;
pub mod rules_repository;
pub mod team_repository;
pub mod timesheet_repository;
pub mod user_repository;

pub use leave_repository::{BalanceRepository, LeavePolicyRepository, LeaveRepository};
pub use rules_repository::RulesRepository;
pub use team_repository::TeamRepository;
pub use timesheet_repository::{
    ImputationFilter, ImputationRepository, ProjectRepository, TrainingRepository, WeekRepository,
};
pub use user_repository::UserRepository;

/// Failures reported by repository adapters
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),

    /// Unique constraint violation
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be mapped back to the domain
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl RepositoryError {
    /// Maps Postgres unique violations (SQLSTATE 23505) to `Conflict`
    pub fn from_sqlx(err: sqlx::Error, conflict_message: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                RepositoryError::Conflict(conflict_message.to_string())
            }
            _ => RepositoryError::Database(err),
        }
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;
