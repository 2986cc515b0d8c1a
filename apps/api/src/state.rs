// Shared handler state: repository ports, clock and auth settings

use std::sync::Arc;

use chrono::Duration;
use sqlx::PgPool;

use crate::clock::{Clock, SystemClock};
use crate::config::AuthSettings;
use crate::domain::repositories::{
    BalanceRepository, ImputationRepository, LeavePolicyRepository, LeaveRepository,
    ProjectRepository, RulesRepository, TeamRepository, TrainingRepository, UserRepository,
    WeekRepository,
};
use crate::infrastructure::repositories::{
    InMemoryStore, PostgresLeaveRepository, PostgresRulesRepository, PostgresTeamRepository,
    PostgresTimesheetRepository, PostgresUserRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub teams: Arc<dyn TeamRepository>,
    pub rules: Arc<dyn RulesRepository>,
    pub leaves: Arc<dyn LeaveRepository>,
    pub balances: Arc<dyn BalanceRepository>,
    pub policies: Arc<dyn LeavePolicyRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub imputations: Arc<dyn ImputationRepository>,
    pub weeks: Arc<dyn WeekRepository>,
    pub trainings: Arc<dyn TrainingRepository>,
    pub clock: Arc<dyn Clock>,
    pub auth: Arc<AuthSettings>,
}

impl AppState {
    /// State backed by PostgreSQL and the system clock
    pub fn postgres(pool: PgPool, auth: AuthSettings) -> Self {
        let leave = Arc::new(PostgresLeaveRepository::new(pool.clone()));
        let timesheet = Arc::new(PostgresTimesheetRepository::new(pool.clone()));
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            teams: Arc::new(PostgresTeamRepository::new(pool.clone())),
            rules: Arc::new(PostgresRulesRepository::new(pool)),
            leaves: leave.clone(),
            balances: leave.clone(),
            policies: leave,
            projects: timesheet.clone(),
            imputations: timesheet.clone(),
            weeks: timesheet.clone(),
            trainings: timesheet,
            clock: Arc::new(SystemClock),
            auth: Arc::new(auth),
        }
    }

    /// State backed by a single in-memory store
    pub fn in_memory(store: Arc<InMemoryStore>, auth: AuthSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: store.clone(),
            teams: store.clone(),
            rules: store.clone(),
            leaves: store.clone(),
            balances: store.clone(),
            policies: store.clone(),
            projects: store.clone(),
            imputations: store.clone(),
            weeks: store.clone(),
            trainings: store,
            clock,
            auth: Arc::new(auth),
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::hours(self.auth.token_ttl_hours)
    }

    pub fn reset_token_ttl(&self) -> Duration {
        Duration::minutes(self.auth.reset_token_ttl_minutes)
    }
}
