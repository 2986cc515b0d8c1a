// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod memory;
pub mod postgres_leave_repository;
pub mod postgres_rules_repository;
pub mod postgres_team_repository;
pub mod postgres_timesheet_repository;
pub mod postgres_user_repository;

pub use memory::InMemoryStore;
pub use postgres_leave_repository::PostgresLeaveRepository;
pub use postgres_rules_repository::PostgresRulesRepository;
pub use postgres_team_repository::PostgresTeamRepository;
pub use postgres_timesheet_repository::PostgresTimesheetRepository;
pub use postgres_user_repository::PostgresUserRepository;
