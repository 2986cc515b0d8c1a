//! Integration tests for repository layer
//!
//! These tests verify that the PostgreSQL repositories map rows, enforce
//! uniqueness and filter correctly. They need a database:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`

use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use sqlx::PgPool;
use uuid::Uuid;

use sgirp_api::domain::leave::{BalanceEntry, LeavePolicy, LeaveRequest, LeaveStatus, LeaveType};
use sgirp_api::domain::repositories::{
    BalanceRepository, ImputationFilter, ImputationRepository, LeavePolicyRepository,
    LeaveRepository, ProjectRepository, RepositoryError, RulesRepository, TeamRepository,
    UserRepository, WeekRepository,
};
use sgirp_api::domain::rules::GlobalRules;
use sgirp_api::domain::team::Team;
use sgirp_api::domain::timesheet::{
    Imputation, ImputationDraft, IsoWeek, Project, ProjectCategory, ProjectDraft, TimeCategory,
    TimesheetWeek, WeekStatus,
};
use sgirp_api::domain::user::{Email, Role, User};
use sgirp_api::infrastructure::repositories::{
    PostgresLeaveRepository, PostgresRulesRepository, PostgresTeamRepository,
    PostgresTimesheetRepository, PostgresUserRepository,
};

/// Set up test database connection pool with the schema applied
async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Create a user with a unique email
async fn create_test_user(pool: &PgPool, role: Role) -> User {
    let email = Email::new(format!("user-{}@test.local", Uuid::new_v4())).unwrap();
    let user = User::new(email, "Test", "User", role, "hash".to_string(), Utc::now()).unwrap();
    PostgresUserRepository::new(pool.clone())
        .create(&user)
        .await
        .expect("Failed to create user");
    user
}

async fn cleanup_users(pool: &PgPool, ids: &[Uuid]) {
    sqlx::query("DELETE FROM users WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await
        .expect("Failed to cleanup users");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_repository_round_trip() {
    let pool = setup_test_db().await;
    let repo = PostgresUserRepository::new(pool.clone());
    let mut user = create_test_user(&pool, Role::Manager).await;

    let found = repo.find_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.role, Role::Manager);
    assert!(found.first_login);

    // Duplicate email
    let twin = User::new(
        user.email.clone(),
        "Twin",
        "User",
        Role::Employee,
        "hash".into(),
        Utc::now(),
    )
    .unwrap();
    let err = repo.create(&twin).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    user.issue_reset_token("reset-token-xyz".into(), Utc::now() + chrono::Duration::hours(1));
    user.is_active = false;
    repo.update(&user).await.unwrap();
    let by_token = repo.find_by_reset_token("reset-token-xyz").await.unwrap().unwrap();
    assert_eq!(by_token.id, user.id);
    assert!(!by_token.is_active);

    let now = Utc::now();
    repo.update_last_login(user.id, now).await.unwrap();
    let reloaded = repo.find_by_id(user.id).await.unwrap().unwrap();
    assert!(reloaded.last_login.is_some());

    cleanup_users(&pool, &[user.id]).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_team_repository_members_and_lookup() {
    let pool = setup_test_db().await;
    let repo = PostgresTeamRepository::new(pool.clone());
    let manager = create_test_user(&pool, Role::Manager).await;
    let member = create_test_user(&pool, Role::Employee).await;

    let mut team = Team::new(
        format!("Team {}", Uuid::new_v4()),
        "Repository test".to_string(),
        Some(manager.id),
        vec![member.id],
        date(2025, 1, 6),
    )
    .unwrap();
    repo.save(&team).await.unwrap();

    let by_manager = repo.find_by_manager(manager.id).await.unwrap();
    assert_eq!(by_manager.len(), 1);
    assert_eq!(by_manager[0].member_ids(), &[member.id]);

    let by_member = repo.find_by_member(member.id).await.unwrap();
    assert_eq!(by_member[0].id(), team.id());

    team.set_members(Vec::new());
    repo.save(&team).await.unwrap();
    assert!(repo.find_by_member(member.id).await.unwrap().is_empty());

    assert!(repo.delete(team.id()).await.unwrap());
    assert!(!repo.delete(team.id()).await.unwrap());

    cleanup_users(&pool, &[manager.id, member.id]).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_rules_repository_singleton() {
    let pool = setup_test_db().await;
    let repo = PostgresRulesRepository::new(pool.clone());

    let mut rules = GlobalRules::default();
    rules.holiday_country = Some("FR".to_string());
    repo.save(&rules).await.unwrap();
    repo.save(&rules).await.unwrap();

    let stored = repo.get().await.unwrap().unwrap();
    assert_eq!(stored, rules);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_leave_repository_requests_policies_and_history() {
    let pool = setup_test_db().await;
    let repo = PostgresLeaveRepository::new(pool.clone());
    let teams = PostgresTeamRepository::new(pool.clone());
    let manager = create_test_user(&pool, Role::Manager).await;
    let user = create_test_user(&pool, Role::Employee).await;
    let today = date(2025, 3, 3);

    let mut request = LeaveRequest::new(
        user.id,
        LeaveType::Paid,
        date(2025, 3, 10),
        date(2025, 3, 12),
        false,
        "Holidays".to_string(),
        today,
        Utc::now(),
    )
    .unwrap();
    repo.save(&request).await.unwrap();
    assert_eq!(repo.find_pending_for_users(&[user.id]).await.unwrap().len(), 1);

    request
        .decide(LeaveStatus::Approved, manager.id, None, Utc::now())
        .unwrap();
    repo.save(&request).await.unwrap();
    let stored = repo.find_by_id(request.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), LeaveStatus::Approved);
    assert_eq!(stored.decided_by(), Some(manager.id));

    let entry = BalanceEntry::new(
        user.id,
        dec!(-3),
        dec!(1.4),
        Some(request.id()),
        "Paid leave",
        Utc::now(),
    );
    repo.append(&entry).await.unwrap();
    let history = repo.history_for_user(user.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].difference, Some(dec!(-3)));
    assert_eq!(history[0].balance, dec!(1.4));

    let team = Team::new(
        format!("Leave {}", Uuid::new_v4()),
        String::new(),
        Some(manager.id),
        vec![user.id],
        today,
    )
    .unwrap();
    teams.save(&team).await.unwrap();
    let policy = LeavePolicy::new(team.id(), dec!(25), 0, Utc::now()).unwrap();
    repo.save_policy(&policy).await.unwrap();
    repo.save_policy(&policy).await.unwrap();
    let stored = repo.find_policy(team.id()).await.unwrap().unwrap();
    assert_eq!(stored.annual_days, dec!(25));

    teams.delete(team.id()).await.unwrap();
    cleanup_users(&pool, &[manager.id, user.id]).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_timesheet_repository_entries_and_weeks() {
    let pool = setup_test_db().await;
    let repo = PostgresTimesheetRepository::new(pool.clone());
    let employee = create_test_user(&pool, Role::Employee).await;
    let manager = create_test_user(&pool, Role::Manager).await;

    let project = Project::new(ProjectDraft {
        code: None,
        name: "Repository project".to_string(),
        description: String::new(),
        start_date: date(2025, 1, 1),
        end_date: date(2025, 12, 31),
        hourly_rate: dec!(80),
        category: ProjectCategory::Rnd,
        team_id: None,
    })
    .unwrap();
    ProjectRepository::save(&repo, &project).await.unwrap();

    let draft = ImputationDraft {
        project_id: Some(project.id),
        training_id: None,
        date: date(2025, 3, 4),
        hours: dec!(6.5),
        category: TimeCategory::Project,
        description: String::new(),
    };
    let entry = Imputation::new(employee.id, draft.clone(), Utc::now()).unwrap();
    ImputationRepository::save(&repo, &entry).await.unwrap();

    let twin = Imputation::new(employee.id, draft, Utc::now()).unwrap();
    let err = ImputationRepository::save(&repo, &twin).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let week = IsoWeek::of(date(2025, 3, 4));
    let filter = ImputationFilter::between(week.monday(), week.sunday());
    let found = ImputationRepository::find(&repo, &[employee.id], &filter)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].hours, dec!(6.5));

    let mut timesheet = TimesheetWeek::new(employee.id, week);
    timesheet.submit(1, Utc::now()).unwrap();
    WeekRepository::save(&repo, &timesheet).await.unwrap();
    assert_eq!(repo.find_submitted_for(&[employee.id]).await.unwrap().len(), 1);

    timesheet.validate(manager.id, None, Utc::now()).unwrap();
    WeekRepository::save(&repo, &timesheet).await.unwrap();
    let flagged = repo
        .mark_validated(employee.id, week, manager.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(flagged, 1);

    let stored = WeekRepository::find(&repo, employee.id, week).await.unwrap().unwrap();
    assert_eq!(stored.status(), WeekStatus::Validated);

    sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(project.id)
        .execute(&pool)
        .await
        .unwrap();
    cleanup_users(&pool, &[employee.id, manager.id]).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_team_delete_detaches_projects() {
    let pool = setup_test_db().await;
    let teams = PostgresTeamRepository::new(pool.clone());
    let repo = PostgresTimesheetRepository::new(pool.clone());
    let manager = create_test_user(&pool, Role::Manager).await;

    let team = Team::new(
        format!("Detach {}", Uuid::new_v4()),
        String::new(),
        Some(manager.id),
        Vec::new(),
        date(2025, 1, 6),
    )
    .unwrap();
    teams.save(&team).await.unwrap();

    let project = Project::new(ProjectDraft {
        code: None,
        name: "Orphan".to_string(),
        description: String::new(),
        start_date: date(2025, 1, 1),
        end_date: date(2025, 12, 31),
        hourly_rate: dec!(10),
        category: ProjectCategory::Internal,
        team_id: Some(team.id()),
    })
    .unwrap();
    ProjectRepository::save(&repo, &project).await.unwrap();

    assert!(teams.delete(team.id()).await.unwrap());
    let stored = ProjectRepository::find_by_id(&repo, project.id)
        .await
        .unwrap()
        .expect("project kept after team deletion");
    assert_eq!(stored.team_id, None);
    assert!(stored.active);

    sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(project.id)
        .execute(&pool)
        .await
        .unwrap();
    cleanup_users(&pool, &[manager.id]).await;
}
