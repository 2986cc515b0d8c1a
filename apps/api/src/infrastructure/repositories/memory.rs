// In-memory adapter implementing every repository port
// Backs the HTTP tests and `STORAGE=memory` demo runs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::leave::{BalanceEntry, LeavePolicy, LeaveRequest, LeaveStatus, MemberLeaveRule};
use crate::domain::repositories::{
    BalanceRepository, ImputationFilter, ImputationRepository, LeavePolicyRepository,
    LeaveRepository, ProjectRepository, RepoResult, RepositoryError, RulesRepository,
    TeamRepository, TrainingRepository, UserRepository, WeekRepository,
};
use crate::domain::rules::GlobalRules;
use crate::domain::team::Team;
use crate::domain::timesheet::{Imputation, IsoWeek, Project, TimesheetWeek, Training, WeekStatus};
use crate::domain::user::{Email, User};

#[derive(Default)]
pub struct InMemoryStore {
    pub users: Mutex<HashMap<Uuid, User>>,
    pub teams: Mutex<HashMap<Uuid, Team>>,
    pub rules: Mutex<Option<GlobalRules>>,
    pub leaves: Mutex<HashMap<Uuid, LeaveRequest>>,
    pub balance_history: Mutex<Vec<BalanceEntry>>,
    pub policies: Mutex<HashMap<Uuid, LeavePolicy>>,
    pub member_rules: Mutex<HashMap<(Uuid, Uuid), MemberLeaveRule>>,
    pub projects: Mutex<HashMap<Uuid, Project>>,
    pub imputations: Mutex<HashMap<Uuid, Imputation>>,
    pub weeks: Mutex<HashMap<Uuid, TimesheetWeek>>,
    pub trainings: Mutex<HashMap<Uuid, Training>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: &User) -> RepoResult<()> {
        let mut users = self.users.lock().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> RepoResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> RepoResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn list(&self) -> RepoResult<Vec<User>> {
        let mut users: Vec<User> = self.users.lock().await.values().cloned().collect();
        users.sort_by(|a, b| {
            (a.last_name.as_str(), a.first_name.as_str())
                .cmp(&(b.last_name.as_str(), b.first_name.as_str()))
        });
        Ok(users)
    }

    async fn update(&self, user: &User) -> RepoResult<()> {
        let mut users = self.users.lock().await;
        if !users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound(format!("User {}", user.id)));
        }
        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(RepositoryError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> RepoResult<()> {
        if let Some(user) = self.users.lock().await.get_mut(&user_id) {
            user.last_login = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl TeamRepository for InMemoryStore {
    async fn save(&self, team: &Team) -> RepoResult<()> {
        self.teams.lock().await.insert(team.id(), team.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Team>> {
        Ok(self.teams.lock().await.get(&id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Team>> {
        Ok(sorted_teams(self.teams.lock().await.values().cloned().collect()))
    }

    async fn find_by_manager(&self, manager_id: Uuid) -> RepoResult<Vec<Team>> {
        let teams = self.teams.lock().await;
        Ok(sorted_teams(
            teams
                .values()
                .filter(|t| t.is_managed_by(manager_id))
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_member(&self, user_id: Uuid) -> RepoResult<Vec<Team>> {
        let teams = self.teams.lock().await;
        Ok(sorted_teams(
            teams
                .values()
                .filter(|t| t.has_member(user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let removed = self.teams.lock().await.remove(&id).is_some();
        if removed {
            self.policies.lock().await.remove(&id);
            self.member_rules.lock().await.retain(|(team, _), _| *team != id);
            // Projects outlive their team; time entries stay attached to them
            for project in self.projects.lock().await.values_mut() {
                if project.team_id == Some(id) {
                    project.team_id = None;
                }
            }
        }
        Ok(removed)
    }
}

fn sorted_teams(mut teams: Vec<Team>) -> Vec<Team> {
    teams.sort_by(|a, b| a.name().cmp(b.name()));
    teams
}

#[async_trait]
impl RulesRepository for InMemoryStore {
    async fn get(&self) -> RepoResult<Option<GlobalRules>> {
        Ok(self.rules.lock().await.clone())
    }

    async fn save(&self, rules: &GlobalRules) -> RepoResult<()> {
        *self.rules.lock().await = Some(rules.clone());
        Ok(())
    }
}

#[async_trait]
impl LeaveRepository for InMemoryStore {
    async fn save(&self, request: &LeaveRequest) -> RepoResult<()> {
        self.leaves.lock().await.insert(request.id(), request.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<LeaveRequest>> {
        Ok(self.leaves.lock().await.get(&id).cloned())
    }

    async fn find_by_user(&self, user_id: Uuid) -> RepoResult<Vec<LeaveRequest>> {
        let mut found: Vec<LeaveRequest> = self
            .leaves
            .lock()
            .await
            .values()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.start_date().cmp(&a.start_date()));
        Ok(found)
    }

    async fn find_pending_for_users(&self, user_ids: &[Uuid]) -> RepoResult<Vec<LeaveRequest>> {
        let mut found: Vec<LeaveRequest> = self
            .leaves
            .lock()
            .await
            .values()
            .filter(|r| r.status() == LeaveStatus::Pending && user_ids.contains(&r.user_id()))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.submitted_at());
        Ok(found)
    }

    async fn count_by_status(&self, status: LeaveStatus) -> RepoResult<i64> {
        let leaves = self.leaves.lock().await;
        Ok(leaves.values().filter(|r| r.status() == status).count() as i64)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.leaves.lock().await.remove(&id).is_some())
    }
}

#[async_trait]
impl BalanceRepository for InMemoryStore {
    async fn append(&self, entry: &BalanceEntry) -> RepoResult<()> {
        self.balance_history.lock().await.push(entry.clone());
        Ok(())
    }

    async fn history_for_user(&self, user_id: Uuid) -> RepoResult<Vec<BalanceEntry>> {
        let mut found: Vec<BalanceEntry> = self
            .balance_history
            .lock()
            .await
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.changed_at);
        Ok(found)
    }

    async fn list_all(&self) -> RepoResult<Vec<BalanceEntry>> {
        let mut all = self.balance_history.lock().await.clone();
        all.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        Ok(all)
    }
}

#[async_trait]
impl LeavePolicyRepository for InMemoryStore {
    async fn find_policy(&self, team_id: Uuid) -> RepoResult<Option<LeavePolicy>> {
        Ok(self.policies.lock().await.get(&team_id).cloned())
    }

    async fn save_policy(&self, policy: &LeavePolicy) -> RepoResult<()> {
        self.policies
            .lock()
            .await
            .insert(policy.team_id, policy.clone());
        Ok(())
    }

    async fn find_member_rule(
        &self,
        team_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<Option<MemberLeaveRule>> {
        Ok(self
            .member_rules
            .lock()
            .await
            .get(&(team_id, member_id))
            .cloned())
    }

    async fn save_member_rule(&self, rule: &MemberLeaveRule) -> RepoResult<()> {
        self.member_rules
            .lock()
            .await
            .insert((rule.team_id, rule.member_id), rule.clone());
        Ok(())
    }

    async fn member_rules(&self, team_id: Uuid) -> RepoResult<Vec<MemberLeaveRule>> {
        Ok(self
            .member_rules
            .lock()
            .await
            .values()
            .filter(|r| r.team_id == team_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn save(&self, project: &Project) -> RepoResult<()> {
        let mut projects = self.projects.lock().await;
        if projects
            .values()
            .any(|p| p.id != project.id && p.code == project.code)
        {
            return Err(RepositoryError::Conflict(
                "A project with this code already exists".to_string(),
            ));
        }
        projects.insert(project.id, project.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Project>> {
        Ok(self.projects.lock().await.get(&id).cloned())
    }

    async fn list_active(&self) -> RepoResult<Vec<Project>> {
        let projects = self.projects.lock().await;
        Ok(sorted_projects(projects.values().filter(|p| p.active).cloned().collect()))
    }

    async fn find_by_teams(&self, team_ids: &[Uuid]) -> RepoResult<Vec<Project>> {
        let projects = self.projects.lock().await;
        Ok(sorted_projects(
            projects
                .values()
                .filter(|p| p.active && p.team_id.map_or(false, |t| team_ids.contains(&t)))
                .cloned()
                .collect(),
        ))
    }
}

fn sorted_projects(mut projects: Vec<Project>) -> Vec<Project> {
    projects.sort_by(|a, b| a.name.cmp(&b.name));
    projects
}

#[async_trait]
impl ImputationRepository for InMemoryStore {
    async fn save(&self, entry: &Imputation) -> RepoResult<()> {
        let mut entries = self.imputations.lock().await;
        let clash = entry.project_id.is_some()
            && entries.values().any(|e| {
                e.id != entry.id
                    && e.employee_id == entry.employee_id
                    && e.project_id == entry.project_id
                    && e.date == entry.date
            });
        if clash {
            return Err(RepositoryError::Conflict(
                "An entry already exists for this project on this date".to_string(),
            ));
        }
        entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Imputation>> {
        Ok(self.imputations.lock().await.get(&id).cloned())
    }

    async fn find(
        &self,
        employee_ids: &[Uuid],
        filter: &ImputationFilter,
    ) -> RepoResult<Vec<Imputation>> {
        let mut found: Vec<Imputation> = self
            .imputations
            .lock()
            .await
            .values()
            .filter(|e| employee_ids.contains(&e.employee_id) && filter.matches(e))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date).then(b.entered_at.cmp(&a.entered_at)));
        Ok(found)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.imputations.lock().await.remove(&id).is_some())
    }

    async fn mark_validated(
        &self,
        employee_id: Uuid,
        week: IsoWeek,
        by: Uuid,
        at: DateTime<Utc>,
    ) -> RepoResult<u64> {
        let mut count = 0;
        for entry in self.imputations.lock().await.values_mut() {
            if entry.employee_id == employee_id && week.contains(entry.date) {
                entry.mark_validated(by, at);
                count += 1;
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl WeekRepository for InMemoryStore {
    async fn save(&self, week: &TimesheetWeek) -> RepoResult<()> {
        let mut weeks = self.weeks.lock().await;
        if weeks.values().any(|w| {
            w.id() != week.id() && w.employee_id() == week.employee_id() && w.week() == week.week()
        }) {
            return Err(RepositoryError::Conflict("This week already exists".to_string()));
        }
        weeks.insert(week.id(), week.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<TimesheetWeek>> {
        Ok(self.weeks.lock().await.get(&id).cloned())
    }

    async fn find(&self, employee_id: Uuid, week: IsoWeek) -> RepoResult<Option<TimesheetWeek>> {
        Ok(self
            .weeks
            .lock()
            .await
            .values()
            .find(|w| w.employee_id() == employee_id && w.week() == week)
            .cloned())
    }

    async fn find_submitted_for(&self, employee_ids: &[Uuid]) -> RepoResult<Vec<TimesheetWeek>> {
        let mut found: Vec<TimesheetWeek> = self
            .weeks
            .lock()
            .await
            .values()
            .filter(|w| w.status() == WeekStatus::Submitted && employee_ids.contains(&w.employee_id()))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.week().cmp(&a.week()));
        Ok(found)
    }

    async fn count_by_status(&self, status: WeekStatus) -> RepoResult<i64> {
        let weeks = self.weeks.lock().await;
        Ok(weeks.values().filter(|w| w.status() == status).count() as i64)
    }
}

#[async_trait]
impl TrainingRepository for InMemoryStore {
    async fn save(&self, training: &Training) -> RepoResult<()> {
        self.trainings
            .lock()
            .await
            .insert(training.id, training.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Training>> {
        Ok(self.trainings.lock().await.get(&id).cloned())
    }

    async fn find_by_employee(&self, employee_id: Uuid) -> RepoResult<Vec<Training>> {
        let mut found: Vec<Training> = self
            .trainings
            .lock()
            .await
            .values()
            .filter(|t| t.employee_id == employee_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(found)
    }
}
