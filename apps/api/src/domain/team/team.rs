use super::value_objects::TeamStatus;
use crate::domain::errors::{DomainError, DomainResult};
use chrono::NaiveDate;
use uuid::Uuid;

/// Team aggregate root
///
/// Groups employees under a manager. Team membership drives which
/// projects an employee may book time on and which manager validates
/// their leave requests and timesheets.
///
/// # Invariants
/// - Name cannot be empty
/// - Members are unique
/// - The manager is never listed as a member of their own team
///
/// # Example
/// ```
/// use sgirp_api::domain::team::Team;
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let manager = Uuid::new_v4();
/// let member = Uuid::new_v4();
/// let team = Team::new(
///     "Platform".to_string(),
///     String::new(),
///     Some(manager),
///     vec![member, member],
///     NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
/// ).expect("valid team");
///
/// assert_eq!(team.member_ids().len(), 1);
/// assert!(team.is_managed_by(manager));
/// ```
#[derive(Debug, Clone)]
pub struct Team {
    id: Uuid,
    name: String,
    description: String,
    manager_id: Option<Uuid>,
    member_ids: Vec<Uuid>,
    created_on: NaiveDate,
    status: TeamStatus,
}

impl Team {
    /// Creates a new active Team
    ///
    /// # Business Rules Enforced
    /// - Name must not be blank
    /// - Duplicate member ids are collapsed
    /// - The manager is removed from the member list
    pub fn new(
        name: String,
        description: String,
        manager_id: Option<Uuid>,
        member_ids: Vec<Uuid>,
        created_on: NaiveDate,
    ) -> DomainResult<Self> {
        let name = Self::validate_name(name)?;
        let mut team = Self {
            id: Uuid::new_v4(),
            name,
            description,
            manager_id,
            member_ids: Vec::new(),
            created_on,
            status: TeamStatus::Active,
        };
        team.set_members(member_ids);
        Ok(team)
    }

    fn validate_name(name: String) -> DomainResult<String> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Team name cannot be empty"));
        }
        Ok(name)
    }

    /// Renames the team
    pub fn rename(&mut self, name: String) -> DomainResult<()> {
        self.name = Self::validate_name(name)?;
        Ok(())
    }

    pub fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub fn set_status(&mut self, status: TeamStatus) {
        self.status = status;
    }

    /// Assigns a new manager, dropping them from the member list
    pub fn assign_manager(&mut self, manager_id: Option<Uuid>) {
        self.manager_id = manager_id;
        if let Some(manager) = manager_id {
            self.member_ids.retain(|id| *id != manager);
        }
    }

    /// Replaces the member list
    pub fn set_members(&mut self, member_ids: Vec<Uuid>) {
        let mut members: Vec<Uuid> = Vec::with_capacity(member_ids.len());
        for id in member_ids {
            if Some(id) != self.manager_id && !members.contains(&id) {
                members.push(id);
            }
        }
        self.member_ids = members;
    }

    /// True when `user_id` belongs to the team
    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.member_ids.contains(&user_id)
    }

    /// True when `user_id` manages the team
    pub fn is_managed_by(&self, user_id: Uuid) -> bool {
        self.manager_id == Some(user_id)
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn manager_id(&self) -> Option<Uuid> {
        self.manager_id
    }

    pub fn member_ids(&self) -> &[Uuid] {
        &self.member_ids
    }

    pub fn created_on(&self) -> NaiveDate {
        self.created_on
    }

    pub fn status(&self) -> TeamStatus {
        self.status
    }

    /// Reconstructs a Team from persistence layer data
    ///
    /// Only to be used by repository implementations.
    pub fn from_persistence(
        id: Uuid,
        name: String,
        description: String,
        manager_id: Option<Uuid>,
        member_ids: Vec<Uuid>,
        created_on: NaiveDate,
        status: TeamStatus,
    ) -> Self {
        Self {
            id,
            name,
            description,
            manager_id,
            member_ids,
            created_on,
            status,
        }
    }
}

/// Ids of every member of teams managed by `manager_id`
pub fn members_managed_by(teams: &[Team], manager_id: Uuid) -> Vec<Uuid> {
    let mut ids = Vec::new();
    for team in teams.iter().filter(|t| t.is_managed_by(manager_id)) {
        for id in team.member_ids() {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    #[test]
    fn create_team_with_valid_name() {
        let manager = Uuid::new_v4();
        let team = Team::new("Ops".to_string(), "desc".to_string(), Some(manager), vec![], today())
            .unwrap();

        assert_eq!(team.name(), "Ops");
        assert_eq!(team.status(), TeamStatus::Active);
        assert!(team.is_managed_by(manager));
        assert_eq!(team.created_on(), today());
    }

    #[test]
    fn create_team_with_empty_name_fails() {
        let result = Team::new("   ".to_string(), String::new(), None, vec![], today());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn manager_is_not_kept_as_member() {
        let manager = Uuid::new_v4();
        let member = Uuid::new_v4();
        let team = Team::new(
            "Ops".to_string(),
            String::new(),
            Some(manager),
            vec![manager, member],
            today(),
        )
        .unwrap();

        assert_eq!(team.member_ids(), &[member]);
    }

    #[test]
    fn assigning_member_as_manager_removes_membership() {
        let member = Uuid::new_v4();
        let mut team =
            Team::new("Ops".to_string(), String::new(), None, vec![member], today()).unwrap();

        team.assign_manager(Some(member));
        assert!(!team.has_member(member));
        assert!(team.is_managed_by(member));
    }

    #[test]
    fn members_managed_by_collects_unique_ids() {
        let manager = Uuid::new_v4();
        let shared = Uuid::new_v4();
        let other = Uuid::new_v4();
        let teams = vec![
            Team::new("A".into(), String::new(), Some(manager), vec![shared], today()).unwrap(),
            Team::new("B".into(), String::new(), Some(manager), vec![shared, other], today())
                .unwrap(),
            Team::new("C".into(), String::new(), None, vec![Uuid::new_v4()], today()).unwrap(),
        ];

        let ids = members_managed_by(&teams, manager);
        assert_eq!(ids, vec![shared, other]);
    }
}
