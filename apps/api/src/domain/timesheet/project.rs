use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectCategory {
    Client,
    #[default]
    Internal,
    Rnd,
}

/// Fields accepted when creating or editing a project
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectDraft {
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub hourly_rate: Decimal,
    #[serde(default)]
    pub category: ProjectCategory,
    #[serde(default)]
    pub team_id: Option<Uuid>,
}

impl ProjectDraft {
    fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Project name cannot be empty"));
        }
        if self.end_date < self.start_date {
            return Err(DomainError::validation(
                "End date must be on or after start date",
            ));
        }
        if self.hourly_rate < Decimal::ZERO {
            return Err(DomainError::validation("Hourly rate cannot be negative"));
        }
        if let Some(code) = &self.code {
            if code.trim().is_empty() || code.len() > 50 {
                return Err(DomainError::validation(
                    "Project code must be between 1 and 50 characters",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hourly_rate: Decimal,
    pub category: ProjectCategory,
    pub team_id: Option<Uuid>,
    pub active: bool,
}

impl Project {
    /// Builds an active project; a missing code is generated
    pub fn new(draft: ProjectDraft) -> DomainResult<Self> {
        draft.validate()?;
        let code = match draft.code {
            Some(code) => code.trim().to_string(),
            None => generate_project_code(),
        };
        Ok(Self {
            id: Uuid::new_v4(),
            code,
            name: draft.name.trim().to_string(),
            description: draft.description,
            start_date: draft.start_date,
            end_date: draft.end_date,
            hourly_rate: draft.hourly_rate,
            category: draft.category,
            team_id: draft.team_id,
            active: true,
        })
    }

    /// Replaces the editable fields; the code only changes when a new one
    /// is supplied
    pub fn update(&mut self, draft: ProjectDraft) -> DomainResult<()> {
        draft.validate()?;
        if let Some(code) = draft.code {
            self.code = code.trim().to_string();
        }
        self.name = draft.name.trim().to_string();
        self.description = draft.description;
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
        self.hourly_rate = draft.hourly_rate;
        self.category = draft.category;
        self.team_id = draft.team_id;
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Active past its end date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.active && self.end_date < today
    }

    /// Value of `hours` at this project's rate
    pub fn value_of(&self, hours: Decimal) -> Decimal {
        hours * self.hourly_rate
    }
}

/// `PRJ-` followed by eight upper-case hex digits
pub fn generate_project_code() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("PRJ-{}", id[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn draft() -> ProjectDraft {
        ProjectDraft {
            code: None,
            name: "Billing revamp".into(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            hourly_rate: dec!(80),
            category: ProjectCategory::Client,
            team_id: None,
        }
    }

    #[test]
    fn code_is_generated_when_missing() {
        let project = Project::new(draft()).unwrap();
        assert!(project.code.starts_with("PRJ-"));
        assert_eq!(project.code.len(), 12);
        assert!(project.active);
    }

    #[test]
    fn explicit_code_is_kept() {
        let mut d = draft();
        d.code = Some(" ACME-1 ".into());
        assert_eq!(Project::new(d).unwrap().code, "ACME-1");
    }

    #[test]
    fn invalid_drafts_are_rejected() {
        let mut d = draft();
        d.end_date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert!(Project::new(d).is_err());

        let mut d = draft();
        d.hourly_rate = dec!(-1);
        assert!(Project::new(d).is_err());

        let mut d = draft();
        d.name = "  ".into();
        assert!(Project::new(d).is_err());
    }

    #[test]
    fn overdue_only_while_active() {
        let mut project = Project::new(draft()).unwrap();
        let after = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert!(project.is_overdue(after));
        assert!(!project.is_overdue(project.end_date));
        project.deactivate();
        assert!(!project.is_overdue(after));
    }
}
