use serde::{Deserialize, Serialize};

/// Whether a team is currently in use
///
/// # Status Transitions
/// ```text
/// Active <-> Inactive
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "team_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamStatus {
    /// Team is in use; its projects accept time entries
    #[default]
    Active,
    /// Team is kept for history only
    Inactive,
}

impl std::fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamStatus::Active => write!(f, "active"),
            TeamStatus::Inactive => write!(f, "inactive"),
        }
    }
}
