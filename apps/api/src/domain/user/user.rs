use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::value_objects::{Email, Role};
use crate::domain::errors::{DomainError, DomainResult};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// A person with access to the application
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub password_hash: String,
    pub is_active: bool,
    /// Set until the user replaces the temporary password they were given
    pub first_login: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub reset_token: Option<String>,
    pub reset_token_expiry: Option<DateTime<Utc>>,
}

impl User {
    /// Creates a new active user that must change its password at first login
    pub fn new(
        email: Email,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: Role,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let first_name = first_name.into().trim().to_string();
        let last_name = last_name.into().trim().to_string();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(DomainError::validation("First name and last name are required"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            email,
            first_name,
            last_name,
            role,
            password_hash,
            is_active: true,
            first_login: true,
            date_joined: now,
            last_login: None,
            reset_token: None,
            reset_token_expiry: None,
        })
    }

    /// "First Last", as shown on dashboards and reports
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    /// Renames the user; blank values keep the current name
    pub fn rename(&mut self, first_name: Option<String>, last_name: Option<String>) {
        if let Some(first) = first_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            self.first_name = first;
        }
        if let Some(last) = last_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            self.last_name = last;
        }
    }

    /// Replaces the password hash and clears first-login and reset state
    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.first_login = false;
        self.reset_token = None;
        self.reset_token_expiry = None;
    }

    /// Stores a password reset token valid until `expires_at`
    pub fn issue_reset_token(&mut self, token: String, expires_at: DateTime<Utc>) {
        self.reset_token = Some(token);
        self.reset_token_expiry = Some(expires_at);
    }

    /// True when `token` is the current reset token and has not expired
    pub fn reset_token_valid(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_token, self.reset_token_expiry) {
            (Some(stored), Some(expiry)) => stored == token && now < expiry,
            _ => false,
        }
    }
}

/// Rejects passwords shorter than [`MIN_PASSWORD_LEN`]
pub fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user() -> User {
        User::new(
            Email::new("jane@example.com").unwrap(),
            "Jane",
            "Doe",
            Role::Employee,
            "hash".to_string(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn new_user_is_active_and_must_change_password() {
        let user = sample_user();
        assert!(user.is_active);
        assert!(user.first_login);
        assert_eq!(user.full_name(), "Jane Doe");
    }

    #[test]
    fn blank_names_are_rejected() {
        let result = User::new(
            Email::new("x@y.z").unwrap(),
            " ",
            "Doe",
            Role::Employee,
            "hash".to_string(),
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rename_ignores_blank_values() {
        let mut user = sample_user();
        user.rename(Some("  ".to_string()), Some("Smith".to_string()));
        assert_eq!(user.first_name, "Jane");
        assert_eq!(user.last_name, "Smith");
    }

    #[test]
    fn reset_token_expires() {
        let mut user = sample_user();
        let now = Utc::now();
        user.issue_reset_token("abc".to_string(), now + Duration::minutes(30));

        assert!(user.reset_token_valid("abc", now));
        assert!(!user.reset_token_valid("abd", now));
        assert!(!user.reset_token_valid("abc", now + Duration::hours(1)));
    }

    #[test]
    fn setting_password_clears_reset_state() {
        let mut user = sample_user();
        user.issue_reset_token("abc".to_string(), Utc::now());
        user.set_password_hash("new".to_string());

        assert!(!user.first_login);
        assert!(user.reset_token.is_none());
        assert!(user.reset_token_expiry.is_none());
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }
}
