use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::repositories::{RepoResult, RepositoryError, UserRepository};
use crate::domain::user::{Email, Role, User};

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = r#"
    id, email, first_name, last_name, role, password_hash, is_active,
    first_login, date_joined, last_login, reset_token, reset_token_expiry
"#;

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    role: Role,
    password_hash: String,
    is_active: bool,
    first_login: bool,
    date_joined: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
    reset_token: Option<String>,
    reset_token_expiry: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::new(r.email).map_err(RepositoryError::Corrupt)?;
        Ok(User {
            id: r.id,
            email,
            first_name: r.first_name,
            last_name: r.last_name,
            role: r.role,
            password_hash: r.password_hash,
            is_active: r.is_active,
            first_login: r.first_login,
            date_joined: r.date_joined,
            last_login: r.last_login,
            reset_token: r.reset_token,
            reset_token_expiry: r.reset_token_expiry,
        })
    }
}

impl PostgresUserRepository {
    async fn fetch_one_where(&self, clause: &str, value: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, clause);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, first_name, last_name, role, password_hash, is_active,
                first_login, date_joined, last_login, reset_token, reset_token_expiry
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id)
        .bind(user.email.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.first_login)
        .bind(user.date_joined)
        .bind(user.last_login)
        .bind(&user.reset_token)
        .bind(user.reset_token_expiry)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "A user with this email already exists"))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> RepoResult<Option<User>> {
        self.fetch_one_where("email", email.as_str()).await
    }

    async fn find_by_reset_token(&self, token: &str) -> RepoResult<Option<User>> {
        self.fetch_one_where("reset_token", token).await
    }

    async fn list(&self) -> RepoResult<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY last_name, first_name",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn update(&self, user: &User) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = $2, first_name = $3, last_name = $4, role = $5,
                password_hash = $6, is_active = $7, first_login = $8,
                last_login = $9, reset_token = $10, reset_token_expiry = $11
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(user.email.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.first_login)
        .bind(user.last_login)
        .bind(&user.reset_token)
        .bind(user.reset_token_expiry)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "A user with this email already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("User {}", user.id)));
        }
        Ok(())
    }

    async fn update_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> RepoResult<()> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(user_id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
