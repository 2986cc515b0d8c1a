use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::AuthUser;
use crate::auth::{generate_temporary_password, hash_password};
use crate::domain::user::{validate_password, Email, Role, User};
use crate::services::access::load_user;
use crate::state::AppState;

/// Public view of a user (no credentials)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub first_login: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name(),
            id: user.id,
            email: user.email.to_string(),
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_active: user.is_active,
            first_login: user.first_login,
            date_joined: user.date_joined,
            last_login: user.last_login,
        }
    }
}

fn parse_email(raw: &str) -> Result<Email, ApiError> {
    Email::new(raw).map_err(|e| ApiError::bad_request(format!("Invalid email: {}", e)))
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.parse::<Role>().map_err(ApiError::bad_request)
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub user: UserResponse,
    /// Only present when the password was generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}

/// Create an account
///
/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), ApiError> {
    auth.require_admin()?;

    let email = parse_email(&req.email)?;
    let role = match req.role.as_deref() {
        Some(raw) => parse_role(raw)?,
        None => Role::Employee,
    };
    let (password, temporary_password) = match req.password {
        Some(password) => {
            validate_password(&password)?;
            (password, None)
        }
        None => {
            let generated = generate_temporary_password();
            (generated.clone(), Some(generated))
        }
    };

    let user = User::new(
        email,
        req.first_name,
        req.last_name,
        role,
        hash_password(&password)?,
        state.clock.now(),
    )?;
    state.users.create(&user).await?;

    tracing::info!(user_id = %user.id, role = %user.role, created_by = %auth.0.id, "user created");
    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            user: UserResponse::from(user),
            temporary_password,
        }),
    ))
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    auth.require_admin()?;
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_admin()?;
    Ok(Json(UserResponse::from(load_user(&state, id).await?)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_admin()?;
    let mut user = load_user(&state, id).await?;
    if let Some(raw) = req.email.as_deref() {
        user.email = parse_email(raw)?;
    }
    user.rename(req.first_name, req.last_name);
    state.users.update(&user).await?;
    Ok(Json(UserResponse::from(user)))
}

#[derive(Debug, Deserialize)]
pub struct ActivationRequest {
    pub is_active: Option<bool>,
}

/// PATCH /api/users/:id/activate
pub async fn set_activation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ActivationRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_admin()?;
    let is_active = req
        .is_active
        .ok_or_else(|| ApiError::bad_request("The is_active field is required"))?;
    let mut user = load_user(&state, id).await?;
    if user.id == auth.0.id && !is_active {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }
    user.is_active = is_active;
    state.users.update(&user).await?;

    tracing::info!(user_id = %user.id, is_active, "account activation changed");
    Ok(Json(UserResponse::from(user)))
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: String,
}

/// PATCH /api/users/:id/role
pub async fn set_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_admin()?;
    let role = parse_role(&req.role)?;
    let mut user = load_user(&state, id).await?;
    user.role = role;
    state.users.update(&user).await?;

    tracing::info!(user_id = %user.id, role = %role, "role changed");
    Ok(Json(UserResponse::from(user)))
}
