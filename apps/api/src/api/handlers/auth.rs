use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::handlers::users::UserResponse;
use crate::api::middleware::AuthUser;
use crate::auth::{create_token, generate_reset_token, hash_password, verify_password};
use crate::domain::user::{validate_password, Email, User};
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Email or password incorrect";

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login outcome: a session, or a prompt to replace the temporary password
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LoginResponse {
    FirstLogin {
        first_login: bool,
        email: String,
        message: String,
    },
    Session {
        token: String,
        user: UserResponse,
    },
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Loads an active user and checks the password, with one error message
/// for every failure so account existence is not revealed
async fn authenticate(state: &AppState, email: &str, password: &str) -> Result<User, ApiError> {
    let Ok(email) = Email::new(email) else {
        return Err(ApiError::bad_request(BAD_CREDENTIALS));
    };
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::bad_request(BAD_CREDENTIALS))?;

    // An unreadable stored hash counts as a mismatch
    if !verify_password(password, &user.password_hash).unwrap_or(false) {
        tracing::warn!(user_id = %user.id, "failed login attempt");
        return Err(ApiError::bad_request(BAD_CREDENTIALS));
    }
    Ok(user)
}

fn session_for(state: &AppState, user: User) -> Result<LoginResponse, ApiError> {
    let token = create_token(
        user.id,
        user.role,
        &state.auth.jwt_secret,
        state.token_ttl(),
        state.clock.now(),
    )?;
    Ok(LoginResponse::Session {
        token,
        user: UserResponse::from(user),
    })
}

/// Login with email and password
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut user = authenticate(&state, &req.email, &req.password).await?;

    if user.first_login {
        return Ok(Json(LoginResponse::FirstLogin {
            first_login: true,
            email: user.email.to_string(),
            message: "Please change your temporary password".to_string(),
        }));
    }

    let now = state.clock.now();
    state.users.update_last_login(user.id, now).await?;
    user.last_login = Some(now);

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(session_for(&state, user)?))
}

#[derive(Debug, Deserialize)]
pub struct FirstPasswordChangeRequest {
    pub email: String,
    pub old_password: String,
    pub new_password: String,
}

/// Replace the temporary password and open a session
///
/// POST /api/auth/first-password-change
pub async fn first_password_change(
    State(state): State<AppState>,
    Json(req): Json<FirstPasswordChangeRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut user = authenticate(&state, &req.email, &req.old_password).await?;
    validate_password(&req.new_password)?;
    if req.new_password == req.old_password {
        return Err(ApiError::bad_request(
            "New password must differ from the temporary password",
        ));
    }

    user.set_password_hash(hash_password(&req.new_password)?);
    user.last_login = Some(state.clock.now());
    state.users.update(&user).await?;

    tracing::info!(user_id = %user.id, "temporary password replaced");
    Ok(Json(session_for(&state, user)?))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Issue a reset token
///
/// POST /api/auth/password-reset
pub async fn password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let not_found = || ApiError::not_found("No account uses this email");
    let email = Email::new(&req.email).map_err(|_| not_found())?;
    let mut user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(not_found)?;

    user.issue_reset_token(generate_reset_token(), state.clock.now() + state.reset_token_ttl());
    state.users.update(&user).await?;

    tracing::info!(user_id = %user.id, "password reset requested");
    Ok(MessageResponse::new("A password reset link has been issued"))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub token: String,
    pub new_password: String,
}

/// Set a new password with a reset token
///
/// POST /api/auth/password-reset-confirm
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetConfirmRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let invalid = || ApiError::bad_request("Invalid or expired token");
    let mut user = state
        .users
        .find_by_reset_token(&req.token)
        .await?
        .ok_or_else(invalid)?;
    if !user.reset_token_valid(&req.token, state.clock.now()) {
        return Err(invalid());
    }
    validate_password(&req.new_password)?;

    user.set_password_hash(hash_password(&req.new_password)?);
    state.users.update(&user).await?;

    tracing::info!(user_id = %user.id, "password reset completed");
    Ok(MessageResponse::new("Password updated"))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !verify_password(&req.old_password, &user.password_hash).unwrap_or(false) {
        return Err(ApiError::bad_request("Old password incorrect"));
    }
    validate_password(&req.new_password)?;

    user.set_password_hash(hash_password(&req.new_password)?);
    state.users.update(&user).await?;
    Ok(MessageResponse::new("Password updated"))
}

/// GET /api/auth/me
pub async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// PUT /api/auth/me
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    user.rename(req.first_name, req.last_name);
    state.users.update(&user).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
