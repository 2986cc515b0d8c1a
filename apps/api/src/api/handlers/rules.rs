use axum::{extract::State, Json};

use crate::api::errors::ApiError;
use crate::api::middleware::AuthUser;
use crate::domain::rules::GlobalRules;
use crate::services::access::load_rules;
use crate::state::AppState;

/// GET /api/rules
pub async fn get_rules(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<GlobalRules>, ApiError> {
    Ok(Json(load_rules(&state).await?))
}

/// Replace the global rules
///
/// PUT /api/rules
pub async fn update_rules(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(rules): Json<GlobalRules>,
) -> Result<Json<GlobalRules>, ApiError> {
    auth.require_admin()?;
    let rules = rules.validate()?;
    state.rules.save(&rules).await?;

    tracing::info!(
        working_days = rules.working_days.len(),
        holidays = rules.holidays.len(),
        "global rules updated"
    );
    Ok(Json(rules))
}
