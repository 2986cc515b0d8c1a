use axum::{
    routing::{get, patch, post, put},
    Router,
};

use super::handlers::{auth, leaves, policies, projects, rules, teams, timesheets, users};
use crate::state::AppState;

/// Every route of the API, bound to `state`
///
/// Layers (CORS, tracing) are added by the binary so tests can drive the
/// bare router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(auth::health_check))
        // Auth routes
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/first-password-change", post(auth::first_password_change))
        .route("/api/auth/password-reset", post(auth::password_reset))
        .route("/api/auth/password-reset-confirm", post(auth::password_reset_confirm))
        .route("/api/auth/change-password", post(auth::change_password))
        .route("/api/auth/me", get(auth::me).put(auth::update_me))
        // User administration
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/:id", get(users::get_user).put(users::update_user))
        .route("/api/users/:id/activate", patch(users::set_activation))
        .route("/api/users/:id/role", patch(users::set_role))
        // Team routes
        .route("/api/teams", get(teams::list_teams).post(teams::create_team))
        .route(
            "/api/teams/:id",
            get(teams::get_team)
                .patch(teams::update_team)
                .delete(teams::delete_team),
        )
        // Global rules
        .route("/api/rules", get(rules::get_rules).put(rules::update_rules))
        // Leave routes
        .route("/api/leaves", get(leaves::list_leaves).post(leaves::create_leave))
        .route("/api/leaves/balance", get(leaves::get_balance))
        .route("/api/leaves/dashboard", get(leaves::leave_dashboard))
        .route(
            "/api/leaves/:id",
            get(leaves::get_leave)
                .put(leaves::update_leave)
                .delete(leaves::delete_leave),
        )
        // Projects
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/projects/:id",
            put(projects::update_project).delete(projects::delete_project),
        )
        // Time imputations
        .route(
            "/api/imputations",
            get(timesheets::list_imputations).post(timesheets::create_imputation),
        )
        .route("/api/imputations/current-week", get(timesheets::current_week))
        .route("/api/imputations/submit-week", post(timesheets::submit_week))
        .route("/api/imputations/history", get(timesheets::history))
        .route("/api/imputations/monthly-summary", get(timesheets::monthly))
        .route("/api/imputations/projects", get(timesheets::imputable_projects))
        .route("/api/imputations/trainings", get(timesheets::list_trainings))
        .route(
            "/api/imputations/:id",
            put(timesheets::update_imputation).delete(timesheets::delete_imputation),
        )
        .route(
            "/api/trainings",
            get(timesheets::list_trainings).post(timesheets::create_training),
        )
        // Manager routes
        .route("/api/manager/dashboard", get(timesheets::manager_dashboard))
        .route("/api/manager/teams", get(teams::my_managed_teams))
        .route("/api/manager/teams/available", get(teams::available_teams))
        .route(
            "/api/manager/teams/:id/leave-policy",
            get(policies::get_policy).put(policies::put_policy),
        )
        .route(
            "/api/manager/teams/:id/leave-policy/members/:user_id",
            put(policies::put_member_rule),
        )
        .route("/api/manager/leaves/pending", get(leaves::pending_leaves))
        .route("/api/manager/leaves/:id/decision", post(leaves::decide_leave))
        .route("/api/manager/weeks/:id/decision", post(timesheets::decide_week))
        .route(
            "/api/manager/employees/:id/weeks/:year/:week",
            get(timesheets::employee_week),
        )
        .route("/api/manager/reporting", get(timesheets::reporting))
        // Admin routes
        .route("/api/admin/dashboard", get(leaves::admin_dashboard))
        .route("/api/admin/balance-history", get(leaves::balance_history))
        .route("/api/admin/balance-adjustments", post(leaves::adjust_balance))
        // Shared state
        .with_state(state)
}
