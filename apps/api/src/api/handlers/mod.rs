// HTTP handlers, one module per resource

pub mod auth;
pub mod leaves;
pub mod policies;
pub mod projects;
pub mod rules;
pub mod teams;
pub mod timesheets;
pub mod users;
