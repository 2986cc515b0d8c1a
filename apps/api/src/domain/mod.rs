// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod errors;
pub mod leave;
pub mod repositories;
pub mod rules;
pub mod team;
pub mod timesheet;
pub mod user;

pub use errors::{DomainError, DomainResult};
