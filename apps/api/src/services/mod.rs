// Use cases spanning several repositories
// Handlers stay thin and delegate the multi-step workflows here

pub mod access;
pub mod leave;
pub mod reporting;
pub mod timesheet;
