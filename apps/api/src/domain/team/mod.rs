// Team domain module
// Contains team aggregate root and value objects

#![allow(clippy::module_inception)]

pub mod team;
pub mod value_objects;

// Re-export main types for convenience
pub use team::{members_managed_by, Team};
pub use value_objects::TeamStatus;
