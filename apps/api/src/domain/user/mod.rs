// User domain module

#![allow(clippy::module_inception)]

pub mod user;
pub mod value_objects;

pub use user::{validate_password, User, MIN_PASSWORD_LEN};
pub use value_objects::{Email, Role};
