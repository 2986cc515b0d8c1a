// Credentials: password hashing, JWT sessions and one-time tokens

use thiserror::Error;

pub mod jwt;
pub mod password;
pub mod tokens;

pub use jwt::{create_token, verify_token, Claims};
pub use password::{hash_password, verify_password};
pub use tokens::{generate_reset_token, generate_temporary_password};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}
