// Password hashing utilities (bcrypt)

use bcrypt::{hash, verify, DEFAULT_COST};

use super::AuthError;

/// Hashes a password with bcrypt's default cost
///
/// # Example
/// ```
/// use sgirp_api::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("my_password").expect("valid hash");
/// assert!(verify_password("my_password", &hash).unwrap());
/// ```
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(hash(password, DEFAULT_COST)?)
}

/// Checks a plaintext password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    Ok(verify(password, hash)?)
}
