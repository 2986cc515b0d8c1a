// JWT token creation and verification
// Tokens carry the user id and role; lifetime comes from AuthSettings

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::domain::user::Role;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID (subject)
    pub sub: Uuid,
    /// Role at issue time; the extractor re-reads the stored role
    pub role: Role,
    /// Expiry timestamp (seconds since epoch)
    pub exp: usize,
}

/// Creates an HS256 token for a user valid for `ttl` from `now`
///
/// # Example
/// ```
/// use sgirp_api::auth::jwt::{create_token, verify_token};
/// use sgirp_api::domain::user::Role;
/// use chrono::{Duration, Utc};
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let token = create_token(user_id, Role::Manager, "secret", Duration::hours(8), Utc::now())
///     .expect("valid token");
/// let claims = verify_token(&token, "secret").expect("valid claims");
/// assert_eq!(claims.sub, user_id);
/// ```
pub fn create_token(
    user_id: Uuid,
    role: Role,
    secret: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let claims = Claims {
        sub: user_id,
        role,
        exp: (now + ttl).timestamp().max(0) as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

/// Verifies signature and expiry, returning the claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
