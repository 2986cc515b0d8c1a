use rand::distributions::Alphanumeric;
use rand::Rng;

const RESET_TOKEN_LEN: usize = 48;
const TEMP_PASSWORD_LEN: usize = 12;

fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// URL-safe token sent to a user who asked for a password reset
pub fn generate_reset_token() -> String {
    random_alphanumeric(RESET_TOKEN_LEN)
}

/// Password given to accounts created without one
pub fn generate_temporary_password() -> String {
    random_alphanumeric(TEMP_PASSWORD_LEN)
}
