use super::AuthError;

/// Minimum plaintext length accepted on every path that sets a password
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn hash_password(plaintext: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(plaintext, cost).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// A malformed stored hash never matches
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}
