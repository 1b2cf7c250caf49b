use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// A freshly issued password reset token. Only `hash` and `expires_at` are
/// stored; `plaintext` goes out in the reset email.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub plaintext: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_reset_token(window_minutes: i64) -> ResetToken {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    let plaintext = hex::encode(bytes);
    ResetToken {
        hash: hash_reset_token(&plaintext),
        plaintext,
        expires_at: Utc::now() + Duration::minutes(window_minutes),
    }
}

pub fn hash_reset_token(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}
