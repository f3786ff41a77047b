use pbkdf2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand_core::OsRng;
use thiserror::Error;

/// PBKDF2-SHA256 iteration count for new hashes. Existing hashes keep the
/// count recorded in their PHC string.
pub const ROUNDS: u32 = 600_000;

lazy_static::lazy_static! {
    /// Verified against when a login names an unknown user, so that both
    /// failure paths cost one full hash.
    static ref DUMMY_HASH: Option<String> = hash_password("dummy-password-for-timing").ok();
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    HashingFailure(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(password_hash::Error),
}

/// Hashes `plaintext` into a PHC string (`$pbkdf2-sha256$...`) with a fresh salt.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params {
        rounds: ROUNDS,
        output_length: 32,
    };
    Pbkdf2
        .hash_password_customized(plaintext.as_bytes(), None, None, params, &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordError::HashingFailure(err.to_string()))
}

/// Checks `plaintext` against a stored PHC string. A mismatch is `Ok(false)`.
pub fn verify_password(hash: &str, plaintext: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(PasswordError::MalformedHash)?;
    match Pbkdf2.verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(PasswordError::MalformedHash(err)),
    }
}

pub async fn hash_blocking(plaintext: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext))
        .await
        .map_err(|err| PasswordError::HashingFailure(err.to_string()))?
}

pub async fn verify_blocking(hash: String, plaintext: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&hash, &plaintext))
        .await
        .map_err(|err| PasswordError::HashingFailure(err.to_string()))?
}

/// Burns the same work as a real verification and always reports a mismatch.
pub async fn verify_dummy(plaintext: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || -> Result<bool, PasswordError> {
        if let Some(hash) = DUMMY_HASH.as_ref() {
            verify_password(hash, &plaintext)?;
        }
        Ok(false)
    })
    .await
    .map_err(|err| PasswordError::HashingFailure(err.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_self_describing() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();

        assert!(first.starts_with("$pbkdf2-sha256$"));
        assert!(first.contains("i=600000"));
        assert_ne!(first, second);
    }

    #[test]
    fn verify_accepts_matching_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password(&hash, "correct horse").unwrap());
    }

    #[test]
    fn verify_rejects_wrong_password_without_error() {
        let hash = hash_password("correct horse").unwrap();
        assert!(!verify_password(&hash, "battery staple").unwrap());
    }

    #[test]
    fn verify_reports_malformed_hash() {
        let result = verify_password("not-a-phc-string", "whatever");
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }

    #[tokio::test]
    async fn blocking_wrappers_round_trip() {
        let hash = hash_blocking("s3cret-pass".to_string()).await.unwrap();
        assert!(verify_blocking(hash, "s3cret-pass".to_string()).await.unwrap());
    }

    #[test]
    fn older_round_counts_still_verify() {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params {
            rounds: 10_000,
            output_length: 32,
        };
        let legacy = Pbkdf2
            .hash_password_customized(b"correct horse", None, None, params, &salt)
            .unwrap()
            .to_string();

        assert!(legacy.contains("i=10000"));
        assert!(verify_password(&legacy, "correct horse").unwrap());
    }

    #[tokio::test]
    async fn dummy_verification_never_matches() {
        let dummy = DUMMY_HASH.as_deref().unwrap();
        assert!(dummy.contains("i=600000"));

        assert!(!verify_dummy("dummy-password-for-timing".to_string()).await.unwrap());
        assert!(!verify_dummy("anything".to_string()).await.unwrap());
    }
}
