use crate::error::PasswordError;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

const SALT_BYTES: usize = 16;

/// Hashes `password` into an argon2id PHC string on the blocking pool.
pub(crate) async fn hash(password: String) -> Result<String, PasswordError> {
    blocking(move || {
        let mut salt = [0u8; SALT_BYTES];
        getrandom::fill(&mut salt).map_err(|e| PasswordError::Internal {
            message: e.to_string().into(),
            context: Some("Generating salt".into()),
        })?;
        let salt = SaltString::encode_b64(&salt)?;
        Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
    })
    .await
}

pub(crate) async fn verify(password: String, hash: String) -> Result<bool, PasswordError> {
    blocking(move || {
        let parsed = PasswordHash::new(&hash)?;
        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    })
    .await
}

async fn blocking<T, F>(f: F) -> Result<T, PasswordError>
where
    F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| PasswordError::Internal {
        message: e.to_string().into(),
        context: Some("Hashing task".into()),
    })?
}
