// Password hashing and verification utilities using bcrypt

use thiserror::Error;

/// Errors that can occur during password operations.
/// Messages never include the plaintext password.
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingError(String),

    #[error("Failed to verify password: {0}")]
    VerificationError(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Password hashing task failed: {0}")]
    TaskFailed(String),
}

/// Hash a password with bcrypt at the given work factor
///
/// # Example
/// ```
/// use linkshelf_backend::utils::password::hash_password;
/// let hashed = hash_password("my_secure_password", 4).unwrap();
/// assert!(hashed.starts_with("$2b$04$"));
/// ```
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    bcrypt::hash(password, cost).map_err(|e| PasswordError::HashingError(e.to_string()))
}

/// Verify a password against a stored bcrypt hash
///
/// Returns `Ok(false)` on mismatch and an error only when the stored hash is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    match bcrypt::verify(password, hash) {
        Ok(matches) => Ok(matches),
        Err(bcrypt::BcryptError::InvalidHash(_))
        | Err(bcrypt::BcryptError::InvalidPrefix(_))
        | Err(bcrypt::BcryptError::InvalidCost(_))
        | Err(bcrypt::BcryptError::InvalidBase64(_)) => Err(PasswordError::InvalidHashFormat),
        Err(e) => Err(PasswordError::VerificationError(e.to_string())),
    }
}

/// Run [`hash_password`] on the blocking pool; bcrypt is CPU bound.
pub async fn hash_password_async(password: String, cost: u32) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
}

/// Run [`verify_password`] on the blocking pool.
pub async fn verify_password_async(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
}
