// JWT session token service
// HS256 tokens with a fixed seven day lifetime and no server-side revocation

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::app_config::AppConfig;
use crate::models::auth::SessionClaims;

/// Seven days in seconds
pub const SESSION_TOKEN_EXPIRY: u64 = 7 * 24 * 60 * 60;

// Error types for JWT operations
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("JWT signing secret is not configured")]
    MissingSecret,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            _ => JwtError::InvalidToken(err.to_string()),
        }
    }
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

#[derive(Clone)]
pub struct JwtConfig {
    pub token_expiry: u64,
    pub algorithm: Algorithm,
    keys: Option<std::sync::Arc<SigningKeys>>,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("token_expiry", &self.token_expiry)
            .field("algorithm", &self.algorithm)
            .field(
                "keys",
                &if self.keys.is_some() {
                    "<redacted>"
                } else {
                    "<missing>"
                },
            )
            .finish()
    }
}

impl JwtConfig {
    /// Build the config from an optional shared secret
    pub fn from_secret(secret: Option<&str>) -> Self {
        let keys = secret.map(|secret| {
            std::sync::Arc::new(SigningKeys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            })
        });

        JwtConfig {
            token_expiry: SESSION_TOKEN_EXPIRY,
            algorithm: Algorithm::HS256,
            keys,
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::from_secret(config.jwt_secret.as_deref())
    }

    /// Create JWT config for tests with a hardcoded secret
    #[cfg(test)]
    pub fn for_test() -> Self {
        Self::from_secret(Some("test-session-secret-hs256"))
    }

    pub fn has_secret(&self) -> bool {
        self.keys.is_some()
    }

    fn keys(&self) -> Result<&SigningKeys, JwtError> {
        self.keys.as_deref().ok_or(JwtError::MissingSecret)
    }
}

pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    pub fn has_secret(&self) -> bool {
        self.config.has_secret()
    }

    /// Issue a session token for the given user
    pub fn issue_session_token(&self, user_id: i32, email: &str) -> Result<String, JwtError> {
        let keys = self.config.keys()?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| JwtError::TokenCreation(e.to_string()))?
            .as_secs();

        let claims = SessionClaims::new(
            user_id,
            email.to_string(),
            now,
            now + self.config.token_expiry,
        );

        encode(&Header::new(self.config.algorithm), &claims, &keys.encoding)
            .map_err(|e| JwtError::TokenCreation(e.to_string()))
    }

    /// Verify signature and expiry, returning the claims
    pub fn validate_session_token(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let keys = self.config.keys()?;

        let mut validation = Validation::new(self.config.algorithm);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0; // No leeway for expiry validation

        let token_data = decode::<SessionClaims>(token, &keys.decoding, &validation)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_with_secret(claims: &SessionClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[test]
    fn test_token_issue_and_validate() {
        let service = JwtService::new(JwtConfig::for_test());

        let token = service.issue_session_token(17, "reader@example.com").unwrap();
        let claims = service.validate_session_token(&token).unwrap();

        assert_eq!(claims.sub, "17");
        assert_eq!(claims.email, "reader@example.com");
        assert_eq!(claims.exp - claims.iat, SESSION_TOKEN_EXPIRY);
    }

    #[test]
    fn test_missing_secret() {
        let service = JwtService::new(JwtConfig::from_secret(None));
        assert!(!service.has_secret());
        assert!(JwtService::new(JwtConfig::for_test()).has_secret());

        assert!(matches!(
            service.issue_session_token(1, "a@b.test"),
            Err(JwtError::MissingSecret)
        ));
        assert!(matches!(
            service.validate_session_token("whatever"),
            Err(JwtError::MissingSecret)
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let service = JwtService::new(JwtConfig::for_test());
        let claims = SessionClaims::new(1, "a@b.test".to_string(), now(), now() + 60);
        let forged = encode_with_secret(&claims, "some-other-secret");

        assert!(matches!(
            service.validate_session_token(&forged),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::new(JwtConfig::for_test());
        let issued = now() - 3600;
        let claims = SessionClaims::new(1, "a@b.test".to_string(), issued, issued + 60);
        let token = encode_with_secret(&claims, "test-session-secret-hs256");

        assert!(matches!(
            service.validate_session_token(&token),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_garbage_token() {
        let service = JwtService::new(JwtConfig::for_test());
        assert!(matches!(
            service.validate_session_token("not.a.jwt"),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let debug = format!("{:?}", JwtConfig::for_test());
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("test-session-secret"));
    }
}
