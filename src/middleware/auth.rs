// Identity attached to a request once its bearer token has been verified

use serde::{Deserialize, Serialize};

use crate::models::auth::SessionClaims;

/// Authenticated user information extracted from the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: String,
    pub exp: u64,
}

impl AuthenticatedUser {
    /// `None` when the subject is not an integer user id
    pub fn from_claims(claims: SessionClaims) -> Option<Self> {
        let user_id = claims.user_id()?;
        Some(Self {
            user_id,
            email: claims.email,
            exp: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_claims() {
        let claims = SessionClaims::new(42, "ada@example.com".to_string(), 1, 3600);
        let user = AuthenticatedUser::from_claims(claims).unwrap();
        assert_eq!(user.user_id, 42);
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn test_non_integer_subject_is_rejected() {
        let mut claims = SessionClaims::new(1, "a@b.test".to_string(), 1, 3600);
        claims.sub = "abc".to_string();
        assert!(AuthenticatedUser::from_claims(claims).is_none());
    }
}
