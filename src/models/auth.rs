// Authentication models

use serde::{Deserialize, Serialize};

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// User ID (subject), the decimal form of the integer user id
    pub sub: String,

    /// User email address at issue time
    pub email: String,

    /// Issued at timestamp (Unix epoch seconds)
    pub iat: u64,

    /// Expires at timestamp (Unix epoch seconds)
    pub exp: u64,
}

impl SessionClaims {
    pub fn new(user_id: i32, email: String, issued_at: u64, expires_at: u64) -> Self {
        Self {
            sub: user_id.to_string(),
            email,
            iat: issued_at,
            exp: expires_at,
        }
    }

    /// Parse the subject back into a user id
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}
