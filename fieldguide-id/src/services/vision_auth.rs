//! Signed tokens for the remote vision service
//!
//! Each scoring request carries a short-lived HS512 JWT identifying the
//! application, signed with the configured vision secret.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

/// Application name embedded in every token
pub const APPLICATION: &str = "fieldguide";

/// Token lifetime in minutes
pub const TOKEN_EXPIRY_MINS: i64 = 5;

/// Claims carried by a vision token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionClaims {
    pub application: String,
    /// Expiration time (UTC Unix timestamp)
    pub exp: i64,
}

/// Mints vision tokens
#[derive(Clone)]
pub struct VisionAuth {
    secret: String,
}

impl VisionAuth {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Fresh token valid for `TOKEN_EXPIRY_MINS`
    pub fn token(&self) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = VisionClaims {
            application: APPLICATION.to_string(),
            exp: (Utc::now() + Duration::minutes(TOKEN_EXPIRY_MINS)).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }
}

impl std::fmt::Debug for VisionAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionAuth").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn test_token_round_trip() {
        let auth = VisionAuth::new("test-secret");
        let token = auth.token().unwrap();

        let data = decode::<VisionClaims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::new(Algorithm::HS512),
        )
        .unwrap();

        assert_eq!(data.claims.application, APPLICATION);
        let remaining = data.claims.exp - Utc::now().timestamp();
        assert!(remaining > 0 && remaining <= TOKEN_EXPIRY_MINS * 60);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = VisionAuth::new("one").token().unwrap();
        let result = decode::<VisionClaims>(
            &token,
            &DecodingKey::from_secret(b"two"),
            &Validation::new(Algorithm::HS512),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", VisionAuth::new("hunter2"));
        assert!(!debug.contains("hunter2"));
    }
}
