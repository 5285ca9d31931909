/**
 * Session Management and JWT Tokens
 *
 * This module handles JWT token generation and validation for user sessions.
 * Tokens are HS256-signed with the configured secret; `sub` carries the
 * numeric user id.
 */

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Email
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// Numeric user id carried in `sub`
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Signing secret and token lifetime
#[derive(Clone)]
pub struct JwtSettings {
    secret: String,
    ttl_hours: i64,
}

impl JwtSettings {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_hours,
        }
    }

    pub fn ttl_hours(&self) -> i64 {
        self.ttl_hours
    }

    /// Create a JWT token for a user
    ///
    /// # Arguments
    /// * `user_id` - User ID
    /// * `email` - User email
    ///
    /// # Returns
    /// JWT token string
    pub fn create_token(
        &self,
        user_id: i64,
        email: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (now + Duration::hours(self.ttl_hours)).timestamp(),
            iat: now.timestamp(),
        };

        let key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), &claims, &key)
    }

    /// Verify and decode a JWT token
    ///
    /// Rejects tokens with a bad signature, a different algorithm or an
    /// expired `exp`.
    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let token_data = decode::<Claims>(token, &key, &Validation::default())?;
        Ok(token_data.claims)
    }
}

// Keep the secret out of logs.
impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JwtSettings {
        JwtSettings::new("test-secret", 24)
    }

    #[test]
    fn test_create_and_verify_token() {
        let jwt = settings();
        let token = jwt.create_token(42, "test@example.com").unwrap();
        assert!(!token.is_empty());

        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let token = settings().create_token(1, "a@example.com").unwrap();
        let other = JwtSettings::new("another-secret", 24);
        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn test_verify_expired_token() {
        // Past the default 60s leeway.
        let jwt = JwtSettings::new("test-secret", -1);
        let token = jwt.create_token(1, "a@example.com").unwrap();
        assert!(jwt.verify_token(&token).is_err());
    }

    #[test]
    fn test_verify_garbage() {
        assert!(settings().verify_token("not-a-jwt").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let printed = format!("{:?}", settings());
        assert!(!printed.contains("test-secret"));
    }
}
