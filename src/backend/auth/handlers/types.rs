/**
 * Authentication Handler Types
 *
 * This module defines the request and response types used by authentication handlers.
 * Responses are wrapped in `ApiResponse` by the handlers.
 */

use serde::{Deserialize, Serialize};

use crate::shared::SharedError;

/// Sign up request
#[derive(Deserialize, Serialize, Debug)]
pub struct SignupRequest {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// User's email address
    #[serde(default)]
    pub email: String,
    /// User's password (will be hashed before storage)
    #[serde(default)]
    pub password: String,
}

impl SignupRequest {
    /// Reject blank fields
    pub fn validate(&self) -> Result<(), SharedError> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(SharedError::validation(field, format!("{} is required", field)));
            }
        }
        Ok(())
    }
}

/// Login request
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Returned by signup
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignupResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
}

/// Returned by login
///
/// `token` is an HS256 JWT valid for the configured number of hours.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
    pub name: String,
}

/// Returned by `GET /user/me`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MeResponse {
    pub email: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_validation() {
        let request = SignupRequest {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "   ".to_string(),
        };
        match request.validate() {
            Err(SharedError::ValidationError { field, message }) => {
                assert_eq!(field, "password");
                assert_eq!(message, "password is required");
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_signup_missing_fields_default_to_empty() {
        let request: SignupRequest = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert!(request.validate().is_err());
    }
}
