//! Authentication test helpers

use roomchat::backend::auth::sessions::JwtSettings;

use super::TEST_SECRET;

/// A token the test router accepts
pub fn token_for(user_id: i64, email: &str) -> String {
    JwtSettings::new(TEST_SECRET, 1)
        .create_token(user_id, email)
        .expect("Failed to create test token")
}

/// A well-formed token signed with a different secret
pub fn foreign_token(user_id: i64) -> String {
    JwtSettings::new("some-other-secret", 1)
        .create_token(user_id, "intruder@example.com")
        .expect("Failed to create test token")
}
