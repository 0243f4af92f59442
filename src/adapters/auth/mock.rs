//! In-process [`SessionValidator`] for handler and router tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Token table built up front; unknown tokens are `InvalidToken`.
///
/// ```ignore
/// let validator = MockSessionValidator::new()
///     .with_test_user("alice-token", "alice");
/// ```
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    sessions: HashMap<String, AuthenticatedUser>,
    outage: Option<AuthError>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.sessions.insert(token.into(), user);
        self
    }

    /// Registers `user_id` as `<user_id>@test.example.com`.
    pub fn with_test_user(self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let email = format!("{}@test.example.com", user_id);
        let id = UserId::new(user_id).expect("test user id must be non-empty");
        self.with_user(token, AuthenticatedUser::new(id, email, None))
    }

    /// Every lookup fails with `error`, whatever the token.
    pub fn with_error(mut self, error: AuthError) -> Self {
        self.outage = Some(error);
        self
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = &self.outage {
            return Err(error.clone());
        }
        self.sessions
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
