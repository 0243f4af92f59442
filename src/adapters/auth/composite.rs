//! Routes a credential to the validator that understands its shape.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

/// JWTs (three dot separated segments) go to the Supabase validator,
/// anything else is treated as an application session token.
pub struct CompositeSessionValidator {
    jwt: Arc<dyn SessionValidator>,
    session: Arc<dyn SessionValidator>,
}

impl CompositeSessionValidator {
    pub fn new(jwt: Arc<dyn SessionValidator>, session: Arc<dyn SessionValidator>) -> Self {
        Self { jwt, session }
    }
}

fn looks_like_jwt(token: &str) -> bool {
    let mut parts = token.split('.');
    let segments = parts.by_ref().take(4).filter(|p| !p.is_empty()).count();
    segments == 3 && token.matches('.').count() == 2
}

#[async_trait]
impl SessionValidator for CompositeSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        if looks_like_jwt(token) {
            self.jwt.validate(token).await
        } else {
            self.session.validate(token).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;

    fn composite() -> CompositeSessionValidator {
        CompositeSessionValidator::new(
            Arc::new(MockSessionValidator::new().with_test_user("aaa.bbb.ccc", "jwt-user")),
            Arc::new(MockSessionValidator::new().with_test_user("opaque-session", "cookie-user")),
        )
    }

    #[test]
    fn jwt_shape_detection() {
        assert!(looks_like_jwt("aaa.bbb.ccc"));
        assert!(!looks_like_jwt("aaa.bbb"));
        assert!(!looks_like_jwt("aaa..ccc"));
        assert!(!looks_like_jwt("a.b.c.d"));
        assert!(!looks_like_jwt("opaque-session"));
    }

    #[tokio::test]
    async fn routes_jwt_to_jwt_validator() {
        let user = composite().validate("aaa.bbb.ccc").await.unwrap();
        assert_eq!(user.id.as_str(), "jwt-user");
    }

    #[tokio::test]
    async fn routes_opaque_token_to_session_validator() {
        let user = composite().validate("opaque-session").await.unwrap();
        assert_eq!(user.id.as_str(), "cookie-user");
    }

    #[tokio::test]
    async fn empty_token_is_invalid() {
        assert!(matches!(
            composite().validate("  ").await,
            Err(AuthError::InvalidToken)
        ));
    }
}
