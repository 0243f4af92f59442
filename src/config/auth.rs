//! Authentication configuration

use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Caller authentication settings.
///
/// Supabase access tokens are HS256 JWTs signed with the project's JWT
/// secret. Application session tokens arrive in a cookie or as a bearer
/// token and are looked up in the `sessions` table.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Supabase project JWT secret
    pub supabase_jwt_secret: String,

    /// Expected `aud` claim
    #[serde(default = "default_audience")]
    pub jwt_audience: String,

    /// Name of the session cookie
    #[serde(default = "default_cookie_name")]
    pub session_cookie_name: String,

    /// Name of the cookie carrying a Supabase access token
    #[serde(default = "default_access_token_cookie")]
    pub access_token_cookie_name: String,
}

impl AuthConfig {
    /// Validate authentication configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.supabase_jwt_secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__SUPABASE_JWT_SECRET"));
        }
        if *environment == Environment::Production && self.supabase_jwt_secret.len() < 32 {
            return Err(ValidationError::JwtSecretTooShort);
        }
        if self.session_cookie_name.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__SESSION_COOKIE_NAME"));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            supabase_jwt_secret: String::new(),
            jwt_audience: default_audience(),
            session_cookie_name: default_cookie_name(),
            access_token_cookie_name: default_access_token_cookie(),
        }
    }
}

fn default_audience() -> String {
    "authenticated".to_string()
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_access_token_cookie() -> String {
    "sb-access-token".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.jwt_audience, "authenticated");
        assert_eq!(config.session_cookie_name, "session");
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let config = AuthConfig::default();
        assert!(config.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_short_secret_allowed_outside_production() {
        let config = AuthConfig {
            supabase_jwt_secret: "dev-secret".to_string(),
            ..Default::default()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert!(matches!(
            config.validate(&Environment::Production),
            Err(ValidationError::JwtSecretTooShort)
        ));
    }

    #[test]
    fn test_long_secret_passes_in_production() {
        let config = AuthConfig {
            supabase_jwt_secret: "x".repeat(40),
            ..Default::default()
        };
        assert!(config.validate(&Environment::Production).is_ok());
    }
}
