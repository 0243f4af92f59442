//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid host address: {0}")]
    InvalidHost(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid application URL: {0}")]
    InvalidAppUrl(String),

    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Supabase JWT secret is too short (minimum 32 bytes)")]
    JwtSecretTooShort,

    #[error("Invalid webhook secret format (expected whsec_ prefix)")]
    InvalidWebhookSecret,

    #[error("Invalid product mapping key: {0}")]
    InvalidProductKey(String),

    #[error("Invalid checkout timeout")]
    InvalidCheckoutTimeout,

    #[error("No enhancement provider configured")]
    NoEnhancementProviderConfigured,
}
