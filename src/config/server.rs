//! HTTP listener and browser-facing settings.

use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use super::error::ValidationError;

const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub environment: Environment,

    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whole-request deadline. Must cover the vendor checkout timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Comma-separated browser origins allowed to call the API with
    /// credentials. Unset means any origin, without credentials.
    pub cors_origins: Option<String>,

    /// Public URL of the web app, e.g. `https://sharpii.ai`.
    ///
    /// Checkout return URLs fall back to it when the caller's origin is
    /// local or missing, and it is always an allowed CORS origin.
    pub app_url: Option<String>,
}

/// Deployment stage.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let host = self.host.trim();
        // Bare IPv6 literals need brackets before the port.
        let authority = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, self.port)
        } else {
            format!("{}:{}", host, self.port)
        };
        authority
            .parse()
            .map_err(|_| ValidationError::InvalidHost(self.host.clone()))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// App URL without a trailing slash, `None` when blank.
    pub fn app_url(&self) -> Option<&str> {
        self.app_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    /// Allowed CORS origins, normalized and deduplicated.
    ///
    /// The app URL's origin is added whenever an explicit list is given,
    /// so the web app keeps working when the list is edited.
    pub fn cors_origins_list(&self) -> Vec<String> {
        let mut origins: Vec<String> = Vec::new();
        let configured = self
            .cors_origins
            .iter()
            .flat_map(|list| list.split(','))
            .map(normalize_origin)
            .filter(|origin| !origin.is_empty());

        for origin in configured {
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        }

        if !origins.is_empty() {
            if let Some(app_origin) = self.app_url().map(origin_of) {
                if !origins.contains(&app_origin) {
                    origins.push(app_origin);
                }
            }
        }
        origins
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ValidationError::InvalidTimeout);
        }
        if let Some(url) = self.app_url() {
            if !is_http_url(url) {
                return Err(ValidationError::InvalidAppUrl(url.to_string()));
            }
        }
        if let Some(origin) = self
            .cors_origins_list()
            .into_iter()
            .find(|origin| !is_http_url(origin))
        {
            return Err(ValidationError::InvalidCorsOrigin(origin));
        }
        self.socket_addr().map(|_| ())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            log_level: default_log_level(),
            request_timeout_secs: default_request_timeout(),
            cors_origins: None,
            app_url: None,
        }
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

fn normalize_origin(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_ascii_lowercase()
}

/// `scheme://host[:port]` of a URL, dropping any path.
fn origin_of(url: &str) -> String {
    let normalized = normalize_origin(url);
    match normalized.split_once("://") {
        Some((scheme, rest)) => {
            let authority = rest.split('/').next().unwrap_or(rest);
            format!("{}://{}", scheme, authority)
        }
        None => normalized,
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info,sharpii=debug,sqlx=warn".to_string()
}

fn default_request_timeout() -> u64 {
    30
}
