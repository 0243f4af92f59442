//! Return URL base for vendor checkouts.
//!
//! The browser comes back to whatever host it left from, so the base is
//! taken from the request rather than from configuration. Tunnels and
//! proxies change that host between deploys; the configured app URL is
//! only used when the request looks local or carries no origin at all.

use axum::http::HeaderMap;

use crate::domain::billing::BillingError;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim())
        .filter(|v| !v.is_empty() && *v != "null")
}

fn is_local(origin: &str) -> bool {
    let authority = origin
        .split_once("://")
        .map_or(origin, |(_, rest)| rest)
        .split('/')
        .next()
        .unwrap_or_default();
    if authority.starts_with("[::1]") {
        return true;
    }
    let host = authority.split(':').next().unwrap_or_default();
    matches!(host, "localhost" | "127.0.0.1" | "0.0.0.0") || host.ends_with(".localhost")
}

/// Origin of the request: `Origin`, else the forwarded or direct host.
pub fn request_origin(headers: &HeaderMap) -> Option<String> {
    if let Some(origin) = header(headers, "origin") {
        return Some(origin.trim_end_matches('/').to_string());
    }

    let host = header(headers, "x-forwarded-host").or_else(|| header(headers, "host"))?;
    let proto = header(headers, "x-forwarded-proto").unwrap_or(if is_local(host) {
        "http"
    } else {
        "https"
    });
    Some(format!("{}://{}", proto, host))
}

/// Base URL the vendor should send the browser back to.
pub fn return_base_url(headers: &HeaderMap, app_url: Option<&str>) -> Result<String, BillingError> {
    let app_url = app_url.map(|u| u.trim_end_matches('/').to_string());

    match (request_origin(headers), app_url) {
        (Some(origin), Some(app_url)) if is_local(&origin) => Ok(app_url),
        (Some(origin), _) => Ok(origin),
        (None, Some(app_url)) => Ok(app_url),
        (None, None) => Err(BillingError::validation(
            "origin",
            "Cannot determine the return URL: no Origin or Host header and no app URL configured",
        )),
    }
}
