//! Top-level router: API areas, health check and the tower-http stack.

use std::time::Duration;

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
    HeaderName, HeaderValue, Method, StatusCode,
};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Json, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::credits::credit_routes;
use super::error::ErrorResponse;
use super::middleware::{auth_middleware, AuthState};
use super::payments::payment_routes;
use super::state::AppState;
use super::tasks::task_routes;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Transport settings for the router layers.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub request_timeout: Duration,
    /// Allowed browser origins; empty allows any origin without credentials.
    pub cors_origins: Vec<String>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

/// `/api/*` routes, authenticated by the auth middleware.
pub fn api_routes(state: AppState, auth: AuthState) -> Router {
    Router::new()
        .nest("/payments", payment_routes())
        .nest("/credits", credit_routes())
        .nest("/tasks", task_routes())
        .layer(middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state)
}

/// The complete application router.
pub fn app_router(state: AppState, auth: AuthState, options: &RouterOptions) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/api", api_routes(state, auth))
        .route("/health", get(health_check))
        .fallback(not_found)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(cors_layer(&options.cors_origins))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, COOKIE]);

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(allowed).allow_credentials(true)
    }
}

/// GET /health - Liveness probe
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn not_found() -> impl IntoResponse {
    ErrorResponse::new("NOT_FOUND", "No such route").into_response_with(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::http::test_support::test_state;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let auth = AuthState::new(Arc::new(MockSessionValidator::new()), vec![]);
        app_router(test_state(), auth, &RouterOptions::default())
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let response = app()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_requires_authentication() {
        let response = app()
            .oneshot(
                Request::get("/api/credits/balance")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn invalid_cors_origins_are_skipped() {
        let _ = cors_layer(&["https://sharpii.ai".to_string(), "bad\norigin".to_string()]);
    }
}
