//! Router configuration for the webhook gateway

use crate::handlers::health::health_check;
use crate::handlers::invoke::handle_invoke;
use crate::handlers::webhook::handle_webhook;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::any;
use axum::routing::get;
use axum::routing::post;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the main application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let request_timeout = state.config().timeouts.request_timeout;
    let webhook_limit = state.config().body_limits.webhook_limit();

    // Webhook routes read the raw body, so axum's 2MB default is replaced
    // by the configured limit
    let webhook_routes = Router::new()
        .route("/webhook", any(handle_webhook))
        .route("/invoke", post(handle_invoke))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(webhook_limit));

    let app = Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .merge(webhook_routes)
        .layer(TraceLayer::new_for_http()) // Request tracing
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .with_state(state);

    info!(
        "Router created with webhook body limit {}KB and request timeout {}s",
        webhook_limit / 1024,
        request_timeout.as_secs()
    );
    app
}
