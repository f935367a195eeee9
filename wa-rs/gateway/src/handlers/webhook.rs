//! Webhook handler

use crate::state::AppState;
use crate::types::InboundRequest;
use crate::types::WebhookResponse;
use axum::body::Bytes;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::QueryRejection;
use axum::http::Method;
use std::collections::HashMap;

/// Webhook endpoint
///
/// Mounted for every method; the dispatcher decides what each one means.
///
/// ## Request
///
/// - `GET /webhook?hub.mode=subscribe&hub.verify_token=..&hub.challenge=..`
///   answers the subscription handshake.
/// - `POST /webhook` with the platform's JSON envelope delivers events.
///
/// ## Response
///
/// The challenge as `text/plain` on a successful handshake, otherwise a JSON
/// acknowledgment or error body.
pub async fn handle_webhook(
    State(state): State<AppState>,
    method: Method,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    body: Bytes,
) -> WebhookResponse {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::warn!("Unreadable query string: {}", rejection);
            HashMap::new()
        }
    };

    let request = InboundRequest {
        method: method.as_str().to_string(),
        query,
        body,
        is_base64_encoded: false,
    };

    state.dispatcher.handle(&request).await
}
