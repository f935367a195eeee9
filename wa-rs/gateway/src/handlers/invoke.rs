//! Proxy event handler
//!
//! Lets a serverless gateway forward its raw proxy event instead of a plain
//! HTTP call. The event is read as JSON whatever its `Content-Type`. Any
//! readable event gets an outer 200 with the dispatcher's status in
//! `statusCode`; an unreadable event is an outer 400.

use crate::error::GatewayError;
use crate::error::GatewayResult;
use crate::services::gateway_event::GatewayEvent;
use crate::services::gateway_event::GatewayResponse;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;

/// Proxy event endpoint
pub async fn handle_invoke(
    State(state): State<AppState>,
    body: Bytes,
) -> GatewayResult<Json<GatewayResponse>> {
    let event: GatewayEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Unreadable proxy event: {}", e);
        GatewayError::InvalidJson(e)
    })?;
    tracing::debug!("Proxy event received for method {:?}", event.method());

    let request = event.into_inbound_request();
    let response = state.dispatcher.handle(&request).await;

    Ok(Json(GatewayResponse::from(response)))
}
