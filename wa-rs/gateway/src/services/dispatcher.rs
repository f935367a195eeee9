//! Webhook dispatcher
//!
//! Routes an [`InboundRequest`] by method:
//!
//! ```text
//! GET  -> verify handshake -> 200 challenge | 403
//! POST -> decode body -> classify -> extract -> reply to text messages -> 200 ack
//! *    -> 405
//! ```
//!
//! `handle` never fails. Every error becomes a structured response, and reply
//! failures only show up in the summary counters and the logs.

use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde_json::Value;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::error::GatewayResult;
use crate::services::extractor;
use crate::services::extractor::EnvelopeKind;
use crate::services::extractor::Extraction;
use crate::services::reply::ReplyOutcome;
use crate::services::reply::ReplySender;
use crate::types::InboundMessage;
use crate::types::InboundRequest;
use crate::types::MessageContent;
use crate::types::OutboundReply;
use crate::types::ProcessingSummary;
use crate::types::WebhookResponse;

/// `hub.mode` value the platform sends when subscribing
pub const SUBSCRIBE_MODE: &str = "subscribe";

/// Single entry point for webhook calls
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: Arc<GatewayConfig>,
    reply_sender: Option<ReplySender>,
}

impl Dispatcher {
    /// Build a dispatcher.
    ///
    /// The reply sender is only created when auto-reply is enabled and both
    /// credentials are present; otherwise text messages are logged only.
    pub fn new(config: Arc<GatewayConfig>) -> GatewayResult<Self> {
        let reply_sender = if !config.pipeline.auto_reply_enabled {
            info!("Auto-reply disabled by configuration");
            None
        } else if !config.whatsapp.has_reply_credentials() {
            warn!("Auto-reply disabled (missing ACCESS_TOKEN or PHONE_NUMBER_ID)");
            None
        } else {
            let sender = ReplySender::new(&config.whatsapp, config.timeouts.reply_timeout)?;
            info!("Auto-reply enabled, posting to {}", sender.messages_url());
            Some(sender)
        };

        Ok(Self {
            config,
            reply_sender,
        })
    }

    /// Whether text messages will be answered
    pub fn auto_reply_active(&self) -> bool {
        self.reply_sender.is_some()
    }

    /// Handle one webhook call
    pub async fn handle(&self, request: &InboundRequest) -> WebhookResponse {
        debug!(
            "Webhook {} with {} query params, {} body bytes (base64: {})",
            request.method,
            request.query.len(),
            request.body.len(),
            request.is_base64_encoded
        );

        let result = match request.method.as_str() {
            "GET" => self
                .verify(request)
                .map(|challenge| WebhookResponse::text(StatusCode::OK, challenge)),
            "POST" => self.process(request).await,
            other => {
                warn!("Unsupported HTTP method: {}", other);
                Err(GatewayError::MethodNotAllowed(other.to_string()))
            }
        };

        result.unwrap_or_else(WebhookResponse::from)
    }

    /// Check the subscription handshake and return the challenge to echo
    pub fn verify(&self, request: &InboundRequest) -> GatewayResult<String> {
        let mode = request.query_param("hub.mode");
        let token = request.query_param("hub.verify_token");
        let challenge = request.query_param("hub.challenge");

        debug!(
            "Verification params - mode: {}, token present: {}, challenge: {}",
            mode,
            !token.is_empty(),
            challenge
        );

        if mode == SUBSCRIBE_MODE && token == self.config.whatsapp.verify_token {
            info!("Webhook verification successful");
            Ok(challenge.to_string())
        } else {
            warn!("Webhook verification failed (mode: {:?})", mode);
            Err(GatewayError::VerificationFailed)
        }
    }

    async fn process(&self, request: &InboundRequest) -> GatewayResult<WebhookResponse> {
        let envelope = match decode_body(request) {
            Ok(envelope) => envelope,
            Err(e) if self.config.pipeline.strict_json => {
                warn!("Rejecting webhook body: {}", e);
                return Err(e);
            }
            Err(e) => {
                warn!("Acknowledging undecodable webhook body: {}", e);
                return Ok(acknowledge(json!({
                    "status": "ignored",
                    "reason": e.to_string()
                })));
            }
        };

        match extractor::classify(&envelope) {
            EnvelopeKind::FlowData => {
                info!("Received encrypted Flow data");
                return Ok(acknowledge(json!({ "status": "flow_data_received" })));
            }
            EnvelopeKind::NoEntries => {
                let keys: Vec<&str> = envelope
                    .as_object()
                    .map(|object| object.keys().map(String::as_str).collect())
                    .unwrap_or_default();
                info!("No entries found, available keys: {:?}", keys);
                return Ok(acknowledge(json!({ "status": "no_entries" })));
            }
            EnvelopeKind::Changes => {}
        }

        let summary = self.deliver(extractor::extract(&envelope)).await;
        info!(
            "Processed {} messages ({} skipped, {} statuses, {} replies sent, {} failed)",
            summary.messages,
            summary.skipped,
            summary.statuses,
            summary.replies_sent,
            summary.replies_failed
        );

        Ok(acknowledge(json!({
            "status": "success",
            "message": "Messages processed",
            "summary": summary,
            "timestamp": Utc::now().to_rfc3339()
        })))
    }

    async fn deliver(&self, extraction: Extraction) -> ProcessingSummary {
        let mut summary = ProcessingSummary {
            messages: extraction.messages.len(),
            skipped: extraction.skipped.len(),
            statuses: extraction.statuses.len(),
            ..Default::default()
        };

        for skipped in &extraction.skipped {
            warn!("Skipping message at {}: {}", skipped.position, skipped.reason);
        }

        for status in &extraction.statuses {
            info!(
                "Status update for {}: {} (recipient {})",
                status.message_id, status.status, status.recipient_id
            );
        }

        for message in &extraction.messages {
            log_message(message);

            let Some(text) = message.text_body() else {
                continue;
            };
            let Some(sender) = &self.reply_sender else {
                debug!("Auto-reply disabled, not answering {}", message.from);
                continue;
            };

            let reply = OutboundReply {
                to: message.from.clone(),
                body: self.config.pipeline.reply_template.render(text),
            };
            info!("Sending reply to {}", reply.to);

            match sender.send_reply(&reply).await {
                ReplyOutcome::Sent { status, message_id } => {
                    summary.replies_sent += 1;
                    info!(
                        "Reply to {} accepted with status {} (id: {})",
                        reply.to,
                        status,
                        message_id.as_deref().unwrap_or("unknown")
                    );
                }
                ReplyOutcome::Failed { reason } => {
                    summary.replies_failed += 1;
                    error!("Reply to {} failed: {}", reply.to, reason);
                }
            }
        }

        summary
    }
}

/// Decode a POST body into JSON, un-base64-ing it first when flagged
pub fn decode_body(request: &InboundRequest) -> GatewayResult<Value> {
    if request.is_base64_encoded {
        let decoded = BASE64
            .decode(request.body.trim_ascii())
            .map_err(|e| GatewayError::InvalidEncoding(format!("base64: {e}")))?;
        serde_json::from_slice(&decoded).map_err(GatewayError::InvalidJson)
    } else {
        serde_json::from_slice(&request.body).map_err(GatewayError::InvalidJson)
    }
}

fn acknowledge(body: Value) -> WebhookResponse {
    WebhookResponse::json(StatusCode::OK, &body)
}

fn log_message(message: &InboundMessage) {
    let sent_at = message
        .sent_at()
        .map(|time| time.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());
    info!(
        "Message {} from {} ({}) type {} sent at {}",
        message.id.as_deref().unwrap_or("unknown"),
        message.from,
        message.sender_name.as_deref().unwrap_or("no profile"),
        message.content.kind(),
        sent_at
    );

    match &message.content {
        MessageContent::Text { body } => info!("Text: '{}'", body),
        MessageContent::Image { id, caption } => {
            info!("Image id: {}, caption: '{}'", id, caption)
        }
        MessageContent::Document {
            filename,
            mime_type,
        } => info!("Document: {} ({})", filename, mime_type),
        MessageContent::Other { kind, raw } => {
            debug!("Unhandled {} message: {}", kind, raw)
        }
    }
}
