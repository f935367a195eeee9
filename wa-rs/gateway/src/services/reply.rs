//! Outbound replies through the WhatsApp Cloud API
//!
//! A reply is a single `POST /{version}/{phone_number_id}/messages`. Failures
//! are reported as [`ReplyOutcome::Failed`] and never turned into errors; the
//! webhook acknowledgment must not depend on them.

use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use std::time::Instant;
use tracing::debug;

use crate::config::REDACTED;
use crate::config::WhatsAppConfig;
use crate::error::GatewayError;
use crate::error::GatewayResult;
use crate::types::APPLICATION_JSON;
use crate::types::OutboundReply;

/// Longest slice of an error body kept in a failure reason
const MAX_ERROR_BODY: usize = 512;

/// Wire shape of a text message send
#[derive(Debug, Serialize)]
struct SendTextRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

impl<'a> From<&'a OutboundReply> for SendTextRequest<'a> {
    fn from(reply: &'a OutboundReply) -> Self {
        Self {
            messaging_product: "whatsapp",
            to: &reply.to,
            kind: "text",
            text: TextBody { body: &reply.body },
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendTextResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

/// Result of one send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The platform accepted the message
    Sent {
        status: u16,
        /// Platform message id, when the response carried one
        message_id: Option<String>,
    },
    /// Network error, timeout or non-2xx status
    Failed { reason: String },
}

/// Client for the messages endpoint.
///
/// Holds a pooled `reqwest::Client`; clone freely.
#[derive(Clone)]
pub struct ReplySender {
    client: reqwest::Client,
    messages_url: String,
    access_token: String,
}

impl fmt::Debug for ReplySender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplySender")
            .field("messages_url", &self.messages_url)
            .field("access_token", &REDACTED)
            .finish_non_exhaustive()
    }
}

impl ReplySender {
    /// Build a sender from the WhatsApp settings.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` when the access token or phone number id
    /// is missing, or when the HTTP client cannot be built.
    pub fn new(whatsapp: &WhatsAppConfig, timeout: Duration) -> GatewayResult<Self> {
        let access_token = whatsapp
            .access_token
            .clone()
            .ok_or_else(|| GatewayError::Config("ACCESS_TOKEN is not set".to_string()))?;
        let messages_url = whatsapp
            .messages_url()
            .ok_or_else(|| GatewayError::Config("PHONE_NUMBER_ID is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wa-webhook-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            messages_url,
            access_token,
        })
    }

    /// Endpoint replies are posted to
    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }

    /// Send one text message. Never fails; inspect the outcome instead.
    pub async fn send_reply(&self, reply: &OutboundReply) -> ReplyOutcome {
        let started = Instant::now();
        let payload = SendTextRequest::from(reply);

        let response = match self
            .client
            .post(&self.messages_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let kind = if e.is_timeout() { "timed out" } else { "failed" };
                return ReplyOutcome::Failed {
                    reason: format!("request {kind}: {e}"),
                };
            }
        };

        let status = response.status();
        debug!(
            "Reply POST answered {} in {}ms",
            status,
            started.elapsed().as_millis()
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return ReplyOutcome::Failed {
                reason: format!("HTTP {}: {}", status.as_u16(), truncate(&body, MAX_ERROR_BODY)),
            };
        }

        // A 2xx without the expected body still means the message was accepted
        let message_id = response
            .json::<SendTextResponse>()
            .await
            .ok()
            .and_then(|body| body.messages.into_iter().next())
            .map(|message| message.id);

        ReplyOutcome::Sent {
            status: status.as_u16(),
            message_id,
        }
    }
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
