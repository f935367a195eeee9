//! Request, response and message types shared by the handlers and services

use axum::body::Body;
use axum::body::Bytes;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::error::GatewayError;

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";

/// Transport-independent view of an inbound webhook call
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// HTTP method as received, e.g. `GET`
    pub method: String,
    /// Decoded query string parameters
    pub query: HashMap<String, String>,
    /// Raw request body
    pub body: Bytes,
    /// Body is base64 text wrapping the real payload
    pub is_base64_encoded: bool,
}

impl InboundRequest {
    /// Query parameter value, empty when absent
    pub fn query_param(&self, name: &str) -> &str {
        self.query.get(name).map(String::as_str).unwrap_or_default()
    }
}

/// Response produced by the dispatcher before it is bound to a transport
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl WebhookResponse {
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: TEXT_PLAIN,
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, body: &Value) -> Self {
        Self {
            status,
            content_type: APPLICATION_JSON,
            body: body.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn json_body(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

impl From<GatewayError> for WebhookResponse {
    fn from(error: GatewayError) -> Self {
        WebhookResponse::json(error.status_code(), &error.body())
    }
}

impl IntoResponse for WebhookResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(self.content_type));
        response
    }
}

/// Kind-specific content of an inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text {
        body: String,
    },
    Image {
        id: String,
        caption: String,
    },
    Document {
        filename: String,
        mime_type: String,
    },
    /// Any other `type`; the raw message is kept for logging
    Other {
        kind: String,
        raw: Value,
    },
}

impl MessageContent {
    /// The vendor `type` string
    pub fn kind(&self) -> &str {
        match self {
            MessageContent::Text { .. } => "text",
            MessageContent::Image { .. } => "image",
            MessageContent::Document { .. } => "document",
            MessageContent::Other { kind, .. } => kind.as_str(),
        }
    }
}

/// One element of `value.messages`
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Sender identifier (`wa_id`)
    pub from: String,
    pub id: Option<String>,
    /// Unix seconds as sent by the platform
    pub timestamp: Option<String>,
    /// Profile name from the matching `contacts` entry
    pub sender_name: Option<String>,
    pub content: MessageContent,
}

impl InboundMessage {
    /// Body of a text message, `None` for every other kind
    pub fn text_body(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text { body } => Some(body),
            _ => None,
        }
    }

    /// Parsed send time, when the timestamp is a valid unix value
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        let seconds = self.timestamp.as_deref()?.parse::<i64>().ok()?;
        DateTime::from_timestamp(seconds, 0)
    }
}

/// Delivery status notification from `value.statuses`
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub message_id: String,
    pub status: String,
    pub recipient_id: String,
    pub timestamp: Option<String>,
}

/// Where a message sits inside the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessagePosition {
    pub entry: usize,
    pub change: usize,
    pub message: usize,
}

impl fmt::Display for MessagePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entry[{}].changes[{}].messages[{}]",
            self.entry, self.change, self.message
        )
    }
}

/// A message that could not be extracted
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedMessage {
    pub position: MessagePosition,
    pub reason: String,
}

/// Outbound text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    pub to: String,
    pub body: String,
}

/// Counters returned in the processing acknowledgment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingSummary {
    pub messages: usize,
    pub skipped: usize,
    pub statuses: usize,
    pub replies_sent: usize,
    pub replies_failed: usize,
}
