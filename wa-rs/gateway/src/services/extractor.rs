//! Payload extractor for WhatsApp webhook envelopes
//!
//! Walks `entry[] -> changes[] -> value -> messages[]` and turns each message
//! into an [`InboundMessage`]. Missing or wrongly typed levels are treated as
//! empty branches, never as errors. Nothing here logs or performs I/O; the
//! dispatcher decides what to do with the result.

use serde_json::Value;

use crate::types::InboundMessage;
use crate::types::MessageContent;
use crate::types::MessagePosition;
use crate::types::SkippedMessage;
use crate::types::StatusUpdate;

/// Top-level key that marks an encrypted Flows payload
pub const FLOW_DATA_KEY: &str = "encrypted_flow_data";

pub const DEFAULT_CAPTION: &str = "No caption";
pub const DEFAULT_FILENAME: &str = "Unnamed";
pub const DEFAULT_MIME_TYPE: &str = "Unknown";

/// Shape of a decoded POST body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    /// Encrypted Flows data; acknowledged without extraction
    FlowData,
    /// No `entry` array or an empty one
    NoEntries,
    /// At least one entry to walk
    Changes,
}

/// Everything pulled out of one envelope, in envelope order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub messages: Vec<InboundMessage>,
    pub skipped: Vec<SkippedMessage>,
    pub statuses: Vec<StatusUpdate>,
}

/// Classify a decoded body before extraction
pub fn classify(envelope: &Value) -> EnvelopeKind {
    if envelope.get(FLOW_DATA_KEY).is_some() {
        return EnvelopeKind::FlowData;
    }

    match envelope.get("entry").and_then(Value::as_array) {
        Some(entries) if !entries.is_empty() => EnvelopeKind::Changes,
        _ => EnvelopeKind::NoEntries,
    }
}

/// Extract messages and status updates from an envelope
pub fn extract(envelope: &Value) -> Extraction {
    let mut extraction = Extraction::default();

    for (entry_index, entry) in array_at(envelope, "entry").iter().enumerate() {
        for (change_index, change) in array_at(entry, "changes").iter().enumerate() {
            let Some(value) = change.get("value").filter(|v| v.is_object()) else {
                continue;
            };

            for status in array_at(value, "statuses") {
                if let Some(update) = parse_status(status) {
                    extraction.statuses.push(update);
                }
            }

            let contacts = array_at(value, "contacts");
            for (message_index, message) in array_at(value, "messages").iter().enumerate() {
                let position = MessagePosition {
                    entry: entry_index,
                    change: change_index,
                    message: message_index,
                };
                match parse_message(message, contacts) {
                    Ok(parsed) => extraction.messages.push(parsed),
                    Err(reason) => extraction.skipped.push(SkippedMessage { position, reason }),
                }
            }
        }
    }

    extraction
}

fn array_at<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn str_at<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn parse_message(message: &Value, contacts: &[Value]) -> Result<InboundMessage, String> {
    if !message.is_object() {
        return Err("message is not an object".to_string());
    }

    let from = str_at(message, "from")
        .filter(|from| !from.is_empty())
        .ok_or_else(|| "missing sender (`from`)".to_string())?;

    let content = match str_at(message, "type") {
        Some("text") => {
            let body = message
                .get("text")
                .and_then(|text| str_at(text, "body"))
                .ok_or_else(|| "text message without `text.body`".to_string())?;
            MessageContent::Text {
                body: body.to_string(),
            }
        }
        Some("image") => {
            let image = message.get("image");
            let id = image
                .and_then(|image| str_at(image, "id"))
                .ok_or_else(|| "image message without `image.id`".to_string())?;
            MessageContent::Image {
                id: id.to_string(),
                caption: image
                    .and_then(|image| str_at(image, "caption"))
                    .unwrap_or(DEFAULT_CAPTION)
                    .to_string(),
            }
        }
        Some("document") => {
            let document = message.get("document");
            MessageContent::Document {
                filename: document
                    .and_then(|document| str_at(document, "filename"))
                    .unwrap_or(DEFAULT_FILENAME)
                    .to_string(),
                mime_type: document
                    .and_then(|document| str_at(document, "mime_type"))
                    .unwrap_or(DEFAULT_MIME_TYPE)
                    .to_string(),
            }
        }
        other => MessageContent::Other {
            kind: other.unwrap_or("unknown").to_string(),
            raw: message.clone(),
        },
    };

    let sender_name = contacts.iter().find_map(|contact| {
        if str_at(contact, "wa_id") == Some(from) {
            contact
                .get("profile")
                .and_then(|profile| str_at(profile, "name"))
                .map(str::to_string)
        } else {
            None
        }
    });

    Ok(InboundMessage {
        from: from.to_string(),
        id: str_at(message, "id").map(str::to_string),
        timestamp: str_at(message, "timestamp").map(str::to_string),
        sender_name,
        content,
    })
}

fn parse_status(status: &Value) -> Option<StatusUpdate> {
    Some(StatusUpdate {
        message_id: str_at(status, "id")?.to_string(),
        status: str_at(status, "status").unwrap_or("unknown").to_string(),
        recipient_id: str_at(status, "recipient_id")
            .unwrap_or_default()
            .to_string(),
        timestamp: str_at(status, "timestamp").map(str::to_string),
    })
}
