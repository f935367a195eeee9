//! Serverless gateway proxy events
//!
//! Function gateways wrap the HTTP call in a JSON event. Two shapes exist:
//! the REST flavour carries `httpMethod`, the function-URL/HTTP-API flavour
//! carries `requestContext.http.method`. Both carry `queryStringParameters`,
//! `body` and `isBase64Encoded`.

use axum::body::Bytes;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::types::InboundRequest;
use crate::types::WebhookResponse;

/// Body assumed when the event carries none
const EMPTY_BODY: &str = "{}";

/// Inbound proxy event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEvent {
    pub http_method: Option<String>,
    pub request_context: Option<RequestContext>,
    pub query_string_parameters: Option<HashMap<String, String>>,
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestContext {
    pub http: Option<HttpContext>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpContext {
    pub method: Option<String>,
}

impl GatewayEvent {
    /// Method of the wrapped call; `requestContext.http.method` wins over `httpMethod`
    pub fn method(&self) -> &str {
        self.request_context
            .as_ref()
            .and_then(|context| context.http.as_ref())
            .and_then(|http| http.method.as_deref())
            .or(self.http_method.as_deref())
            .unwrap_or_default()
    }

    pub fn into_inbound_request(self) -> InboundRequest {
        let method = self.method().to_string();
        InboundRequest {
            method,
            query: self.query_string_parameters.unwrap_or_default(),
            body: Bytes::from(self.body.unwrap_or_else(|| EMPTY_BODY.to_string())),
            is_base64_encoded: self.is_base64_encoded,
        }
    }
}

/// Proxy response handed back to the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl From<WebhookResponse> for GatewayResponse {
    fn from(response: WebhookResponse) -> Self {
        let headers = BTreeMap::from([(
            "Content-Type".to_string(),
            response.content_type.to_string(),
        )]);
        Self {
            status_code: response.status.as_u16(),
            headers,
            body: response.body,
            is_base64_encoded: false,
        }
    }
}
