//! Error types for the webhook gateway

use axum::http::StatusCode;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

/// Errors that can occur in the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Handshake mode or token did not match
    #[error("Invalid verification token")]
    VerificationFailed,

    /// POST body was not valid JSON
    #[error("Invalid JSON")]
    InvalidJson(#[source] serde_json::Error),

    /// POST body could not be base64- or UTF-8-decoded
    #[error("Invalid body encoding")]
    InvalidEncoding(String),

    /// Anything other than GET or POST
    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),

    /// Server start errors
    #[error("Server start error: {0}")]
    ServerStart(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors from anyhow
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::VerificationFailed => StatusCode::FORBIDDEN,
            GatewayError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            GatewayError::InvalidEncoding(_) => StatusCode::BAD_REQUEST,
            GatewayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::ServerStart(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Generic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body sent to the caller
    pub fn body(&self) -> Value {
        json!({
            "error": self.to_string(),
            "status": self.status_code().as_u16()
        })
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        (self.status_code(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::VerificationFailed.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GatewayError::MethodNotAllowed("PUT".to_string()).status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            GatewayError::InvalidEncoding("bad base64".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Config("missing".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_json_body_shape() {
        let parse_error = serde_json::from_str::<Value>("{not json").unwrap_err();
        let error = GatewayError::InvalidJson(parse_error);
        assert_eq!(
            error.body(),
            json!({ "error": "Invalid JSON", "status": 400 })
        );
    }

    #[test]
    fn test_method_not_allowed_names_method() {
        let error = GatewayError::MethodNotAllowed("DELETE".to_string());
        assert_eq!(error.body()["error"], "Method DELETE not allowed");
    }

    #[test]
    fn test_into_response_uses_status() {
        let response = GatewayError::VerificationFailed.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
