//! WhatsApp Webhook Gateway - receives Cloud API webhooks and answers them
//!
//! Verifies the subscription handshake, extracts messages from event
//! envelopes and, when configured, replies to text messages through the
//! Graph API.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod services;
pub mod state;
pub mod types;

pub use config::GatewayConfig;
pub use config::PipelineConfig;
pub use config::WhatsAppConfig;
pub use error::GatewayError;
pub use error::GatewayResult;
pub use handlers::*;
pub use services::Dispatcher;
pub use state::AppState;
pub use types::InboundRequest;
pub use types::WebhookResponse;
