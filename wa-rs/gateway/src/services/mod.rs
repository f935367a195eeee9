//! Webhook processing services

pub mod dispatcher;
pub mod extractor;
pub mod gateway_event;
pub mod reply;

pub use dispatcher::Dispatcher;
pub use reply::ReplyOutcome;
pub use reply::ReplySender;
