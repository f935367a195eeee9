//! HTTP handlers for the webhook gateway

pub mod health;
pub mod invoke;
pub mod webhook;

pub use health::*;
pub use invoke::*;
pub use webhook::*;
