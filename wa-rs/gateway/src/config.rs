//! Configuration types for the webhook gateway
//!
//! All values are read once at startup and shared read-only afterwards.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Verify token used when `VERIFY_TOKEN` is unset. Insecure; startup warns about it.
pub const DEFAULT_VERIFY_TOKEN: &str = "undefined_token";

/// Graph API version used in the outbound messages URL
pub const DEFAULT_API_VERSION: &str = "v19.0";

/// Graph API host
pub const DEFAULT_GRAPH_API_BASE_URL: &str = "https://graph.facebook.com";

/// Body of the fixed welcome reply
pub const DEFAULT_WELCOME_TEXT: &str = "Welcome! \n\n\
Thanks for contacting us. How can we help you today?\n\n\
You can type:\n\
1. Show me the menu\n\
2. Track my order\n\
3. Speak to an agent";

pub(crate) const REDACTED: &str = "<redacted>";

/// Gateway configuration settings
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind the server to
    pub host: String,

    /// Port to bind the server to
    pub port: u16,

    /// Timeout configurations
    pub timeouts: TimeoutConfig,

    /// Request body size limits configuration
    pub body_limits: BodyLimitsConfig,

    /// WhatsApp Cloud API credentials and endpoint
    pub whatsapp: WhatsAppConfig,

    /// Switches that select the handler behaviour
    pub pipeline: PipelineConfig,
}

/// Timeout configuration
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Inbound request timeout duration
    pub request_timeout: Duration,

    /// Outbound reply call timeout duration
    pub reply_timeout: Duration,
}

/// Request body size limits configuration
#[derive(Debug, Clone)]
pub struct BodyLimitsConfig {
    /// Webhook specific body size limit in bytes
    pub webhook_limit: usize,

    /// Whether to enable body size limits (can be disabled for development)
    pub enabled: bool,
}

/// WhatsApp Cloud API settings.
///
/// `Debug` redacts both tokens.
#[derive(Clone)]
pub struct WhatsAppConfig {
    /// Shared secret for the subscription handshake
    pub verify_token: String,

    /// Bearer token for the Graph API
    pub access_token: Option<String>,

    /// Business phone number id that sends replies
    pub phone_number_id: Option<String>,

    /// Graph API version, e.g. `v19.0`
    pub api_version: String,

    /// Graph API base URL without a trailing path
    pub api_base_url: String,
}

/// Handler behaviour switches
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Reply to inbound text messages
    pub auto_reply_enabled: bool,

    /// Reject malformed POST bodies with 400 instead of acknowledging them
    pub strict_json: bool,

    /// How the reply body is computed
    pub reply_template: ReplyTemplate,
}

/// Reply body strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyTemplate {
    /// Quote the inbound text back to the sender
    Echo,
    /// Send the same fixed text to every sender
    Welcome(String),
}

impl ReplyTemplate {
    /// Compute the reply body for an inbound text
    pub fn render(&self, inbound_text: &str) -> String {
        match self {
            ReplyTemplate::Echo => format!("Thanks for your message: '{inbound_text}'"),
            ReplyTemplate::Welcome(text) => text.clone(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeouts: TimeoutConfig::default(),
            body_limits: BodyLimitsConfig::default(),
            whatsapp: WhatsAppConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            reply_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for BodyLimitsConfig {
    fn default() -> Self {
        Self {
            // Vendor batches are small; 10MB leaves room for gateway wrapping
            webhook_limit: 10 * 1024 * 1024,
            enabled: true,
        }
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            verify_token: DEFAULT_VERIFY_TOKEN.to_string(),
            access_token: None,
            phone_number_id: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            api_base_url: DEFAULT_GRAPH_API_BASE_URL.to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            auto_reply_enabled: true,
            strict_json: true,
            reply_template: ReplyTemplate::Echo,
        }
    }
}

impl fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("verify_token", &REDACTED)
            .field("access_token", &self.access_token.as_ref().map(|_| REDACTED))
            .field("phone_number_id", &self.phone_number_id)
            .field("api_version", &self.api_version)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl WhatsAppConfig {
    /// Both the access token and the phone number id are present
    pub fn has_reply_credentials(&self) -> bool {
        self.access_token.is_some() && self.phone_number_id.is_some()
    }

    /// True when the handshake secret was never overridden
    pub fn uses_default_verify_token(&self) -> bool {
        self.verify_token == DEFAULT_VERIFY_TOKEN
    }

    /// Outbound messages endpoint, if a phone number id is configured
    pub fn messages_url(&self) -> Option<String> {
        let phone_number_id = self.phone_number_id.as_deref()?;
        Some(format!(
            "{}/{}/{}/messages",
            self.api_base_url.trim_end_matches('/'),
            self.api_version,
            phone_number_id
        ))
    }
}

impl BodyLimitsConfig {
    /// Effective limit for the webhook routes
    pub fn webhook_limit(&self) -> usize {
        if self.enabled {
            self.webhook_limit
        } else {
            usize::MAX
        }
    }
}

impl GatewayConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create a config from an arbitrary variable source.
    ///
    /// Empty values count as unset. Values that fail to parse fall back to
    /// their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let host = lookup("GATEWAY_HOST").unwrap_or(defaults.host);
        // PORT is what serverless container platforms inject, so it wins
        let port_key = if lookup("PORT").is_some() {
            "PORT"
        } else {
            "GATEWAY_PORT"
        };
        let port = parse_var(&lookup, port_key, defaults.port);

        let timeouts = TimeoutConfig {
            request_timeout: Duration::from_secs(parse_var(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                defaults.timeouts.request_timeout.as_secs(),
            )),
            reply_timeout: Duration::from_secs(parse_var(
                &lookup,
                "REPLY_TIMEOUT_SECS",
                defaults.timeouts.reply_timeout.as_secs(),
            )),
        };

        let body_limits = BodyLimitsConfig {
            webhook_limit: parse_var(
                &lookup,
                "GATEWAY_BODY_LIMIT_WEBHOOK",
                defaults.body_limits.webhook_limit,
            ),
            enabled: parse_flag(
                &lookup,
                "GATEWAY_BODY_LIMITS_ENABLED",
                defaults.body_limits.enabled,
            ),
        };

        let whatsapp = WhatsAppConfig {
            verify_token: lookup("VERIFY_TOKEN").unwrap_or(defaults.whatsapp.verify_token),
            access_token: lookup("ACCESS_TOKEN"),
            phone_number_id: lookup("PHONE_NUMBER_ID"),
            api_version: lookup("API_VERSION").unwrap_or(defaults.whatsapp.api_version),
            api_base_url: lookup("GRAPH_API_BASE_URL").unwrap_or(defaults.whatsapp.api_base_url),
        };

        let reply_template = match lookup("REPLY_MODE").as_deref().map(str::trim) {
            None => defaults.pipeline.reply_template,
            Some(mode) if mode.eq_ignore_ascii_case("echo") => ReplyTemplate::Echo,
            Some(mode) if mode.eq_ignore_ascii_case("welcome") => ReplyTemplate::Welcome(
                lookup("REPLY_WELCOME_TEXT").unwrap_or_else(|| DEFAULT_WELCOME_TEXT.to_string()),
            ),
            Some(other) => {
                warn!("Invalid REPLY_MODE value: {}, using echo", other);
                ReplyTemplate::Echo
            }
        };

        let pipeline = PipelineConfig {
            auto_reply_enabled: parse_flag(
                &lookup,
                "AUTO_REPLY_ENABLED",
                defaults.pipeline.auto_reply_enabled,
            ),
            strict_json: parse_flag(&lookup, "STRICT_JSON", defaults.pipeline.strict_json),
            reply_template,
        };

        Self {
            host,
            port,
            timeouts,
            body_limits,
            whatsapp,
            pipeline,
        }
    }

    /// Get the full bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Auto-reply is switched on and has credentials to work with
    pub fn auto_reply_active(&self) -> bool {
        self.pipeline.auto_reply_enabled && self.whatsapp.has_reply_credentials()
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {} value: {}, using default", key, raw);
            default
        }),
        None => default,
    }
}

fn parse_flag<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!("Invalid {} value: {}, using default", key, raw);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> GatewayConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        GatewayConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.whatsapp.verify_token, DEFAULT_VERIFY_TOKEN);
        assert!(config.whatsapp.uses_default_verify_token());
        assert_eq!(config.whatsapp.api_version, "v19.0");
        assert!(config.pipeline.auto_reply_enabled);
        assert!(config.pipeline.strict_json);
        assert_eq!(config.pipeline.reply_template, ReplyTemplate::Echo);
        assert!(!config.auto_reply_active());
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = config_from(&[
            ("PORT", "3000"),
            ("GATEWAY_PORT", "4000"),
            ("VERIFY_TOKEN", "s3cret"),
            ("ACCESS_TOKEN", "EAAG-token"),
            ("PHONE_NUMBER_ID", "812378515295003"),
            ("API_VERSION", "v20.0"),
            ("STRICT_JSON", "false"),
            ("REQUEST_TIMEOUT_SECS", "60"),
            ("REPLY_TIMEOUT_SECS", "5"),
        ]);

        assert_eq!(config.port, 3000);
        assert_eq!(config.whatsapp.verify_token, "s3cret");
        assert!(!config.pipeline.strict_json);
        assert_eq!(config.timeouts.request_timeout, Duration::from_secs(60));
        assert_eq!(config.timeouts.reply_timeout, Duration::from_secs(5));
        assert!(config.auto_reply_active());
        assert_eq!(
            config.whatsapp.messages_url().as_deref(),
            Some("https://graph.facebook.com/v20.0/812378515295003/messages")
        );
    }

    #[test]
    fn test_gateway_port_used_when_port_missing() {
        let config = config_from(&[("GATEWAY_PORT", "4000")]);
        assert_eq!(config.port, 4000);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("AUTO_REPLY_ENABLED", "maybe"),
            ("REPLY_MODE", "shout"),
        ]);
        assert_eq!(config.port, 8080);
        assert!(config.pipeline.auto_reply_enabled);
        assert_eq!(config.pipeline.reply_template, ReplyTemplate::Echo);
    }

    #[test]
    fn test_empty_tokens_count_as_unset() {
        let config = config_from(&[("ACCESS_TOKEN", ""), ("PHONE_NUMBER_ID", "  ")]);
        assert!(config.whatsapp.access_token.is_none());
        assert!(config.whatsapp.phone_number_id.is_none());
        assert!(config.whatsapp.messages_url().is_none());
    }

    #[test]
    fn test_welcome_mode_uses_custom_text() {
        let config = config_from(&[("REPLY_MODE", "Welcome"), ("REPLY_WELCOME_TEXT", "Hi there")]);
        assert_eq!(
            config.pipeline.reply_template,
            ReplyTemplate::Welcome("Hi there".to_string())
        );
        assert_eq!(config.pipeline.reply_template.render("ignored"), "Hi there");
    }

    #[test]
    fn test_echo_template_quotes_text() {
        assert_eq!(
            ReplyTemplate::Echo.render("Hello, world!"),
            "Thanks for your message: 'Hello, world!'"
        );
    }

    #[test]
    fn test_messages_url_trims_trailing_slash() {
        let whatsapp = WhatsAppConfig {
            phone_number_id: Some("123".to_string()),
            api_base_url: "http://127.0.0.1:9999/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            whatsapp.messages_url().as_deref(),
            Some("http://127.0.0.1:9999/v19.0/123/messages")
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = config_from(&[("VERIFY_TOKEN", "verify-secret"), ("ACCESS_TOKEN", "access-secret")]);
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("verify-secret"));
        assert!(!rendered.contains("access-secret"));
        assert!(rendered.contains(REDACTED));
    }

    #[test]
    fn test_disabled_body_limit_is_unbounded() {
        let limits = BodyLimitsConfig {
            enabled: false,
            ..Default::default()
        };
        assert_eq!(limits.webhook_limit(), usize::MAX);
        assert_eq!(BodyLimitsConfig::default().webhook_limit(), 10 * 1024 * 1024);
    }
}
