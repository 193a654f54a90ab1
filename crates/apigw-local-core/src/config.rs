//! Gateway configuration.
//!
//! All configuration is driven by environment variables. Values are read once
//! at startup and shared read-only afterwards.

use std::time::Duration;

use crate::error::ConfigError;

/// Default invocation endpoint of the runtime interface emulator.
pub const DEFAULT_INVOCATION_ENDPOINT: &str =
    "http://127.0.0.1:9000/2015-03-31/functions/function/invocations";

/// How fabricated metadata is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataMode {
    /// Wall clock and random request IDs.
    #[default]
    Live,
    /// Fixed clock and fixed IDs, for reproducible output.
    Deterministic,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Process-wide gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Bind address for the listener.
    pub gateway_listen: String,
    /// URL the proxy event is POSTed to.
    pub invocation_endpoint: String,
    /// Upper bound for a single invocation.
    pub invocation_timeout: Duration,
    /// Fabricated metadata mode.
    pub metadata_mode: MetadataMode,
    /// Whether the debug routes are served.
    pub debug_routes: bool,
    /// Maximum accepted request body, in bytes.
    pub max_body_size: usize,
    /// Stage name reported in the request context.
    pub stage: String,
    /// Fabricated API identifier.
    pub api_id: String,
    /// Fabricated 12-digit account identifier.
    pub account_id: String,
    /// Resource templates, tried in order.
    pub route_templates: Vec<String>,
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log line format.
    pub log_format: LogFormat,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateway_listen: "0.0.0.0:8080".to_owned(),
            invocation_endpoint: DEFAULT_INVOCATION_ENDPOINT.to_owned(),
            invocation_timeout: Duration::from_secs(30),
            metadata_mode: MetadataMode::Live,
            debug_routes: true,
            max_body_size: 10 * 1024 * 1024,
            stage: "local".to_owned(),
            api_id: "localapi01".to_owned(),
            account_id: "000000000000".to_owned(),
            route_templates: Vec::new(),
            log_level: "info".to_owned(),
            log_format: LogFormat::Text,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("INVOCATION_ENDPOINT") {
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    key: "INVOCATION_ENDPOINT",
                    value: v,
                    reason: "expected an http:// or https:// URL",
                });
            }
            config.invocation_endpoint = v;
        }
        if let Some(v) = lookup("INVOCATION_TIMEOUT") {
            config.invocation_timeout = parse_timeout(&v)?;
        }
        if let Some(v) = lookup("DETERMINISTIC_METADATA") {
            if parse_bool(&v) {
                config.metadata_mode = MetadataMode::Deterministic;
            }
        }
        if let Some(v) = lookup("DEBUG_ROUTES") {
            config.debug_routes = parse_bool(&v);
        }
        if let Some(v) = lookup("MAX_BODY_SIZE") {
            config.max_body_size = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "MAX_BODY_SIZE",
                value: v.clone(),
                reason: "expected a byte count",
            })?;
        }
        if let Some(v) = lookup("STAGE") {
            config.stage = v;
        }
        if let Some(v) = lookup("API_ID") {
            config.api_id = v;
        }
        if let Some(v) = lookup("ACCOUNT_ID") {
            if v.len() != 12 || !v.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::InvalidAccountId(v));
            }
            config.account_id = v;
        }
        if let Some(v) = lookup("ROUTE_TEMPLATES") {
            config.route_templates = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect();
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            config.log_format = match v.trim().to_ascii_lowercase().as_str() {
                "text" | "" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "LOG_FORMAT",
                        value: v,
                        reason: "expected text or json",
                    });
                }
            };
        }

        Ok(config)
    }
}

/// Parse a timeout given in seconds, fractions allowed.
fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason| ConfigError::InvalidValue {
        key: "INVOCATION_TIMEOUT",
        value: raw.to_owned(),
        reason,
    };
    let secs: f64 = raw.trim().parse().map_err(|_| invalid("expected seconds"))?;
    if secs <= 0.0 {
        return Err(invalid("must be a positive number of seconds"));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| invalid("out of range"))
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "yes" | "TRUE" | "YES" | "True")
}
