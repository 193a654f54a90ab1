//! Configuration errors.

/// Error raised while loading or validating [`GatewayConfig`](crate::GatewayConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        /// Environment variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Invalid AWS account ID format.
    #[error("invalid account ID: {0} (must be 12-digit numeric string)")]
    InvalidAccountId(String),

    /// A resource template cannot be parsed.
    #[error("invalid route template {template:?}: {reason}")]
    InvalidTemplate {
        /// The offending template.
        template: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}
