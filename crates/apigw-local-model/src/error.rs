//! Gateway error types.
//!
//! Every failure the proxy can produce maps to one [`GatewayErrorCode`], which
//! fixes the HTTP status and the message a client is allowed to see. Server
//! side codes never expose [`GatewayError::message`] to the caller; it is kept
//! for the operator log together with the optional source error.

use std::fmt;

/// Well-known gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum GatewayErrorCode {
    /// The inbound request cannot be turned into a proxy event.
    #[default]
    InvalidRequest,
    /// The inbound body exceeds the configured size limit.
    PayloadTooLarge,
    /// The invocation endpoint is unreachable or failed at the transport level.
    UpstreamUnavailable,
    /// The invocation did not complete within the configured timeout.
    InvocationTimeout,
    /// The invocation endpoint answered with something that is not an invocation result.
    MalformedInvocationResult,
    /// The invocation result carries a status code that cannot be a final response.
    InvalidStatusCode,
    /// Anything else.
    Internal,
}

impl GatewayErrorCode {
    /// Returns the error type name reported in the `x-amzn-ErrorType` header.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "InvalidRequestError",
            Self::PayloadTooLarge => "PayloadTooLargeError",
            Self::UpstreamUnavailable => "UpstreamUnavailableError",
            Self::InvocationTimeout => "InvocationTimeoutError",
            Self::MalformedInvocationResult => "MalformedInvocationResultError",
            Self::InvalidStatusCode => "InvalidStatusCodeError",
            Self::Internal => "InternalServerError",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::InvalidRequest => http::StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => http::StatusCode::PAYLOAD_TOO_LARGE,
            Self::UpstreamUnavailable
            | Self::MalformedInvocationResult
            | Self::InvalidStatusCode => http::StatusCode::BAD_GATEWAY,
            Self::InvocationTimeout => http::StatusCode::GATEWAY_TIMEOUT,
            Self::Internal => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fixed message shown to clients for server-side failures.
    ///
    /// Returns `None` for client errors, whose own message is safe to echo.
    #[must_use]
    pub fn public_message(&self) -> Option<&'static str> {
        match self {
            Self::InvalidRequest => None,
            Self::PayloadTooLarge => Some("Request Too Long"),
            Self::InvocationTimeout => Some("Endpoint request timed out"),
            Self::UpstreamUnavailable
            | Self::MalformedInvocationResult
            | Self::InvalidStatusCode
            | Self::Internal => Some("Internal server error"),
        }
    }
}

impl fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A gateway error.
#[derive(Debug)]
pub struct GatewayError {
    /// The error code.
    pub code: GatewayErrorCode,
    /// Operator-facing message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl GatewayError {
    /// Create a new `GatewayError` with a custom message.
    #[must_use]
    pub fn with_message(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The message that may be sent to the client.
    #[must_use]
    pub fn client_message(&self) -> &str {
        self.code.public_message().unwrap_or(&self.message)
    }

    /// Whether this error is the gateway's fault rather than the client's.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code.is_server_error()
    }

    // -- Convenience constructors --

    /// Malformed inbound request.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::with_message(GatewayErrorCode::InvalidRequest, message)
    }

    /// Inbound body over the configured limit.
    #[must_use]
    pub fn payload_too_large(limit: usize) -> Self {
        Self::with_message(
            GatewayErrorCode::PayloadTooLarge,
            format!("request body exceeds the {limit} byte limit"),
        )
    }

    /// Invocation endpoint unreachable.
    #[must_use]
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::with_message(GatewayErrorCode::UpstreamUnavailable, message)
    }

    /// Invocation exceeded its timeout.
    #[must_use]
    pub fn invocation_timeout(message: impl Into<String>) -> Self {
        Self::with_message(GatewayErrorCode::InvocationTimeout, message)
    }

    /// Invocation endpoint returned a payload that is not an invocation result.
    #[must_use]
    pub fn malformed_result(message: impl Into<String>) -> Self {
        Self::with_message(GatewayErrorCode::MalformedInvocationResult, message)
    }

    /// Status code outside the valid HTTP range.
    #[must_use]
    pub fn invalid_status_code(status: i64) -> Self {
        Self::with_message(
            GatewayErrorCode::InvalidStatusCode,
            format!("status code {status} is not a final response status (200..=599)"),
        )
    }

    /// Internal server error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(GatewayErrorCode::Internal, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_map_codes_to_status() {
        let cases = [
            (GatewayErrorCode::InvalidRequest, 400),
            (GatewayErrorCode::PayloadTooLarge, 413),
            (GatewayErrorCode::UpstreamUnavailable, 502),
            (GatewayErrorCode::InvocationTimeout, 504),
            (GatewayErrorCode::MalformedInvocationResult, 502),
            (GatewayErrorCode::InvalidStatusCode, 502),
            (GatewayErrorCode::Internal, 500),
        ];
        for (code, status) in cases {
            assert_eq!(code.default_status_code().as_u16(), status, "{code}");
        }
    }

    #[test]
    fn test_should_hide_internal_detail_from_client() {
        let err = GatewayError::upstream_unavailable("connect to 10.0.0.7:9000 refused");
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.is_server_error());
    }

    #[test]
    fn test_should_echo_client_error_message() {
        let err = GatewayError::invalid_request("unsupported method: BREW");
        assert_eq!(err.client_message(), "unsupported method: BREW");
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_should_expose_source_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = GatewayError::upstream_unavailable("invoke failed").with_source(io);
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("reset"));
    }
}
