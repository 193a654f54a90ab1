//! Inbound HTTP request as seen by the gateway.

use std::net::IpAddr;

use bytes::Bytes;

use crate::multi_value::MultiValueMap;

/// A fully buffered inbound request.
///
/// `headers` is case-insensitive and keeps the casing the request arrived
/// with. `query` holds the decoded query parameters with repetition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method, as sent by the client.
    pub method: String,
    /// Request path without the query string.
    pub path: String,
    /// Decoded query parameters.
    pub query: MultiValueMap,
    /// Request headers.
    pub headers: MultiValueMap,
    /// Raw body bytes.
    pub body: Bytes,
    /// Address of the connected peer, when known.
    pub source_ip: Option<IpAddr>,
}

impl HttpRequest {
    /// Create a request with no query, headers or body.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: MultiValueMap::new(),
            headers: MultiValueMap::case_insensitive(),
            body: Bytes::new(),
            source_ip: None,
        }
    }

    /// Append a header value.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the peer address.
    #[must_use]
    pub fn with_source_ip(mut self, ip: IpAddr) -> Self {
        self.source_ip = Some(ip);
        self
    }
}
