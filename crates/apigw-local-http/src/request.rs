//! Conversion of received HTTP requests into the gateway's request model.

use std::net::IpAddr;

use apigw_local_core::inbound::parse_query;
use apigw_local_model::HttpRequest;
use bytes::Bytes;

/// Build an [`HttpRequest`] from received request parts.
///
/// `path` is passed separately so debug routes can substitute the path with
/// their prefix removed. Header values that are not valid UTF-8 are decoded
/// lossily rather than dropped.
#[must_use]
pub fn build_request(
    parts: &http::request::Parts,
    path: String,
    body: Bytes,
    source_ip: Option<IpAddr>,
) -> HttpRequest {
    let mut request = HttpRequest::new(parts.method.as_str(), path);
    request.query = parse_query(parts.uri.query());
    for (name, value) in &parts.headers {
        request
            .headers
            .append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }
    request.body = body;
    request.source_ip = source_ip;
    request
}
