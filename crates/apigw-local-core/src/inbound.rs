//! Inbound translation: `HttpRequest` to `ProxyEvent`.

use apigw_local_model::{GatewayError, HttpRequest, MultiValueMap, ProxyEvent};
use base64::Engine;
use tracing::debug;

use crate::fabricator::{MetadataFabricator, RequestFacts};
use crate::template::RouteTable;

/// Methods a proxy event may carry.
pub const SUPPORTED_METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "DELETE", "PATCH", "OPTIONS", "CONNECT", "TRACE",
];

/// Parse a raw query string, keeping repeated keys in order.
///
/// Values are form-decoded (`%XX` and `+`). A key without `=` maps to `""`.
#[must_use]
pub fn parse_query(raw: Option<&str>) -> MultiValueMap {
    let mut query = MultiValueMap::new();
    if let Some(raw) = raw {
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            query.append(key, value);
        }
    }
    query
}

/// Encode a body for the event: UTF-8 text as-is, anything else as base64.
///
/// The decision looks only at the bytes; a text content type does not
/// guarantee a text payload.
#[must_use]
pub fn encode_body(body: &[u8]) -> (String, bool) {
    match std::str::from_utf8(body) {
        Ok(text) => (text.to_owned(), false),
        Err(_) => (base64::engine::general_purpose::STANDARD.encode(body), true),
    }
}

/// Turns inbound requests into proxy events.
#[derive(Debug, Clone)]
pub struct InboundTranslator {
    fabricator: MetadataFabricator,
    routes: RouteTable,
}

impl InboundTranslator {
    /// Create a translator.
    #[must_use]
    pub fn new(fabricator: MetadataFabricator, routes: RouteTable) -> Self {
        Self { fabricator, routes }
    }

    /// The fabricator used for synthetic metadata.
    #[must_use]
    pub fn fabricator(&self) -> &MetadataFabricator {
        &self.fabricator
    }

    /// Translate `req` into a proxy event carrying `request_id`.
    pub fn translate(
        &self,
        req: &HttpRequest,
        request_id: &str,
    ) -> Result<ProxyEvent, GatewayError> {
        if !SUPPORTED_METHODS.contains(&req.method.as_str()) {
            return Err(GatewayError::invalid_request(format!(
                "unsupported method: {}",
                req.method
            )));
        }
        if req.path.is_empty() {
            return Err(GatewayError::invalid_request("request path must not be empty"));
        }
        if !req.path.starts_with('/') {
            return Err(GatewayError::invalid_request(format!(
                "request path must start with '/': {}",
                req.path
            )));
        }

        let resolved = self.routes.resolve(&req.path);
        if let Some(params) = &resolved.path_parameters {
            debug!(resource = %resolved.resource, ?params, "matched resource template");
        }
        let source_ip = req
            .source_ip
            .map_or_else(|| "127.0.0.1".to_owned(), |ip| ip.to_string());

        let metadata = self.fabricator.fabricate(&RequestFacts {
            request_id,
            method: &req.method,
            path: &req.path,
            resource_path: &resolved.resource,
            source_ip: &source_ip,
            host: req.headers.get("host"),
            user_agent: req.headers.get("user-agent"),
        });

        let mut headers = req.headers.clone();
        for (name, value) in metadata.headers {
            headers.insert_if_absent(name, vec![value]);
        }

        let (body, is_base64_encoded) = encode_body(&req.body);

        Ok(ProxyEvent {
            resource: resolved.resource,
            path: req.path.clone(),
            http_method: req.method.clone(),
            headers,
            query: req.query.clone(),
            path_parameters: resolved.path_parameters,
            stage_variables: None,
            request_context: metadata.request_context,
            body,
            is_base64_encoded,
        })
    }
}
