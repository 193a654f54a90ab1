//! Proxy integration event.
//!
//! The JSON shape follows the REST API "Lambda proxy" integration:
//!
//! ```json
//! {
//!   "resource": "/json",
//!   "path": "/json",
//!   "httpMethod": "GET",
//!   "headers": {"Host": "localhost"},
//!   "multiValueHeaders": {"Host": ["localhost"]},
//!   "queryStringParameters": {},
//!   "multiValueQueryStringParameters": {},
//!   "pathParameters": null,
//!   "stageVariables": null,
//!   "requestContext": {"requestId": "...", "stage": "local", ...},
//!   "body": "",
//!   "isBase64Encoded": false
//! }
//! ```

use std::collections::BTreeMap;

use base64::Engine;
use serde::{Serialize, Serializer};

use crate::multi_value::{MultiValueMap, SingleValueProjection};

/// The event passed to the function for one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEvent {
    /// Matched resource template, or the path itself.
    pub resource: String,
    /// Request path.
    pub path: String,
    /// Request method.
    pub http_method: String,
    /// Request headers merged with fabricated headers.
    pub headers: MultiValueMap,
    /// Query parameters.
    pub query: MultiValueMap,
    /// Template captures; `None` when no resource template matched.
    pub path_parameters: Option<BTreeMap<String, String>>,
    /// Stage variables; always `None` locally.
    pub stage_variables: Option<BTreeMap<String, String>>,
    /// Fabricated request context.
    pub request_context: RequestContext,
    /// Body text, base64 when `is_base64_encoded` is set.
    pub body: String,
    /// Whether `body` is base64.
    pub is_base64_encoded: bool,
}

impl ProxyEvent {
    /// Recover the original request body bytes.
    pub fn decode_body(&self) -> Result<Vec<u8>, base64::DecodeError> {
        if self.is_base64_encoded {
            base64::engine::general_purpose::STANDARD.decode(&self.body)
        } else {
            Ok(self.body.as_bytes().to_vec())
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent<'a> {
    resource: &'a str,
    path: &'a str,
    http_method: &'a str,
    headers: SingleValueProjection<'a>,
    multi_value_headers: &'a MultiValueMap,
    query_string_parameters: SingleValueProjection<'a>,
    multi_value_query_string_parameters: &'a MultiValueMap,
    path_parameters: Option<&'a BTreeMap<String, String>>,
    stage_variables: Option<&'a BTreeMap<String, String>>,
    request_context: &'a RequestContext,
    body: &'a str,
    is_base64_encoded: bool,
}

impl Serialize for ProxyEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireEvent {
            resource: &self.resource,
            path: &self.path,
            http_method: &self.http_method,
            headers: self.headers.single_value(),
            multi_value_headers: &self.headers,
            query_string_parameters: self.query.single_value(),
            multi_value_query_string_parameters: &self.query,
            path_parameters: self.path_parameters.as_ref(),
            stage_variables: self.stage_variables.as_ref(),
            request_context: &self.request_context,
            body: &self.body,
            is_base64_encoded: self.is_base64_encoded,
        }
        .serialize(serializer)
    }
}

/// Gateway-owned request metadata.
///
/// Every field is fabricated locally and carries no authority.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub resource_id: String,
    pub resource_path: String,
    pub http_method: String,
    pub extended_request_id: String,
    /// `dd/Mon/yyyy:HH:MM:SS +0000`.
    pub request_time: String,
    /// Stage-prefixed path, e.g. `/local/json`.
    pub path: String,
    pub account_id: String,
    pub protocol: String,
    pub stage: String,
    pub domain_prefix: String,
    /// Milliseconds since the Unix epoch.
    pub request_time_epoch: i64,
    pub request_id: String,
    pub identity: RequestIdentity,
    pub domain_name: String,
    pub api_id: String,
}

/// Caller identity block of the request context.
///
/// Only `source_ip` and `user_agent` are ever filled locally; the other
/// fields exist so consumers see the full shape.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIdentity {
    pub cognito_identity_pool_id: Option<String>,
    pub account_id: Option<String>,
    pub cognito_identity_id: Option<String>,
    pub caller: Option<String>,
    pub source_ip: String,
    pub principal_org_id: Option<String>,
    pub access_key: Option<String>,
    pub cognito_authentication_type: Option<String>,
    pub cognito_authentication_provider: Option<String>,
    pub user_arn: Option<String>,
    pub user_agent: Option<String>,
    pub user: Option<String>,
    pub api_key: Option<String>,
    pub api_key_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> RequestContext {
        RequestContext {
            resource_id: "abc123".to_owned(),
            resource_path: "/json".to_owned(),
            http_method: "GET".to_owned(),
            extended_request_id: "ext".to_owned(),
            request_time: "01/Jan/2024:00:00:00 +0000".to_owned(),
            path: "/local/json".to_owned(),
            account_id: "000000000000".to_owned(),
            protocol: "HTTP/1.1".to_owned(),
            stage: "local".to_owned(),
            domain_prefix: "localhost".to_owned(),
            request_time_epoch: 1_704_067_200_000,
            request_id: "req".to_owned(),
            identity: RequestIdentity {
                source_ip: "127.0.0.1".to_owned(),
                ..RequestIdentity::default()
            },
            domain_name: "localhost".to_owned(),
            api_id: "localapi01".to_owned(),
        }
    }

    fn sample_event() -> ProxyEvent {
        let mut query = MultiValueMap::new();
        query.append("a", "1");
        query.append("a", "2");
        let mut headers = MultiValueMap::case_insensitive();
        headers.append("Accept", "text/html");
        ProxyEvent {
            resource: "/json".to_owned(),
            path: "/json".to_owned(),
            http_method: "GET".to_owned(),
            headers,
            query,
            path_parameters: None,
            stage_variables: None,
            request_context: sample_context(),
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    #[test]
    fn test_should_serialize_both_shapes_from_one_map() {
        let json = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(json["queryStringParameters"]["a"], "2");
        assert_eq!(
            json["multiValueQueryStringParameters"]["a"],
            serde_json::json!(["1", "2"])
        );
        assert_eq!(json["headers"]["Accept"], "text/html");
        assert_eq!(json["multiValueHeaders"]["Accept"], serde_json::json!(["text/html"]));
    }

    #[test]
    fn test_should_serialize_absent_fields_as_null() {
        let json = serde_json::to_value(sample_event()).unwrap();
        assert!(json["pathParameters"].is_null());
        assert!(json["stageVariables"].is_null());
        assert!(json["requestContext"]["identity"]["userArn"].is_null());
        assert_eq!(json["requestContext"]["identity"]["sourceIp"], "127.0.0.1");
        assert_eq!(json["body"], "");
    }

    #[test]
    fn test_should_emit_fields_in_gateway_order() {
        let text = serde_json::to_string(&sample_event()).unwrap();
        let resource = text.find("\"resource\"").unwrap();
        let method = text.find("\"httpMethod\"").unwrap();
        let body = text.find("\"body\"").unwrap();
        assert!(resource < method && method < body);
    }

    #[test]
    fn test_should_decode_base64_body() {
        let mut event = sample_event();
        event.body = "AP8=".to_owned();
        event.is_base64_encoded = true;
        assert_eq!(event.decode_body().unwrap(), vec![0x00, 0xff]);
    }
}
