//! Structured result returned by the function.
//!
//! The invocation endpoint answers with the function's return value. For a
//! proxy integration that value must look like:
//!
//! ```json
//! {
//!   "statusCode": 201,
//!   "headers": {"Content-Type": "application/json"},
//!   "multiValueHeaders": {"Set-Cookie": ["a=1", "b=2"]},
//!   "body": "{\"id\":1}",
//!   "isBase64Encoded": false
//! }
//! ```
//!
//! Any other top-level key makes the payload malformed, the same way the
//! managed gateway rejects it. Header values may be strings, numbers or
//! booleans; they are kept as their string form.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::GatewayError;

/// The function's structured response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InvocationResult {
    /// HTTP status; validated when translated.
    pub status_code: i64,
    /// Single-value headers.
    #[serde(default, deserialize_with = "scalar_map")]
    pub headers: BTreeMap<String, String>,
    /// Multi-value headers; authoritative over `headers` for shared keys.
    #[serde(default, deserialize_with = "scalar_list_map")]
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    /// Body text; `null` reads as empty.
    #[serde(default, deserialize_with = "nullable_string")]
    pub body: String,
    /// Whether `body` is base64.
    #[serde(default, deserialize_with = "nullable_bool")]
    pub is_base64_encoded: bool,
}

impl InvocationResult {
    /// Parse the raw payload returned by the invocation endpoint.
    pub fn from_slice(payload: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(payload).map_err(|e| {
            GatewayError::malformed_result(format!("invalid invocation result: {e}")).with_source(e)
        })
    }
}

/// A JSON scalar accepted where a header value is expected.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
            Scalar::Flag(b) => b.to_string(),
        }
    }
}

fn scalar_map<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, String>, D::Error> {
    let raw: Option<BTreeMap<String, Scalar>> = Option::deserialize(d)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, String::from(v)))
        .collect())
}

fn scalar_list_map<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<BTreeMap<String, Vec<String>>, D::Error> {
    let raw: Option<BTreeMap<String, Vec<Scalar>>> = Option::deserialize(d)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.into_iter().map(String::from).collect()))
        .collect())
}

fn nullable_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn nullable_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use crate::error::GatewayErrorCode;

    use super::*;

    #[test]
    fn test_should_parse_minimal_result() {
        let result = InvocationResult::from_slice(br#"{"statusCode": 204}"#).unwrap();
        assert_eq!(result.status_code, 204);
        assert!(result.headers.is_empty());
        assert_eq!(result.body, "");
        assert!(!result.is_base64_encoded);
    }

    #[test]
    fn test_should_parse_full_result() {
        let payload = br#"{
            "statusCode": 201,
            "headers": {"Content-Type": "application/json", "X-Count": 3, "X-Flag": true},
            "multiValueHeaders": {"Set-Cookie": ["a=1", "b=2"]},
            "body": "{\"id\":1}",
            "isBase64Encoded": false
        }"#;
        let result = InvocationResult::from_slice(payload).unwrap();
        assert_eq!(result.status_code, 201);
        assert_eq!(result.headers["X-Count"], "3");
        assert_eq!(result.headers["X-Flag"], "true");
        assert_eq!(result.multi_value_headers["Set-Cookie"], vec!["a=1", "b=2"]);
        assert_eq!(result.body, r#"{"id":1}"#);
    }

    #[test]
    fn test_should_accept_null_optional_fields() {
        let payload =
            br#"{"statusCode": 200, "headers": null, "multiValueHeaders": null, "body": null, "isBase64Encoded": null}"#;
        let result = InvocationResult::from_slice(payload).unwrap();
        assert_eq!(result.body, "");
        assert!(result.multi_value_headers.is_empty());
    }

    #[test]
    fn test_should_reject_function_error_payload() {
        let payload = br#"{"errorMessage": "boom", "errorType": "Error"}"#;
        let err = InvocationResult::from_slice(payload).unwrap_err();
        assert_eq!(err.code, GatewayErrorCode::MalformedInvocationResult);
    }

    #[test]
    fn test_should_reject_unknown_top_level_key() {
        let payload = br#"{"statusCode": 200, "cookies": ["a=1"]}"#;
        assert!(InvocationResult::from_slice(payload).is_err());
    }

    #[test]
    fn test_should_reject_non_json_payload() {
        let err = InvocationResult::from_slice(b"Internal Server Error").unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::BAD_GATEWAY);
    }
}
