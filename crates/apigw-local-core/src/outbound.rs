//! Outbound translation: `InvocationResult` to an HTTP response.
//!
//! When a key appears in both `multiValueHeaders` and `headers`, the
//! multi-value entry wins and the single value is dropped. An empty
//! multi-value list counts as absent. Repeated values become repeated header
//! lines; they are never joined.
//!
//! Informational statuses (1xx) cannot end an HTTP exchange, so a result
//! carrying one is rejected like any other out-of-range status.

use apigw_local_model::{GatewayError, InvocationResult};
use base64::Engine;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};

/// Content type used when the function sets none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Build the client response from the function's result.
pub fn translate_result(result: &InvocationResult) -> Result<http::Response<Bytes>, GatewayError> {
    let status = u16::try_from(result.status_code)
        .ok()
        .filter(|s| (200..=599).contains(s))
        .and_then(|s| http::StatusCode::from_u16(s).ok())
        .ok_or_else(|| GatewayError::invalid_status_code(result.status_code))?;

    let mut response = http::Response::new(decode_body(result)?);
    *response.status_mut() = status;
    let headers = response.headers_mut();

    for (name, values) in &result.multi_value_headers {
        let name = header_name(name)?;
        for value in values {
            headers.append(name.clone(), header_value(&name, value)?);
        }
    }

    for (name, value) in &result.headers {
        let shadowed = result
            .multi_value_headers
            .iter()
            .any(|(k, values)| !values.is_empty() && k.eq_ignore_ascii_case(name));
        if shadowed {
            continue;
        }
        let name = header_name(name)?;
        let value = header_value(&name, value)?;
        headers.append(name, value);
    }

    headers
        .entry(CONTENT_TYPE)
        .or_insert(HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    Ok(response)
}

fn decode_body(result: &InvocationResult) -> Result<Bytes, GatewayError> {
    if !result.is_base64_encoded {
        return Ok(Bytes::from(result.body.clone()));
    }
    base64::engine::general_purpose::STANDARD
        .decode(result.body.trim())
        .map(Bytes::from)
        .map_err(|e| {
            GatewayError::malformed_result(format!("body is not valid base64: {e}")).with_source(e)
        })
}

fn header_name(name: &str) -> Result<HeaderName, GatewayError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        GatewayError::malformed_result(format!("invalid header name {name:?}")).with_source(e)
    })
}

fn header_value(name: &HeaderName, value: &str) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_str(value).map_err(|e| {
        GatewayError::malformed_result(format!("invalid value for header {name}")).with_source(e)
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use apigw_local_model::GatewayErrorCode;

    use super::*;

    fn result(status: i64) -> InvocationResult {
        InvocationResult {
            status_code: status,
            ..InvocationResult::default()
        }
    }

    fn values<'a>(resp: &'a http::Response<Bytes>, name: &str) -> Vec<&'a str> {
        resp.headers()
            .get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect()
    }

    #[test]
    fn test_should_pass_status_and_json_body_through() {
        let mut res = result(201);
        res.body = r#"{"id":1,"name":"widget"}"#.to_owned();
        res.headers = BTreeMap::from([("Content-Type".to_owned(), "application/json".to_owned())]);

        let resp = translate_result(&res).unwrap();
        assert_eq!(resp.status(), http::StatusCode::CREATED);
        assert_eq!(resp.body().as_ref(), res.body.as_bytes());
    }

    #[test]
    fn test_should_reject_out_of_range_status() {
        for status in [0, 99, 100, 199, 600, 1000, -200] {
            let err = translate_result(&result(status)).unwrap_err();
            assert_eq!(err.code, GatewayErrorCode::InvalidStatusCode, "{status}");
            assert_eq!(err.status_code, http::StatusCode::BAD_GATEWAY);
        }
    }

    #[test]
    fn test_should_accept_range_boundaries() {
        assert_eq!(translate_result(&result(200)).unwrap().status().as_u16(), 200);
        assert_eq!(translate_result(&result(599)).unwrap().status().as_u16(), 599);
    }

    #[test]
    fn test_should_preserve_repeated_header_values() {
        let mut res = result(200);
        res.multi_value_headers =
            BTreeMap::from([("Set-Cookie".to_owned(), vec!["a=1".to_owned(), "b=2".to_owned()])]);

        let resp = translate_result(&res).unwrap();
        assert_eq!(values(&resp, "set-cookie"), vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_should_prefer_multi_value_headers() {
        let mut res = result(200);
        res.headers = BTreeMap::from([
            ("x-mode".to_owned(), "single".to_owned()),
            ("X-Other".to_owned(), "kept".to_owned()),
        ]);
        res.multi_value_headers =
            BTreeMap::from([("X-Mode".to_owned(), vec!["multi-1".to_owned(), "multi-2".to_owned()])]);

        let resp = translate_result(&res).unwrap();
        assert_eq!(values(&resp, "x-mode"), vec!["multi-1", "multi-2"]);
        assert_eq!(values(&resp, "x-other"), vec!["kept"]);
    }

    #[test]
    fn test_should_ignore_empty_multi_value_list() {
        let mut res = result(200);
        res.headers = BTreeMap::from([("Content-Type".to_owned(), "text/html".to_owned())]);
        res.multi_value_headers = BTreeMap::from([("content-type".to_owned(), Vec::new())]);

        let resp = translate_result(&res).unwrap();
        assert_eq!(values(&resp, "content-type"), vec!["text/html"]);
    }

    #[test]
    fn test_should_decode_base64_body() {
        let mut res = result(200);
        res.body = "AAEC/w==".to_owned();
        res.is_base64_encoded = true;
        res.headers = BTreeMap::from([(
            "Content-Type".to_owned(),
            "application/octet-stream".to_owned(),
        )]);

        let resp = translate_result(&res).unwrap();
        assert_eq!(resp.body().as_ref(), &[0x00, 0x01, 0x02, 0xff]);
        assert_eq!(values(&resp, "content-type"), vec!["application/octet-stream"]);
    }

    #[test]
    fn test_should_pass_non_base64_body_as_raw_bytes() {
        let mut res = result(200);
        res.body = "AAEC/w==".to_owned();

        let resp = translate_result(&res).unwrap();
        assert_eq!(resp.body().as_ref(), b"AAEC/w==");
    }

    #[test]
    fn test_should_reject_invalid_base64_body() {
        let mut res = result(200);
        res.body = "not base64!".to_owned();
        res.is_base64_encoded = true;

        let err = translate_result(&res).unwrap_err();
        assert_eq!(err.code, GatewayErrorCode::MalformedInvocationResult);
    }

    #[test]
    fn test_should_reject_invalid_header_name() {
        let mut res = result(200);
        res.headers = BTreeMap::from([("bad header".to_owned(), "x".to_owned())]);
        assert!(translate_result(&res).is_err());
    }

    #[test]
    fn test_should_default_content_type() {
        let resp = translate_result(&result(200)).unwrap();
        assert_eq!(values(&resp, "content-type"), vec![DEFAULT_CONTENT_TYPE]);
    }
}
