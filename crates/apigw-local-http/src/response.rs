//! Gateway-generated responses and error formatting.

use apigw_local_model::GatewayError;
use bytes::Bytes;
use http::HeaderValue;
use http::header::CONTENT_TYPE;
use http_body_util::Full;

/// Content type for JSON bodies produced by the gateway.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type of the type-annotated dump.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
/// Header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: &str = "x-amzn-requestid";
/// Header naming the gateway error kind.
pub const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Serialize a gateway error into a JSON body.
///
/// The shape mirrors the managed gateway:
///
/// ```json
/// {"message": "Internal server error"}
/// ```
#[must_use]
pub fn error_to_json(error: &GatewayError) -> Vec<u8> {
    serde_json::json!({ "message": error.client_message() })
        .to_string()
        .into_bytes()
}

/// Convert a gateway error into a complete HTTP response.
#[must_use]
pub fn error_to_response(error: &GatewayError) -> http::Response<Full<Bytes>> {
    let mut response = json_response(error.status_code, error_to_json(error));
    response.headers_mut().insert(
        ERROR_TYPE_HEADER,
        HeaderValue::from_static(error.code.as_str()),
    );
    response
}

/// Build a response from JSON bytes.
#[must_use]
pub fn json_response(
    status: http::StatusCode,
    json: Vec<u8>,
) -> http::Response<Full<Bytes>> {
    let mut response = http::Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}

/// Build a plain-text 200 response.
#[must_use]
pub fn text_response(text: String) -> http::Response<Full<Bytes>> {
    let mut response = http::Response::new(Full::new(Bytes::from(text)));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
    response
}

/// Body of the health check response.
#[must_use]
pub fn health_response(endpoint: &str, debug_routes: bool) -> http::Response<Full<Bytes>> {
    let json = serde_json::json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "invocationEndpoint": endpoint,
        "debugRoutes": debug_routes,
    });
    json_response(http::StatusCode::OK, json.to_string().into_bytes())
}

/// Stamp headers every gateway response carries.
#[must_use]
pub fn add_common_headers(
    mut response: http::Response<Full<Bytes>>,
    request_id: &str,
) -> http::Response<Full<Bytes>> {
    if let Ok(hv) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, hv);
    }
    response
}

#[cfg(test)]
mod tests {
    use apigw_local_model::GatewayErrorCode;

    use super::*;

    #[test]
    fn test_should_hide_server_error_details() {
        let err = GatewayError::upstream_unavailable("connection refused to 127.0.0.1:9000");
        let parsed: serde_json::Value = serde_json::from_slice(&error_to_json(&err)).unwrap();
        assert_eq!(parsed, serde_json::json!({"message": "Internal server error"}));
    }

    #[test]
    fn test_should_expose_client_error_message() {
        let err = GatewayError::invalid_request("unsupported method: BREW");
        let parsed: serde_json::Value = serde_json::from_slice(&error_to_json(&err)).unwrap();
        assert_eq!(parsed["message"], "unsupported method: BREW");
    }

    #[test]
    fn test_should_build_error_response_with_type_header() {
        let err = GatewayError::invocation_timeout("no answer after 1s");
        let resp = error_to_response(&err);
        assert_eq!(resp.status(), http::StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(resp.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert_eq!(
            resp.headers()[ERROR_TYPE_HEADER],
            GatewayErrorCode::InvocationTimeout.as_str()
        );
    }

    #[test]
    fn test_should_overwrite_request_id() {
        let mut resp = text_response("x".to_owned());
        resp.headers_mut()
            .insert(REQUEST_ID_HEADER, HeaderValue::from_static("from-function"));
        let resp = add_common_headers(resp, "gw-1");
        assert_eq!(resp.headers()[REQUEST_ID_HEADER], "gw-1");
        assert_eq!(resp.headers().get_all(REQUEST_ID_HEADER).iter().count(), 1);
    }
}
