//! Invocation forwarder.
//!
//! Each proxy event is sent as one JSON `POST` to the invocation endpoint
//! (for example the Lambda Runtime Interface Emulator). There are no retries:
//! a function invocation is not assumed to be idempotent.

use std::time::{Duration, Instant};

use apigw_local_model::{GatewayError, InvocationResult, ProxyEvent};
use tracing::{debug, info};

/// Header set by Lambda-compatible endpoints when the function raised.
pub const FUNCTION_ERROR_HEADER: &str = "x-amz-function-error";

/// Sends proxy events to the invocation endpoint.
#[derive(Debug, Clone)]
pub struct InvocationForwarder {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    timeout: Duration,
}

impl InvocationForwarder {
    /// Create a forwarder for `endpoint` with an overall per-invocation deadline.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let endpoint = reqwest::Url::parse(endpoint).map_err(|e| {
            GatewayError::internal_error(format!("invalid invocation endpoint {endpoint:?}"))
                .with_source(e)
        })?;
        let client = reqwest::Client::builder()
            .no_proxy()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                GatewayError::internal_error("failed to build invocation client").with_source(e)
            })?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// The invocation endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Invoke the function once with `event`.
    ///
    /// Dropping the returned future abandons the in-flight call.
    pub async fn invoke(&self, event: &ProxyEvent) -> Result<InvocationResult, GatewayError> {
        let payload = serde_json::to_vec(event).map_err(|e| {
            GatewayError::internal_error("failed to serialize proxy event").with_source(e)
        })?;

        debug!(
            endpoint = %self.endpoint,
            request_id = %event.request_context.request_id,
            bytes = payload.len(),
            "invoking function"
        );
        let started = Instant::now();

        let body = tokio::time::timeout(self.timeout, self.send(payload))
            .await
            .map_err(|_| {
                GatewayError::invocation_timeout(format!(
                    "no result from {} within {:?}",
                    self.endpoint, self.timeout
                ))
            })??;

        info!(
            request_id = %event.request_context.request_id,
            elapsed_ms = started.elapsed().as_millis(),
            bytes = body.len(),
            "function returned"
        );

        InvocationResult::from_slice(&body)
    }

    async fn send(&self, payload: Vec<u8>) -> Result<bytes::Bytes, GatewayError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::upstream_unavailable(format!(
                "invocation endpoint answered {status}"
            )));
        }
        if let Some(kind) = response.headers().get(FUNCTION_ERROR_HEADER) {
            return Err(GatewayError::malformed_result(format!(
                "function raised an error: {}",
                String::from_utf8_lossy(kind.as_bytes())
            )));
        }

        response.bytes().await.map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::invocation_timeout(format!("timed out calling {}", self.endpoint))
                .with_source(err)
        } else {
            GatewayError::upstream_unavailable(format!("failed to call {}", self.endpoint))
                .with_source(err)
        }
    }
}
