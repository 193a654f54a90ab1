//! Gateway HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use apigw_local_core::{InboundTranslator, dump, outbound};
use apigw_local_model::{GatewayError, ProxyEvent};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use tracing::{debug, error, info, warn};

use crate::forwarder::InvocationForwarder;
use crate::request::build_request;
use crate::response::{
    add_common_headers, error_to_response, health_response, json_response, text_response,
};
use crate::router::{DebugView, Route, resolve_route};

/// Listener settings for the gateway service.
#[derive(Debug, Clone)]
pub struct GatewayHttpConfig {
    /// Whether the `/_apigw/event` and `/_apigw/dump` routes are served.
    pub debug_routes: bool,
    /// Largest accepted request body, in bytes.
    pub max_body_size: usize,
}

impl Default for GatewayHttpConfig {
    fn default() -> Self {
        Self {
            debug_routes: true,
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

/// Hyper `Service` implementation for the gateway.
///
/// Each request is translated into a proxy event and either forwarded to the
/// function or rendered by a debug route. When the client goes away, hyper
/// drops the request future, which abandons any in-flight invocation.
#[derive(Debug, Clone)]
pub struct GatewayHttpService {
    translator: Arc<InboundTranslator>,
    forwarder: Arc<InvocationForwarder>,
    config: Arc<GatewayHttpConfig>,
    peer: Option<SocketAddr>,
}

impl GatewayHttpService {
    /// Create a new `GatewayHttpService`.
    #[must_use]
    pub fn new(
        translator: InboundTranslator,
        forwarder: InvocationForwarder,
        config: GatewayHttpConfig,
    ) -> Self {
        Self {
            translator: Arc::new(translator),
            forwarder: Arc::new(forwarder),
            config: Arc::new(config),
            peer: None,
        }
    }

    /// A copy of this service bound to one client connection.
    #[must_use]
    pub fn with_peer(&self, peer: SocketAddr) -> Self {
        Self {
            peer: Some(peer),
            ..self.clone()
        }
    }

    /// Run one request through the full pipeline.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<Full<Bytes>>
    where
        B: http_body::Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let request_id = self.translator.fabricator().request_id();
        let route = resolve_route(req.method(), req.uri().path(), self.config.debug_routes);
        debug!(
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            ?route,
            "processing request"
        );

        let response = match self.process(req, route, &request_id).await {
            Ok(response) => response,
            Err(err) => {
                self.log_failure(&err, &request_id);
                error_to_response(&err)
            }
        };
        add_common_headers(response, &request_id)
    }

    async fn process<B>(
        &self,
        req: http::Request<B>,
        route: Route,
        request_id: &str,
    ) -> Result<http::Response<Full<Bytes>>, GatewayError>
    where
        B: http_body::Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, incoming) = req.into_parts();

        // 1. Pick the path the event is built for.
        let (path, debug_view) = match route {
            Route::Health => {
                return Ok(health_response(
                    self.forwarder.endpoint(),
                    self.config.debug_routes,
                ));
            }
            Route::Debug { view, path } => (path, Some(view)),
            Route::Forward => (parts.uri.path().to_owned(), None),
        };

        // 2. Collect the body under the size limit.
        let body = collect_body(incoming, self.config.max_body_size).await?;

        // 3. Translate.
        let request = build_request(&parts, path, body, self.peer.map(|p| p.ip()));
        let event = self.translator.translate(&request, request_id)?;

        // 4. Render for debugging, or invoke and translate back.
        if let Some(view) = debug_view {
            return render_debug(view, &event);
        }

        let result = self.forwarder.invoke(&event).await?;
        let response = outbound::translate_result(&result)?;
        info!(
            request_id,
            method = %event.http_method,
            path = %event.path,
            status = response.status().as_u16(),
            "request completed"
        );
        Ok(response.map(Full::new))
    }

    fn log_failure(&self, err: &GatewayError, request_id: &str) {
        if err.is_server_error() {
            error!(
                request_id,
                endpoint = self.forwarder.endpoint(),
                code = %err.code,
                cause = %error_chain(err),
                "request failed"
            );
        } else {
            warn!(request_id, code = %err.code, error = %err, "request rejected");
        }
    }
}

impl hyper::service::Service<http::Request<Incoming>> for GatewayHttpService {
    type Response = http::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

fn render_debug(
    view: DebugView,
    event: &ProxyEvent,
) -> Result<http::Response<Full<Bytes>>, GatewayError> {
    match view {
        DebugView::Structured => {
            let json = serde_json::to_vec_pretty(event).map_err(|e| {
                GatewayError::internal_error("failed to serialize proxy event").with_source(e)
            })?;
            Ok(json_response(http::StatusCode::OK, json))
        }
        DebugView::Dump => Ok(text_response(dump::render_event(event))),
    }
}

/// Collect a request body, failing once it grows past `limit` bytes.
async fn collect_body<B>(body: B, limit: usize) -> Result<Bytes, GatewayError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(GatewayError::payload_too_large(limit)),
        Err(e) => Err(GatewayError::invalid_request(format!(
            "failed to read request body: {e}"
        ))),
    }
}

/// Render an error with all of its sources, outermost first.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
