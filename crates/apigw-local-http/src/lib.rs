//! HTTP layer for apigw-local.
//!
//! - **Router**: picks forwarding, a debug view, or the health check per request
//! - **Forwarder**: POSTs the proxy event to the invocation endpoint
//! - **Service**: hyper `Service` tying translation, forwarding and responses together
//! - **Response helpers**: gateway-style JSON error bodies and common headers

pub mod forwarder;
pub mod request;
pub mod response;
pub mod router;
pub mod service;

pub use forwarder::InvocationForwarder;
pub use router::{DebugView, Route};
pub use service::{GatewayHttpConfig, GatewayHttpService};
