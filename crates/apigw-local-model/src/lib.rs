//! Model types for apigw-local.
//!
//! This crate holds the shapes that travel through the gateway emulator:
//!
//! - [`HttpRequest`]: the inbound request as seen by the listener
//! - [`ProxyEvent`]: the proxy integration event handed to the function
//! - [`InvocationResult`]: the structured result the function returns
//! - [`GatewayError`]: the error taxonomy and its HTTP status mapping
//!
//! Headers and query parameters are stored once, in a [`MultiValueMap`]; the
//! single-value form the event also carries is a computed projection.

pub mod error;
pub mod event;
pub mod multi_value;
pub mod request;
pub mod result;

pub use error::{GatewayError, GatewayErrorCode};
pub use event::{ProxyEvent, RequestContext, RequestIdentity};
pub use multi_value::{MultiValueMap, SingleValueProjection};
pub use request::HttpRequest;
pub use result::InvocationResult;
