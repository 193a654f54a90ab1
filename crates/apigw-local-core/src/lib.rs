//! Core translation logic for apigw-local.
//!
//! Everything in this crate is synchronous and free of I/O:
//!
//! - [`config`]: process configuration read from the environment
//! - [`fabricator`]: synthetic request context and gateway headers
//! - [`template`]: resource templates and path parameter extraction
//! - [`inbound`]: `HttpRequest` to `ProxyEvent`
//! - [`outbound`]: `InvocationResult` to an HTTP response
//! - [`dump`]: type-annotated rendering of an event for debugging

pub mod config;
pub mod dump;
pub mod error;
pub mod fabricator;
pub mod inbound;
pub mod outbound;
pub mod template;

pub use config::{GatewayConfig, LogFormat, MetadataMode};
pub use error::ConfigError;
pub use fabricator::{Clock, GatewayIdentity, IdSource, MetadataFabricator};
pub use inbound::InboundTranslator;
pub use template::RouteTable;
