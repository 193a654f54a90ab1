//! Synthetic gateway metadata.
//!
//! A managed gateway attaches a request context and a handful of headers that
//! a bare local request cannot provide: request IDs, trace IDs, account and
//! stage identifiers, CDN viewer headers. [`MetadataFabricator`] produces them
//! from an injected [`Clock`] and [`IdSource`], so the output is a pure
//! function of the request in [`MetadataMode::Deterministic`].
//!
//! None of these values are authoritative. Functions must not base
//! authorization decisions on them when running behind this proxy.

use std::fmt;
use std::sync::Arc;

use apigw_local_model::{RequestContext, RequestIdentity};
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::config::{GatewayConfig, MetadataMode};

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Source of unique identifiers.
pub trait IdSource: Send + Sync + fmt::Debug {
    /// A fresh identifier.
    fn next_id(&self) -> Uuid;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    /// 2024-01-01T00:00:00Z.
    fn default() -> Self {
        Self(Utc.timestamp_opt(1_704_067_200, 0).single().unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Random v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// The same identifier every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedIds(pub Uuid);

impl Default for FixedIds {
    fn default() -> Self {
        Self(Uuid::from_u128(0xc6af_9ac6_7b61_11e6_9a41_93e8_dead_beef))
    }
}

impl IdSource for FixedIds {
    fn next_id(&self) -> Uuid {
        self.0
    }
}

/// Identifiers of the emulated API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayIdentity {
    /// 12-digit account ID.
    pub account_id: String,
    /// API identifier.
    pub api_id: String,
    /// Stage name.
    pub stage: String,
}

impl Default for GatewayIdentity {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

impl GatewayIdentity {
    /// Take the identity fields from the gateway configuration.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            account_id: config.account_id.clone(),
            api_id: config.api_id.clone(),
            stage: config.stage.clone(),
        }
    }
}

/// What the fabricator needs to know about the request.
#[derive(Debug, Clone, Copy)]
pub struct RequestFacts<'a> {
    /// ID chosen for this request.
    pub request_id: &'a str,
    /// Request method.
    pub method: &'a str,
    /// Request path.
    pub path: &'a str,
    /// Matched resource template, or the path.
    pub resource_path: &'a str,
    /// Peer address as text.
    pub source_ip: &'a str,
    /// `Host` header, if sent.
    pub host: Option<&'a str>,
    /// `User-Agent` header, if sent.
    pub user_agent: Option<&'a str>,
}

/// Output of [`MetadataFabricator::fabricate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FabricatedMetadata {
    /// The request context block.
    pub request_context: RequestContext,
    /// Default headers, merged only where the request lacks them.
    pub headers: Vec<(String, String)>,
}

/// Produces request contexts and default gateway headers.
#[derive(Debug, Clone)]
pub struct MetadataFabricator {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
    identity: GatewayIdentity,
}

impl MetadataFabricator {
    /// Create a fabricator with the clock and ID source matching `mode`.
    #[must_use]
    pub fn new(mode: MetadataMode, identity: GatewayIdentity) -> Self {
        match mode {
            MetadataMode::Live => {
                Self::with_sources(Arc::new(SystemClock), Arc::new(RandomIds), identity)
            }
            MetadataMode::Deterministic => Self::with_sources(
                Arc::new(FixedClock::default()),
                Arc::new(FixedIds::default()),
                identity,
            ),
        }
    }

    /// Create a fabricator from explicit sources.
    #[must_use]
    pub fn with_sources(
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdSource>,
        identity: GatewayIdentity,
    ) -> Self {
        Self {
            clock,
            ids,
            identity,
        }
    }

    /// Pick the ID for a new request.
    #[must_use]
    pub fn request_id(&self) -> String {
        self.ids.next_id().to_string()
    }

    /// Fabricate the request context and default headers for one request.
    #[must_use]
    pub fn fabricate(&self, facts: &RequestFacts<'_>) -> FabricatedMetadata {
        let now = self.clock.now();
        let b64 = base64::engine::general_purpose::STANDARD;

        let extended_id = self.ids.next_id();
        let extended_request_id = b64.encode(&extended_id.as_bytes()[..10]);

        let (domain_name, port) = split_host(facts.host);
        let domain_prefix = domain_name
            .split('.')
            .next()
            .unwrap_or(domain_name)
            .to_owned();

        let request_context = RequestContext {
            resource_id: resource_id(facts.resource_path),
            resource_path: facts.resource_path.to_owned(),
            http_method: facts.method.to_owned(),
            extended_request_id,
            request_time: now.format("%d/%b/%Y:%H:%M:%S +0000").to_string(),
            path: format!("/{}{}", self.identity.stage, facts.path),
            account_id: self.identity.account_id.clone(),
            protocol: "HTTP/1.1".to_owned(),
            stage: self.identity.stage.clone(),
            domain_prefix,
            request_time_epoch: now.timestamp_millis(),
            request_id: facts.request_id.to_owned(),
            identity: RequestIdentity {
                source_ip: facts.source_ip.to_owned(),
                user_agent: facts.user_agent.map(ToOwned::to_owned),
                ..RequestIdentity::default()
            },
            domain_name: domain_name.to_owned(),
            api_id: self.identity.api_id.clone(),
        };

        let trace_id = self.ids.next_id().simple().to_string();
        let cf_id = self.ids.next_id();
        let headers = vec![
            ("X-Forwarded-For".to_owned(), facts.source_ip.to_owned()),
            ("X-Forwarded-Port".to_owned(), port.to_owned()),
            ("X-Forwarded-Proto".to_owned(), "http".to_owned()),
            (
                "X-Amzn-Trace-Id".to_owned(),
                format!("Root=1-{:08x}-{}", now.timestamp(), &trace_id[..24]),
            ),
            (
                "Via".to_owned(),
                format!("1.1 {}.cloudfront.net (CloudFront)", &trace_id[..16]),
            ),
            (
                "X-Amz-Cf-Id".to_owned(),
                base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(cf_id.as_bytes()),
            ),
            ("CloudFront-Forwarded-Proto".to_owned(), "http".to_owned()),
            ("CloudFront-Is-Desktop-Viewer".to_owned(), "true".to_owned()),
            ("CloudFront-Is-Mobile-Viewer".to_owned(), "false".to_owned()),
            ("CloudFront-Is-SmartTV-Viewer".to_owned(), "false".to_owned()),
            ("CloudFront-Is-Tablet-Viewer".to_owned(), "false".to_owned()),
            ("CloudFront-Viewer-Country".to_owned(), "US".to_owned()),
        ];

        FabricatedMetadata {
            request_context,
            headers,
        }
    }
}

/// Split a `Host` header into name and port, defaulting to `localhost:80`.
fn split_host(host: Option<&str>) -> (&str, &str) {
    let host = host.map(str::trim).filter(|h| !h.is_empty()).unwrap_or("localhost");
    // IPv6 literals carry colons inside brackets.
    if let Some(rest) = host.strip_prefix('[') {
        if let Some((addr, tail)) = rest.split_once(']') {
            let port = tail.strip_prefix(':').unwrap_or("80");
            return (addr, port);
        }
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
            (name, port)
        }
        _ => (host, "80"),
    }
}

/// Stable six-character resource ID derived from the resource path.
fn resource_id(resource_path: &str) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    // FNV-1a keeps the ID stable across processes.
    let mut hash: u32 = 0x811c_9dc5;
    for byte in resource_path.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    let mut id = String::with_capacity(6);
    for _ in 0..6 {
        id.push(char::from(ALPHABET[(hash % 36) as usize]));
        hash /= 36;
    }
    id
}
