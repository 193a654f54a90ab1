//! apigw-local server - a local stand-in for an API Gateway REST API.
//!
//! Every request received on the listener is turned into a Lambda proxy
//! integration event, POSTed to the invocation endpoint, and the function's
//! result is turned back into the HTTP response.
//!
//! # Usage
//!
//! ```text
//! INVOCATION_ENDPOINT=http://127.0.0.1:9000/2015-03-31/functions/function/invocations \
//!     apigw-local-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `INVOCATION_ENDPOINT` | RIE invocation URL on `127.0.0.1:9000` | Where events are POSTed |
//! | `INVOCATION_TIMEOUT` | `30` | Seconds to wait for a result |
//! | `DETERMINISTIC_METADATA` | `false` | Fixed clock and IDs for reproducible events |
//! | `DEBUG_ROUTES` | `true` | Serve `/_apigw/event` and `/_apigw/dump` |
//! | `MAX_BODY_SIZE` | `10485760` | Largest accepted request body in bytes |
//! | `STAGE` | `local` | Stage name in the request context |
//! | `API_ID` | `localapi01` | Fabricated API identifier |
//! | `ACCOUNT_ID` | `000000000000` | Fabricated account identifier |
//! | `ROUTE_TEMPLATES` | *(empty)* | Comma-separated resource templates, e.g. `/users/{id}` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//! | `LOG_FORMAT` | `text` | `text` or `json` log lines |

use std::net::SocketAddr;

use anyhow::{Context, Result};
use apigw_local_core::{
    GatewayConfig, GatewayIdentity, InboundTranslator, LogFormat, MetadataFabricator, RouteTable,
};
use apigw_local_http::router::HEALTH_PATH;
use apigw_local_http::{GatewayHttpConfig, GatewayHttpService, InvocationForwarder};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Server version logged at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}

/// Build the listener settings from the gateway configuration.
fn build_http_config(config: &GatewayConfig) -> GatewayHttpConfig {
    GatewayHttpConfig {
        debug_routes: config.debug_routes,
        max_body_size: config.max_body_size,
    }
}

/// Assemble the gateway service from the configuration.
fn build_service(config: &GatewayConfig) -> Result<GatewayHttpService> {
    let routes = RouteTable::from_templates(config.route_templates.as_slice())
        .context("invalid ROUTE_TEMPLATES")?;
    let fabricator =
        MetadataFabricator::new(config.metadata_mode, GatewayIdentity::from_config(config));
    let forwarder =
        InvocationForwarder::new(&config.invocation_endpoint, config.invocation_timeout)
            .context("invalid INVOCATION_ENDPOINT")?;

    Ok(GatewayHttpService::new(
        InboundTranslator::new(fabricator, routes),
        forwarder,
        build_http_config(config),
    ))
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: GatewayHttpService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.with_peer(peer_addr);
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Query the health route of a running gateway.
///
/// Succeeds when the gateway answers 200 and reports itself running.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request =
        format!("GET {HEALTH_PATH} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if is_healthy_response(&response) {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

fn is_healthy_response(raw: &str) -> bool {
    raw.starts_with("HTTP/1.1 200") && raw.contains("\"running\"")
}

/// Address a local health check should connect to for `listen_addr`.
fn health_check_addr(listen_addr: &str) -> String {
    listen_addr
        .replace("0.0.0.0", "127.0.0.1")
        .replace("[::]", "[::1]")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;

    // Handle --health-check flag for container HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let healthy = run_health_check(&health_check_addr(&config.gateway_listen))
            .await
            .is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level, config.log_format)?;

    let service = build_service(&config)?;

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        endpoint = %config.invocation_endpoint,
        timeout = ?config.invocation_timeout,
        metadata = ?config.metadata_mode,
        debug_routes = config.debug_routes,
        route_templates = config.route_templates.len(),
        version = VERSION,
        "starting apigw-local server",
    );

    serve(listener, service).await
}
