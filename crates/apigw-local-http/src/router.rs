//! Listener-level routing.
//!
//! Requests under the reserved `/_apigw` prefix are answered by the gateway
//! itself; everything else is forwarded to the function.
//!
//! | Path                   | Route                                     |
//! |------------------------|-------------------------------------------|
//! | `GET /_apigw/health`   | health check                              |
//! | `/_apigw/event{path}`  | proxy event for `{path}` as JSON          |
//! | `/_apigw/dump{path}`   | proxy event for `{path}` as a typed tree  |
//! | anything else          | forwarded                                 |

/// Health check path.
pub const HEALTH_PATH: &str = "/_apigw/health";
/// Prefix of the structured debug view.
pub const DEBUG_EVENT_PREFIX: &str = "/_apigw/event";
/// Prefix of the type-annotated debug view.
pub const DEBUG_DUMP_PREFIX: &str = "/_apigw/dump";

/// How a debug route renders the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugView {
    /// Pretty-printed JSON, exactly what the function would receive.
    Structured,
    /// Indented tree with a JSON type on every value.
    Dump,
}

/// What the listener does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Report liveness without touching the function.
    Health,
    /// Build the event for `path` and return it instead of forwarding.
    Debug {
        /// Rendering of the event.
        view: DebugView,
        /// Path the event is built for, with the debug prefix removed.
        path: String,
    },
    /// Translate and forward to the function.
    Forward,
}

/// Pick the route for a request.
///
/// With `debug_routes` off, debug prefixes are forwarded like any other path.
#[must_use]
pub fn resolve_route(method: &http::Method, path: &str, debug_routes: bool) -> Route {
    if path == HEALTH_PATH && (method == http::Method::GET || method == http::Method::HEAD) {
        return Route::Health;
    }
    if !debug_routes {
        return Route::Forward;
    }

    let views = [
        (DEBUG_EVENT_PREFIX, DebugView::Structured),
        (DEBUG_DUMP_PREFIX, DebugView::Dump),
    ];
    views
        .into_iter()
        .find_map(|(prefix, view)| {
            strip_route_prefix(path, prefix).map(|path| Route::Debug { view, path })
        })
        .unwrap_or(Route::Forward)
}

/// Strip `prefix` when it ends on a segment boundary.
fn strip_route_prefix(path: &str, prefix: &str) -> Option<String> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some("/".to_owned());
    }
    rest.starts_with('/').then(|| rest.to_owned())
}
