//! btm-ui library - interactive Brazil Tech Mapper
//!
//! Serves the table UI and the JSON/CSV endpoints behind it. Every request
//! recomputes the mapping from its own copy of the input; the registry cache
//! is the only state shared between requests.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use btm_common::registry::RegistryCache;

pub mod api;
pub mod error;
pub mod pagination;

/// Upload size cap (10MB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Memoized listed-company registry
    pub registry: Arc<RegistryCache>,
    /// Server-wide switch; when false the listed flag is never computed
    pub registry_enabled: bool,
}

impl AppState {
    /// Create new application state
    pub fn new(registry: Arc<RegistryCache>, registry_enabled: bool) -> Self {
        Self {
            registry,
            registry_enabled,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let api = Router::new()
        .route(
            "/api/companies",
            get(api::demo_companies).post(api::uploaded_companies),
        )
        .route("/api/export", get(api::export_demo).post(api::export_uploaded))
        .route("/api/registry", get(api::registry_status))
        .route("/api/registry/refresh", post(api::refresh_registry))
        .route("/api/buildinfo", get(api::get_build_info))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .merge(api::health_routes());

    Router::new()
        .merge(api)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and report the address actually bound
///
/// With port 0 the OS picks the port, so callers log the returned address.
pub async fn bind_listener(addr: &str) -> std::io::Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    Ok((listener, local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_reports_os_assigned_port() {
        let (_listener, local) = bind_listener("127.0.0.1:0").await.unwrap();
        assert!(local.ip().is_loopback());
        assert_ne!(local.port(), 0);
    }
}
