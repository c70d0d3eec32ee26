//! SandboxDB Server Implementation
//!
//! HTTP surface over the storage engine, built on axum.

pub mod database_handlers;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

use axum::{extract::DefaultBodyLimit, extract::Extension, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::storage::{Access, Storage};

pub use error::ApiError;

/// Artificial per-operation latency.
///
/// Applied after a handler finished, so it never holds a table lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyConfig {
    pub read: Duration,
    pub write: Duration,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            read: Duration::from_millis(10),
            write: Duration::from_millis(50),
        }
    }
}

impl LatencyConfig {
    /// No injected latency.
    pub fn none() -> Self {
        Self {
            read: Duration::ZERO,
            write: Duration::ZERO,
        }
    }

    pub fn delay(&self, access: Access) -> Duration {
        match access {
            Access::Read => self.read,
            Access::Write => self.write,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: String,
    /// HTTP port
    pub http_port: u16,
    /// Injected latency
    pub latency: LatencyConfig,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1".to_string(),
            http_port: 8080,
            latency: LatencyConfig::default(),
            enable_cors: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `SANDBOXDB_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let http_addr = std::env::var("SANDBOXDB_BIND").unwrap_or(defaults.http_addr);

        let http_port = std::env::var("SANDBOXDB_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.http_port);

        let read = std::env::var("SANDBOXDB_READ_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.latency.read);

        let write = std::env::var("SANDBOXDB_WRITE_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.latency.write);

        Self {
            http_addr,
            http_port,
            latency: LatencyConfig { read, write },
            ..defaults
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub latency: LatencyConfig,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("latency", &self.latency)
            .field("started_at", &self.started_at)
            .finish()
    }
}

impl AppState {
    pub fn new(storage: Arc<Storage>, latency: LatencyConfig) -> Self {
        Self {
            storage,
            latency,
            started_at: chrono::Utc::now(),
        }
    }
}

/// Build the router with every route and layer.
pub fn app(config: &ServerConfig, storage: Arc<Storage>) -> Router {
    crate::metrics::init_metrics();

    let state = AppState::new(storage, config.latency);

    let app = Router::new()
        .merge(routes::health_routes())
        .merge(routes::database_routes())
        .merge(routes::table_routes())
        .layer(axum::middleware::from_fn(middleware::inject_latency))
        .layer(Extension(Arc::new(state)))
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Serve on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, config: &ServerConfig, storage: Arc<Storage>) -> anyhow::Result<()> {
    let app = app(config, storage);

    axum::serve(listener, app).await.map_err(|e| {
        error!(error = %e, "Server error");
        anyhow::anyhow!("Server failed: {}", e)
    })
}

/// Start the SandboxDB server
pub async fn start_server(config: ServerConfig, storage: Arc<Storage>) -> anyhow::Result<()> {
    info!(
        addr = %config.http_addr,
        port = config.http_port,
        read_delay_ms = config.latency.read.as_millis() as u64,
        write_delay_ms = config.latency.write.as_millis() as u64,
        "Starting SandboxDB HTTP server"
    );

    let addr = format!("{}:{}", config.http_addr, config.http_port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Health: http://{}/_health", addr);
    info!("Metrics: http://{}/_metrics", addr);

    serve(listener, &config, storage).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = ServerConfig {
            latency: LatencyConfig::none(),
            ..ServerConfig::default()
        };
        app(&config, Arc::new(Storage::in_memory()))
    }

    fn put(uri: &str, body: &'static str) -> Request<Body> {
        Request::put(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn test_latency_by_access() {
        let latency = LatencyConfig::default();
        assert_eq!(latency.delay(Access::Read), Duration::from_millis(10));
        assert_eq!(latency.delay(Access::Write), Duration::from_millis(50));
        assert!(LatencyConfig::none().delay(Access::Write).is_zero());
    }

    #[tokio::test]
    async fn test_database_and_table_routes() {
        let app = test_app();

        let response = app.clone().oneshot(put("/test", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.clone().oneshot(put("/test", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(put("/test/items", r#"{"id":{"type":"uuid"}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(Request::get("/test/_tables").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"["items"]"#);

        let response = app
            .oneshot(put("/bad-name", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejected_names_leave_no_metric_series() {
        let app = test_app();

        for i in 0..50 {
            let response = app
                .clone()
                .oneshot(
                    Request::post(format!("/ghostdb{}/bad-name-{}/count", i, i))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let response = app
                .clone()
                .oneshot(
                    Request::post(format!("/ghostdb{}/items{}/count", i, i))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        let exported = crate::metrics::export_metrics();
        assert!(!exported.contains("ghostdb"));
        assert!(!exported.contains("bad-name"));
    }
}
