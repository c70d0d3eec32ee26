//! HTTP routes definition

use axum::{
    extract::Extension,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::{database_handlers, handlers, AppState};

/// Database routes
///
/// - PUT /:db          - Create a database
/// - GET /_dbs         - List all databases
/// - GET /:db/_tables  - List tables in database
pub fn database_routes() -> Router {
    Router::new()
        .route("/_dbs", get(database_handlers::list_databases))
        .route("/:db", put(database_handlers::create_database))
        .route("/:db/_tables", get(database_handlers::list_tables))
}

/// Table and document routes
///
/// See [`handlers`] for the full table of endpoints.
pub fn table_routes() -> Router {
    Router::new()
        .route(
            "/:db/:table",
            put(handlers::create_table).delete(handlers::drop_table),
        )
        .route(
            "/:db/:table/document",
            post(handlers::insert).patch(handlers::update),
        )
        .route(
            "/:db/:table/document/:ids",
            get(handlers::get).delete(handlers::remove),
        )
        .route("/:db/:table/documents", delete(handlers::empty))
        .route("/:db/:table/query", post(handlers::query))
        .route("/:db/:table/count", post(handlers::count))
}

/// Health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/_health", get(health))
        .route("/_metrics", get(metrics_endpoint))
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
    uptime_seconds: i64,
    databases: usize,
    timestamp: String,
}

/// Liveness check
async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<HealthStatus> {
    let databases = state
        .storage
        .list_databases()
        .await
        .map(|dbs| dbs.len())
        .unwrap_or_default();
    let now = chrono::Utc::now();

    Json(HealthStatus {
        status: "healthy",
        version: crate::VERSION,
        uptime_seconds: (now - state.started_at).num_seconds(),
        databases,
        timestamp: now.to_rfc3339(),
    })
}

/// Prometheus metrics endpoint
async fn metrics_endpoint() -> String {
    crate::metrics::export_metrics()
}
