//! Database-specific HTTP handlers
//!
//! Provides REST API endpoints for database operations:
//! - PUT /:db - Create a database
//! - GET /_dbs - List all databases
//! - GET /:db/_tables - List tables in a database

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::handlers::finish;
use super::{ApiError, AppState};
use crate::storage::{validate_name, Operation};

/// Create a new database
///
/// PUT /:db
#[instrument(skip(state))]
pub async fn create_database(
    Extension(state): Extension<Arc<AppState>>,
    Path(db): Path<String>,
) -> Response {
    let result = async {
        validate_name(&db)?;
        state.storage.create_database(&db).await?;
        info!(database = %db, "Database created");

        let databases = state.storage.list_databases().await?;
        crate::metrics::set_database_count(databases.len());
        Ok::<_, ApiError>(StatusCode::NO_CONTENT)
    }
    .await;

    finish(Operation::CreateDatabase, &db, "", result)
}

/// List all databases
///
/// GET /_dbs
#[instrument(skip(state))]
pub async fn list_databases(Extension(state): Extension<Arc<AppState>>) -> Response {
    let result = async {
        let databases = state.storage.list_databases().await?;
        Ok::<_, ApiError>(Json(databases))
    }
    .await;

    finish(Operation::ListDatabases, "", "", result)
}

/// List tables in a database
///
/// GET /:db/_tables
#[instrument(skip(state))]
pub async fn list_tables(
    Extension(state): Extension<Arc<AppState>>,
    Path(db): Path<String>,
) -> Response {
    let result = async {
        validate_name(&db)?;
        let tables = state.storage.list_tables(&db).await?;
        Ok::<_, ApiError>(Json(tables))
    }
    .await;

    finish(Operation::ListTables, &db, "", result)
}
