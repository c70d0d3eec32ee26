//! HTTP route handlers for tables and documents
//!
//! - PUT    /:db/:table                 - Create table (body: `{"id": policy}`)
//! - DELETE /:db/:table                 - Drop table
//! - POST   /:db/:table/document        - Insert document(s) (`?replace=`)
//! - PATCH  /:db/:table/document        - Update/upsert document(s) (`?insert=`)
//! - GET    /:db/:table/document/:ids   - Fetch by comma-joined ids
//! - DELETE /:db/:table/document/:ids   - Remove by comma-joined ids
//! - DELETE /:db/:table/documents       - Empty table
//! - POST   /:db/:table/query           - Documents matching criteria
//! - POST   /:db/:table/count           - Count of documents matching criteria
//!
//! Names, ids, flags and bodies are validated before the store is touched.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{instrument, warn};

use super::{ApiError, AppState};
use crate::document::Document;
use crate::error::Error;
use crate::storage::{validate_name, Criteria, InsertOptions, Operation, UpdateOptions};
use crate::wire::{self, CreateTable, OneOrMany};

type Flags = HashMap<String, String>;

/// Turns a handler result into a response tagged with its operation.
///
/// The tag drives latency injection; the outcome is counted in metrics.
/// Metric series carry the database and table names only once the target is
/// known to exist, so malformed or unknown names never create new series.
pub(crate) fn finish<R: IntoResponse>(
    operation: Operation,
    db: &str,
    table: &str,
    result: Result<R, ApiError>,
) -> Response {
    let target_known = match &result {
        Ok(_) => true,
        Err(e) => e.error().confirms_target(),
    };
    let (db_label, table_label) = if target_known { (db, table) } else { ("", "") };
    crate::metrics::record_operation(operation, db_label, table_label, result.is_ok());

    let mut response = match result {
        Ok(output) => output.into_response(),
        Err(e) => {
            warn!(
                operation = operation.as_str(),
                database = %db,
                table = %table,
                status = e.status().as_u16(),
                error = %e.error(),
                "Operation failed"
            );
            e.into_response()
        }
    };
    response.extensions_mut().insert(operation);
    response
}

fn validate_target(db: &str, table: &str) -> Result<(), ApiError> {
    validate_name(db)?;
    validate_name(table)?;
    Ok(())
}

/// Reads the one flag an operation accepts, rejecting any other key.
fn flag(flags: &Flags, name: &str) -> Result<bool, ApiError> {
    if let Some(unknown) = flags.keys().find(|key| key.as_str() != name) {
        return Err(Error::Validation(format!("\"{}\" is not allowed", unknown)).into());
    }
    Ok(wire::parse_flag(name, flags.get(name).map(String::as_str))?)
}

fn documents(body: &Bytes, id_required: bool) -> Result<Vec<Document>, ApiError> {
    let documents = serde_json::from_slice::<OneOrMany<Document>>(body)
        .map_err(|_| ApiError::bad_documents())?
        .into_vec();

    for document in &documents {
        document
            .validate_id(id_required)
            .map_err(|_| ApiError::bad_documents())?;
    }
    Ok(documents)
}

fn criteria(body: &Bytes) -> Result<Criteria, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<Option<Document>>(body)
        .map_err(|e| Error::Validation(format!("Criteria must be an object or null: {}", e)).into())
}

/// Create a table
///
/// PUT /:db/:table
#[instrument(skip(state, body))]
pub async fn create_table(
    Extension(state): Extension<Arc<AppState>>,
    Path((db, table)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let result = async {
        validate_target(&db, &table)?;
        let payload: CreateTable = serde_json::from_slice(&body)
            .map_err(|e| Error::Validation(format!("Invalid table options: {}", e)))?;
        state.storage.create_table(&db, &table, payload.id).await?;
        Ok::<_, ApiError>(StatusCode::NO_CONTENT)
    }
    .await;

    finish(Operation::CreateTable, &db, &table, result)
}

/// Drop a table
///
/// DELETE /:db/:table
#[instrument(skip(state))]
pub async fn drop_table(
    Extension(state): Extension<Arc<AppState>>,
    Path((db, table)): Path<(String, String)>,
) -> Response {
    let result = async {
        validate_target(&db, &table)?;
        state.storage.drop_table(&db, &table).await?;
        Ok::<_, ApiError>(StatusCode::NO_CONTENT)
    }
    .await;

    finish(Operation::Drop, &db, &table, result)
}

/// Insert one or more documents, answering the ids in input order
///
/// POST /:db/:table/document?replace=bool
#[instrument(skip(state, body))]
pub async fn insert(
    Extension(state): Extension<Arc<AppState>>,
    Path((db, table)): Path<(String, String)>,
    Query(flags): Query<Flags>,
    body: Bytes,
) -> Response {
    let result = async {
        validate_target(&db, &table)?;
        let options = InsertOptions {
            replace: flag(&flags, wire::REPLACE_FLAG)?,
        };
        let documents = documents(&body, false)?;
        let ids = state.storage.insert(&db, &table, documents, options).await?;
        Ok::<_, ApiError>(Json(ids))
    }
    .await;

    finish(Operation::Insert, &db, &table, result)
}

/// Merge one or more documents into stored ones
///
/// PATCH /:db/:table/document?insert=bool
#[instrument(skip(state, body))]
pub async fn update(
    Extension(state): Extension<Arc<AppState>>,
    Path((db, table)): Path<(String, String)>,
    Query(flags): Query<Flags>,
    body: Bytes,
) -> Response {
    let result = async {
        validate_target(&db, &table)?;
        let options = UpdateOptions {
            insert: flag(&flags, wire::INSERT_FLAG)?,
        };
        let documents = documents(&body, true)?;
        state.storage.update(&db, &table, documents, options).await?;
        Ok::<_, ApiError>(StatusCode::NO_CONTENT)
    }
    .await;

    finish(Operation::Update, &db, &table, result)
}

/// Fetch documents by id; missing ones come back as null
///
/// GET /:db/:table/document/:ids
#[instrument(skip(state))]
pub async fn get(
    Extension(state): Extension<Arc<AppState>>,
    Path((db, table, ids)): Path<(String, String, String)>,
) -> Response {
    let result = async {
        validate_target(&db, &table)?;
        let ids = wire::parse_ids(&ids)?;
        let documents = state.storage.get(&db, &table, &ids).await?;
        Ok::<_, ApiError>(Json(documents))
    }
    .await;

    finish(Operation::Get, &db, &table, result)
}

/// Documents matching the criteria body
///
/// POST /:db/:table/query
#[instrument(skip(state, body))]
pub async fn query(
    Extension(state): Extension<Arc<AppState>>,
    Path((db, table)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let result = async {
        validate_target(&db, &table)?;
        let criteria = criteria(&body)?;
        let documents = state.storage.query(&db, &table, criteria).await?;
        Ok::<_, ApiError>(Json(documents))
    }
    .await;

    finish(Operation::Query, &db, &table, result)
}

/// Number of documents matching the criteria body
///
/// POST /:db/:table/count
#[instrument(skip(state, body))]
pub async fn count(
    Extension(state): Extension<Arc<AppState>>,
    Path((db, table)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let result = async {
        validate_target(&db, &table)?;
        let criteria = criteria(&body)?;
        let count = state.storage.count(&db, &table, criteria).await?;
        Ok::<_, ApiError>(Json(count))
    }
    .await;

    finish(Operation::Count, &db, &table, result)
}

/// Remove documents by id; unknown ids are ignored
///
/// DELETE /:db/:table/document/:ids
#[instrument(skip(state))]
pub async fn remove(
    Extension(state): Extension<Arc<AppState>>,
    Path((db, table, ids)): Path<(String, String, String)>,
) -> Response {
    let result = async {
        validate_target(&db, &table)?;
        let ids = wire::parse_ids(&ids)?;
        state.storage.remove(&db, &table, &ids).await?;
        Ok::<_, ApiError>(StatusCode::NO_CONTENT)
    }
    .await;

    finish(Operation::Remove, &db, &table, result)
}

/// Remove every document, keeping the table
///
/// DELETE /:db/:table/documents
#[instrument(skip(state))]
pub async fn empty(
    Extension(state): Extension<Arc<AppState>>,
    Path((db, table)): Path<(String, String)>,
) -> Response {
    let result = async {
        validate_target(&db, &table)?;
        state.storage.empty(&db, &table).await?;
        Ok::<_, ApiError>(StatusCode::NO_CONTENT)
    }
    .await;

    finish(Operation::Empty, &db, &table, result)
}
