//! In-memory storage engine
//!
//! The only engine SandboxDB ships: a [`Directory`] of databases, each a
//! map of mutex-guarded tables. Nothing is persisted.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::criteria::Criteria;
use super::database::{Directory, TableHandle};
use super::engine::StorageEngine;
use super::id::IdPolicy;
use super::table::{InsertOptions, UpdateOptions};
use crate::document::Document;
use crate::error::Result;

/// In-memory storage engine
#[derive(Debug, Default)]
pub struct MemoryEngine {
    directory: Directory,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    fn table(&self, db: &str, table: &str) -> Result<TableHandle> {
        self.directory.resolve_table(db, table)
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    async fn create_database(&self, name: &str) -> Result<()> {
        self.directory.create(name)
    }

    async fn list_databases(&self) -> Result<Vec<String>> {
        Ok(self.directory.list())
    }

    async fn list_tables(&self, db: &str) -> Result<Vec<String>> {
        Ok(self.directory.resolve(db)?.table_names())
    }

    async fn create_table(&self, db: &str, table: &str, policy: IdPolicy) -> Result<()> {
        self.directory.resolve(db)?.create_table(table, policy)
    }

    async fn drop_table(&self, db: &str, table: &str) -> Result<()> {
        self.directory.resolve(db)?.drop_table(table)
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn insert(
        &self,
        db: &str,
        table: &str,
        documents: Vec<Document>,
        options: InsertOptions,
    ) -> Result<Vec<String>> {
        let handle = self.table(db, table)?;
        let ids = handle.lock().insert(documents, options)?;
        debug!(inserted = ids.len(), "Documents inserted");
        Ok(ids)
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn update(
        &self,
        db: &str,
        table: &str,
        documents: Vec<Document>,
        options: UpdateOptions,
    ) -> Result<()> {
        let handle = self.table(db, table)?;
        let result = handle.lock().update(documents, options);
        result
    }

    async fn get(&self, db: &str, table: &str, ids: &[String]) -> Result<Vec<Option<Document>>> {
        let handle = self.table(db, table)?;
        let documents = handle.lock().get(ids);
        Ok(documents)
    }

    async fn query(&self, db: &str, table: &str, criteria: Criteria) -> Result<Vec<Document>> {
        let handle = self.table(db, table)?;
        let documents = handle.lock().query(criteria);
        Ok(documents)
    }

    async fn count(&self, db: &str, table: &str, criteria: Criteria) -> Result<u64> {
        let handle = self.table(db, table)?;
        let count = handle.lock().count(criteria);
        Ok(count)
    }

    async fn remove(&self, db: &str, table: &str, ids: &[String]) -> Result<()> {
        let handle = self.table(db, table)?;
        handle.lock().remove(ids);
        Ok(())
    }

    async fn empty(&self, db: &str, table: &str) -> Result<()> {
        let handle = self.table(db, table)?;
        handle.lock().empty();
        Ok(())
    }
}
