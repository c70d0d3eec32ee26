//! Storage engine trait

use async_trait::async_trait;
use serde::Serialize;

use super::criteria::Criteria;
use super::id::IdPolicy;
use super::table::{InsertOptions, UpdateOptions};
use crate::document::Document;
use crate::error::Result;

/// Whether an operation only observes state or changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Read,
    Write,
}

/// Every operation the store exposes, for classification and labelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateDatabase,
    ListDatabases,
    ListTables,
    CreateTable,
    Insert,
    Update,
    Get,
    Query,
    Count,
    Remove,
    Empty,
    Drop,
}

impl Operation {
    pub fn access(&self) -> Access {
        match self {
            Operation::ListDatabases
            | Operation::ListTables
            | Operation::Get
            | Operation::Query
            | Operation::Count => Access::Read,
            Operation::CreateDatabase
            | Operation::CreateTable
            | Operation::Insert
            | Operation::Update
            | Operation::Remove
            | Operation::Empty
            | Operation::Drop => Access::Write,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateDatabase => "create_database",
            Operation::ListDatabases => "list_databases",
            Operation::ListTables => "list_tables",
            Operation::CreateTable => "create_table",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Get => "get",
            Operation::Query => "query",
            Operation::Count => "count",
            Operation::Remove => "remove",
            Operation::Empty => "empty",
            Operation::Drop => "drop",
        }
    }
}

/// Storage engine trait
///
/// Every table operation is addressed by database and table name and fails
/// with `UnknownDatabase` or `UnknownTable` when the target is missing.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Create a database
    async fn create_database(&self, name: &str) -> Result<()>;

    /// List all databases
    async fn list_databases(&self) -> Result<Vec<String>>;

    /// List tables in a database
    async fn list_tables(&self, db: &str) -> Result<Vec<String>>;

    /// Create a table
    async fn create_table(&self, db: &str, table: &str, policy: IdPolicy) -> Result<()>;

    /// Drop a table
    async fn drop_table(&self, db: &str, table: &str) -> Result<()>;

    /// Store documents, returning their ids in input order
    async fn insert(
        &self,
        db: &str,
        table: &str,
        documents: Vec<Document>,
        options: InsertOptions,
    ) -> Result<Vec<String>>;

    /// Merge (or upsert) documents by id
    async fn update(
        &self,
        db: &str,
        table: &str,
        documents: Vec<Document>,
        options: UpdateOptions,
    ) -> Result<()>;

    /// Fetch documents by id, `None` for missing ones
    async fn get(&self, db: &str, table: &str, ids: &[String]) -> Result<Vec<Option<Document>>>;

    /// Scan for documents matching the criteria
    async fn query(&self, db: &str, table: &str, criteria: Criteria) -> Result<Vec<Document>>;

    /// Count documents matching the criteria
    async fn count(&self, db: &str, table: &str, criteria: Criteria) -> Result<u64>;

    /// Delete documents by id
    async fn remove(&self, db: &str, table: &str, ids: &[String]) -> Result<()>;

    /// Delete every document of a table
    async fn empty(&self, db: &str, table: &str) -> Result<()>;
}

/// Main storage interface
pub struct Storage {
    engine: Box<dyn StorageEngine>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish()
    }
}

impl Storage {
    pub fn new(engine: Box<dyn StorageEngine>) -> Self {
        Self { engine }
    }

    /// Storage backed by a fresh, empty in-memory engine.
    pub fn in_memory() -> Self {
        Self::new(Box::new(super::memory::MemoryEngine::new()))
    }

    pub async fn create_database(&self, name: &str) -> Result<()> {
        self.engine.create_database(name).await
    }

    pub async fn list_databases(&self) -> Result<Vec<String>> {
        self.engine.list_databases().await
    }

    pub async fn list_tables(&self, db: &str) -> Result<Vec<String>> {
        self.engine.list_tables(db).await
    }

    pub async fn create_table(&self, db: &str, table: &str, policy: IdPolicy) -> Result<()> {
        self.engine.create_table(db, table, policy).await
    }

    pub async fn drop_table(&self, db: &str, table: &str) -> Result<()> {
        self.engine.drop_table(db, table).await
    }

    pub async fn insert(
        &self,
        db: &str,
        table: &str,
        documents: Vec<Document>,
        options: InsertOptions,
    ) -> Result<Vec<String>> {
        self.engine.insert(db, table, documents, options).await
    }

    pub async fn update(
        &self,
        db: &str,
        table: &str,
        documents: Vec<Document>,
        options: UpdateOptions,
    ) -> Result<()> {
        self.engine.update(db, table, documents, options).await
    }

    pub async fn get(&self, db: &str, table: &str, ids: &[String]) -> Result<Vec<Option<Document>>> {
        self.engine.get(db, table, ids).await
    }

    pub async fn query(&self, db: &str, table: &str, criteria: Criteria) -> Result<Vec<Document>> {
        self.engine.query(db, table, criteria).await
    }

    pub async fn count(&self, db: &str, table: &str, criteria: Criteria) -> Result<u64> {
        self.engine.count(db, table, criteria).await
    }

    pub async fn remove(&self, db: &str, table: &str, ids: &[String]) -> Result<()> {
        self.engine.remove(db, table, ids).await
    }

    pub async fn empty(&self, db: &str, table: &str) -> Result<()> {
        self.engine.empty(db, table).await
    }
}
