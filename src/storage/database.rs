//! Database hierarchy and management.
//!
//! # Overview
//!
//! SandboxDB organizes data in a three-level hierarchy:
//! ```text
//! Directory (name → Database)
//!   └─→ Database (name → Table)
//!        └─→ Table (id → Document)
//! ```
//!
//! Everything lives in memory and disappears with the process.
//!
//! # Concurrency
//!
//! Both levels are `DashMap`s, so creating a database or a table is a
//! single atomic entry operation: of two concurrent creates for the same
//! name exactly one wins. Each table sits behind its own
//! `parking_lot::Mutex`; unrelated tables never contend.
//!
//! # Examples
//!
//! ```rust
//! use sandboxdb::storage::{Directory, IdPolicy};
//!
//! let directory = Directory::new();
//! directory.create("app").unwrap();
//!
//! let db = directory.resolve("app").unwrap();
//! db.create_table("users", IdPolicy::Uuid).unwrap();
//!
//! assert!(directory.resolve_table("app", "users").is_ok());
//! assert!(directory.resolve_table("app", "posts").is_err());
//! ```

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use super::id::IdPolicy;
use super::table::Table;
use crate::document::MAX_IDENTIFIER_LEN;
use crate::error::{Error, Result};

/// Shared handle to a table. Lock it for the whole of an operation.
pub type TableHandle = Arc<Mutex<Table>>;

/// A named set of tables.
#[derive(Debug)]
pub struct Database {
    name: String,
    tables: DashMap<String, TableHandle>,
}

impl Database {
    fn new(name: String) -> Self {
        Self {
            name,
            tables: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a table with the given id policy.
    ///
    /// # Errors
    ///
    /// - `Validation` for a bad name or id policy
    /// - `TableExists` if the name is taken
    pub fn create_table(&self, name: &str, policy: IdPolicy) -> Result<()> {
        validate_name(name)?;
        policy.validate()?;

        match self.tables.entry(name.to_string()) {
            Entry::Occupied(_) => Err(Error::TableExists),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(Table::new(name, policy))));
                info!(database = %self.name, table = %name, policy = ?policy, "Table created");
                Ok(())
            }
        }
    }

    /// Looks up a table.
    ///
    /// # Errors
    ///
    /// - `UnknownTable` if no table has this name
    pub fn table(&self, name: &str) -> Result<TableHandle> {
        self.tables
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(Error::UnknownTable)
    }

    /// Removes a table and its documents.
    ///
    /// # Errors
    ///
    /// - `UnknownTable` if no table has this name
    pub fn drop_table(&self, name: &str) -> Result<()> {
        match self.tables.remove(name) {
            Some(_) => {
                info!(database = %self.name, table = %name, "Table dropped");
                Ok(())
            }
            None => Err(Error::UnknownTable),
        }
    }

    /// Table names, sorted alphabetically.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }
}

/// Process-wide set of databases.
///
/// Constructed explicitly and injected wherever it is needed; there is no
/// global instance.
#[derive(Debug, Default)]
pub struct Directory {
    databases: DashMap<String, Arc<Database>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty database.
    ///
    /// # Errors
    ///
    /// - `Validation` for a bad name
    /// - `DatabaseExists` if the name is taken
    pub fn create(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        match self.databases.entry(name.to_string()) {
            Entry::Occupied(_) => Err(Error::DatabaseExists),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Database::new(name.to_string())));
                info!(database = %name, "Database created");
                Ok(())
            }
        }
    }

    /// Looks up a database.
    ///
    /// # Errors
    ///
    /// - `UnknownDatabase` if no database has this name
    pub fn resolve(&self, name: &str) -> Result<Arc<Database>> {
        self.databases
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(Error::UnknownDatabase)
    }

    /// Looks up a table inside a database.
    ///
    /// # Errors
    ///
    /// - `UnknownDatabase` before `UnknownTable`
    pub fn resolve_table(&self, db_name: &str, table_name: &str) -> Result<TableHandle> {
        self.resolve(db_name)?.table(table_name)
    }

    /// Database names, sorted alphabetically.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .databases
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }
}

/// Validates a database or table name.
///
/// Names must be 1-250 ASCII letters or digits.
///
/// # Examples
///
/// ```rust
/// use sandboxdb::storage::validate_name;
///
/// assert!(validate_name("users").is_ok());
/// assert!(validate_name("Users2024").is_ok());
/// assert!(validate_name("").is_err());
/// assert!(validate_name("user_sessions").is_err());
/// assert!(validate_name(&"a".repeat(251)).is_err());
/// ```
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("Name cannot be empty".to_string()));
    }

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(Error::Validation(format!(
            "Name cannot be longer than {} characters",
            MAX_IDENTIFIER_LEN
        )));
    }

    if !name.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(Error::Validation(
            "Name can only contain letters and numbers".to_string(),
        ));
    }

    Ok(())
}
