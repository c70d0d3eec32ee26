// SandboxDB - Rust Implementation
// A disposable in-memory document store over HTTP

#![warn(rust_2018_idioms)]

pub mod client;
pub mod document;
pub mod metrics;
pub mod server;
pub mod storage;
pub mod wire;

// Re-exports for convenience
pub use client::{Client, ClientConfig, ClientError};
pub use document::{Datum, Document};
pub use storage::{IdPolicy, Storage, StorageEngine};

/// SandboxDB error types
///
/// The display text of each store variant is the message sent to remote
/// callers, and the text a client re-raises.
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum Error {
        #[error("Database exists")]
        DatabaseExists,

        #[error("Unknown database")]
        UnknownDatabase,

        #[error("Table exists")]
        TableExists,

        #[error("Unknown table")]
        UnknownTable,

        #[error("Document exists")]
        DocumentExists,

        #[error("Cannot update unknown document")]
        DocumentNotFound,

        /// Malformed name, id, document or policy; caught before the store
        /// changes anything.
        #[error("{0}")]
        Validation(String),

        /// Remote failure whose code this build does not know.
        #[error("{0}")]
        Rejected(String),
    }

    impl Error {
        /// Stable snake_case identifier carried in error bodies.
        pub fn code(&self) -> &'static str {
            match self {
                Error::DatabaseExists => "database_exists",
                Error::UnknownDatabase => "unknown_database",
                Error::TableExists => "table_exists",
                Error::UnknownTable => "unknown_table",
                Error::DocumentExists => "document_exists",
                Error::DocumentNotFound => "document_not_found",
                Error::Validation(_) => "validation",
                Error::Rejected(_) => "rejected",
            }
        }

        /// True when the failure proves the addressed database (and table,
        /// for table operations) exists.
        pub fn confirms_target(&self) -> bool {
            matches!(
                self,
                Error::DatabaseExists
                    | Error::TableExists
                    | Error::DocumentExists
                    | Error::DocumentNotFound
            )
        }

        /// Rebuilds an error from a remote code and message.
        pub fn from_code(code: Option<&str>, message: String) -> Self {
            match code {
                Some("database_exists") => Error::DatabaseExists,
                Some("unknown_database") => Error::UnknownDatabase,
                Some("table_exists") => Error::TableExists,
                Some("unknown_table") => Error::UnknownTable,
                Some("document_exists") => Error::DocumentExists,
                Some("document_not_found") => Error::DocumentNotFound,
                Some("validation") => Error::Validation(message),
                _ => Error::Rejected(message),
            }
        }
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
