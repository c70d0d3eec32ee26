//! Storage layer
//!
//! # Architecture
//!
//! SandboxDB has a hierarchical, purely in-memory storage structure:
//!
//! ```text
//! Directory (name → Database)
//!   └─→ Database (name → Table)
//!        └─→ Table (id → Document, plus id allocation state)
//! ```
//!
//! ## Storage Engine
//!
//! The `StorageEngine` trait is the interface the server talks to:
//! - Database creation and listing
//! - Table creation, dropping and listing (scoped to databases)
//! - Document insert/update/get/query/count/remove/empty (scoped to tables)
//!
//! `MemoryEngine` is the implementation; `Storage` wraps whichever engine
//! is in use.

pub mod criteria;
pub mod database;
pub mod engine;
pub mod id;
pub mod memory;
pub mod table;

pub use criteria::{matches, Criteria};
pub use database::{validate_name, Database, Directory, TableHandle};
pub use engine::{Access, Operation, Storage, StorageEngine};
pub use id::{IdAllocator, IdPolicy, BASE62_ALPHABET};
pub use memory::MemoryEngine;
pub use table::{InsertOptions, Table, UpdateOptions};
