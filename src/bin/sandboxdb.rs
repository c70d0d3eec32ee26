//! SandboxDB Server Binary
//!
//! Runs the HTTP server, and talks to a running one for quick inspection.
//!
//! # Examples
//!
//! ```bash
//! # Start server without artificial latency
//! sandboxdb serve --port 8080 --read-delay-ms 0 --write-delay-ms 0
//!
//! # Create a database and a base62 table
//! sandboxdb db create test
//! sandboxdb table create --db test users --initial 1000 --radix 62
//!
//! # Insert and read back
//! sandboxdb doc insert --db test --table users '[{"a":1},{"a":2}]'
//! sandboxdb doc get --db test --table users g8,g9
//! ```

use clap::{Args, Parser, Subcommand};
use sandboxdb::server::{start_server, LatencyConfig, ServerConfig};
use sandboxdb::storage::{InsertOptions, MemoryEngine};
use sandboxdb::wire::OneOrMany;
use sandboxdb::{Client, ClientConfig, Document, IdPolicy, Storage};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// SandboxDB - disposable in-memory document store
#[derive(Parser, Debug)]
#[command(name = "sandboxdb")]
#[command(version = sandboxdb::VERSION)]
#[command(about = "SandboxDB - disposable in-memory document store over HTTP", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Server URL used by client commands
    #[arg(
        long,
        global = true,
        default_value = "http://127.0.0.1:8080",
        env = "SANDBOXDB_LOCATION"
    )]
    location: String,

    /// Request timeout for client commands (seconds)
    #[arg(long, global = true, default_value = "30", env = "SANDBOXDB_TIMEOUT")]
    timeout: u64,

    /// Log directory path
    #[arg(long, global = true, default_value = "logs", env = "SANDBOXDB_LOG_DIR")]
    log_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the SandboxDB server
    Serve(ServeArgs),

    /// Database operations
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Table operations
    Table {
        #[command(subcommand)]
        command: TableCommands,
    },

    /// Document operations
    Doc {
        #[command(subcommand)]
        command: DocCommands,
    },

    /// Show version
    Version,
}

/// Server configuration arguments
#[derive(Args, Debug)]
struct ServeArgs {
    /// HTTP bind address
    #[arg(short, long, default_value = "127.0.0.1", env = "SANDBOXDB_BIND")]
    bind: String,

    /// HTTP port
    #[arg(short, long, default_value = "8080", env = "SANDBOXDB_PORT")]
    port: u16,

    /// Latency added to read operations (milliseconds)
    #[arg(long, default_value = "10", env = "SANDBOXDB_READ_DELAY_MS")]
    read_delay_ms: u64,

    /// Latency added to write operations (milliseconds)
    #[arg(long, default_value = "50", env = "SANDBOXDB_WRITE_DELAY_MS")]
    write_delay_ms: u64,

    /// Disable CORS
    #[arg(long)]
    no_cors: bool,

    /// Maximum request body size (MB)
    #[arg(long, default_value = "10")]
    max_body_size: usize,
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    /// Create a database
    Create {
        /// Database name
        name: String,
    },

    /// List all databases
    List,
}

#[derive(Subcommand, Debug)]
enum TableCommands {
    /// Create a table
    Create {
        #[arg(short, long)]
        db: String,
        /// Table name
        name: String,
        /// Allocate random UUID ids
        #[arg(long, conflicts_with_all = ["initial", "radix"])]
        uuid: bool,
        /// First allocated id
        #[arg(long, default_value = "1")]
        initial: u64,
        /// Radix ids are rendered in (2-36 or 62)
        #[arg(long, default_value = "10")]
        radix: u32,
    },

    /// Drop a table
    Drop {
        #[arg(short, long)]
        db: String,
        name: String,
    },

    /// Delete every document of a table
    Empty {
        #[arg(short, long)]
        db: String,
        name: String,
    },

    /// Count documents of a table
    Count {
        #[arg(short, long)]
        db: String,
        name: String,
    },

    /// List tables of a database
    List {
        #[arg(short, long)]
        db: String,
    },
}

#[derive(Subcommand, Debug)]
enum DocCommands {
    /// Insert a document or an array of documents
    Insert {
        #[arg(short, long)]
        db: String,
        #[arg(short, long)]
        table: String,
        /// Overwrite documents with existing ids
        #[arg(long)]
        replace: bool,
        /// JSON object or array of objects
        json: String,
    },

    /// Fetch documents by id
    Get {
        #[arg(short, long)]
        db: String,
        #[arg(short, long)]
        table: String,
        /// Comma-separated ids
        #[arg(value_delimiter = ',', required = true)]
        ids: Vec<String>,
    },

    /// Documents matching a criteria object
    Query {
        #[arg(short, long)]
        db: String,
        #[arg(short, long)]
        table: String,
        /// JSON criteria object; omitted matches everything
        criteria: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli)?;

    let client_config = |database: String| ClientConfig {
        location: cli.location.clone(),
        database,
        timeout: Duration::from_secs(cli.timeout),
    };

    match cli.command {
        Commands::Serve(ref args) => serve_command(args).await,
        Commands::Db { ref command } => db_command(&client_config, command).await,
        Commands::Table { ref command } => table_command(&client_config, command).await,
        Commands::Doc { ref command } => doc_command(&client_config, command).await,
        Commands::Version => {
            println!("SandboxDB {}", sandboxdb::VERSION);
            Ok(())
        }
    }
}

/// Setup logging with rolling files and console output
fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    std::fs::create_dir_all(&cli.log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &cli.log_dir, "sandboxdb.log");

    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color)
                .pretty(),
        )
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(())
}

async fn serve_command(args: &ServeArgs) -> anyhow::Result<()> {
    info!(version = %sandboxdb::VERSION, "SandboxDB starting");

    let storage = Arc::new(Storage::new(Box::new(MemoryEngine::new())));

    let config = ServerConfig {
        http_addr: args.bind.clone(),
        http_port: args.port,
        latency: LatencyConfig {
            read: Duration::from_millis(args.read_delay_ms),
            write: Duration::from_millis(args.write_delay_ms),
        },
        enable_cors: !args.no_cors,
        max_body_size: args.max_body_size * 1024 * 1024,
    };

    start_server(config, storage).await
}

async fn db_command(
    config: &impl Fn(String) -> ClientConfig,
    command: &DbCommands,
) -> anyhow::Result<()> {
    match command {
        DbCommands::Create { name } => {
            Client::new(config(name.clone()))?.create().await?;
            println!("Created database '{}'", name);
        }
        DbCommands::List => {
            let client = Client::new(config(String::new()))?;
            for db in client.list_databases().await? {
                println!("{}", db);
            }
        }
    }
    Ok(())
}

async fn table_command(
    config: &impl Fn(String) -> ClientConfig,
    command: &TableCommands,
) -> anyhow::Result<()> {
    match command {
        TableCommands::Create {
            db,
            name,
            uuid,
            initial,
            radix,
        } => {
            let policy = if *uuid {
                IdPolicy::Uuid
            } else {
                IdPolicy::Increment {
                    initial: *initial,
                    radix: *radix,
                }
            };
            Client::new(config(db.clone()))?
                .create_table(name.as_str(), policy)
                .await?;
            println!("Created table '{}.{}'", db, name);
        }
        TableCommands::Drop { db, name } => {
            Client::new(config(db.clone()))?.table(name.as_str()).drop().await?;
            println!("Dropped table '{}.{}'", db, name);
        }
        TableCommands::Empty { db, name } => {
            Client::new(config(db.clone()))?.table(name.as_str()).empty().await?;
            println!("Emptied table '{}.{}'", db, name);
        }
        TableCommands::Count { db, name } => {
            let count = Client::new(config(db.clone()))?
                .table(name.as_str())
                .count(None)
                .await?;
            println!("{}", count);
        }
        TableCommands::List { db } => {
            for table in Client::new(config(db.clone()))?.list_tables().await? {
                println!("{}", table);
            }
        }
    }
    Ok(())
}

async fn doc_command(
    config: &impl Fn(String) -> ClientConfig,
    command: &DocCommands,
) -> anyhow::Result<()> {
    match command {
        DocCommands::Insert {
            db,
            table,
            replace,
            json,
        } => {
            let documents = serde_json::from_str::<OneOrMany<Document>>(json)?.into_vec();
            let options = InsertOptions { replace: *replace };
            let ids = Client::new(config(db.clone()))?
                .table(table.as_str())
                .insert_many(&documents, Some(options))
                .await?;
            println!("{}", serde_json::to_string(&ids)?);
        }
        DocCommands::Get { db, table, ids } => {
            let documents = Client::new(config(db.clone()))?
                .table(table.as_str())
                .get_many(ids)
                .await?;
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }
        DocCommands::Query {
            db,
            table,
            criteria,
        } => {
            let criteria = criteria
                .as_deref()
                .map(serde_json::from_str::<Document>)
                .transpose()?;
            let documents = Client::new(config(db.clone()))?
                .table(table.as_str())
                .query(criteria.as_ref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }
    }
    Ok(())
}
