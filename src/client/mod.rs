//! Typed HTTP client for a SandboxDB server.
//!
//! A [`Client`] is bound to one database; [`Client::table`] hands out
//! lightweight [`Table`] handles that issue the document operations.
//!
//! ```no_run
//! use sandboxdb::{Client, ClientConfig, Document, IdPolicy};
//!
//! # async fn run() -> Result<(), sandboxdb::ClientError> {
//! let client = Client::new(ClientConfig::new("http://127.0.0.1:8080", "test"))?;
//! client.create().await?;
//!
//! let users = client.create_table("users", IdPolicy::default()).await?;
//! let id = users.insert(&Document::new(), None).await?;
//! let stored = users.get(&id).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Failures come back as [`ClientError`]: `Store` carries the store error
//! the server answered with, `Transport` everything below the protocol
//! (connection refused, timeouts, undecodable responses).

use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::document::Document;
use crate::error::Error;
use crate::storage::{IdPolicy, InsertOptions, UpdateOptions};
use crate::wire::{self, CreateTable, ErrorBody};

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a usable answer.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The server rejected the request.
    #[error(transparent)]
    Store(#[from] Error),
}

impl ClientError {
    /// The store error, if the server answered with one.
    pub fn store(&self) -> Option<&Error> {
        match self {
            ClientError::Store(e) => Some(e),
            ClientError::Transport(_) => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, e.g. `http://127.0.0.1:8080`
    pub location: String,
    /// Database every table handle addresses
    pub database: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(location: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            database: database.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client bound to one database
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    location: String,
    database: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            location: config.location.trim_end_matches('/').to_string(),
            database: config.database,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Create the database this client is bound to
    #[instrument(skip(self), fields(database = %self.database))]
    pub async fn create(&self) -> Result<()> {
        let url = format!("{}/{}", self.location, self.database);
        self.send(Method::PUT, &url, None::<&()>).await?;
        Ok(())
    }

    /// Names of every database on the server
    pub async fn list_databases(&self) -> Result<Vec<String>> {
        let url = format!("{}/_dbs", self.location);
        let response = self.send(Method::GET, &url, None::<&()>).await?;
        Ok(response.json().await?)
    }

    /// Names of the tables in this client's database
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let url = format!("{}/{}/_tables", self.location, self.database);
        let response = self.send(Method::GET, &url, None::<&()>).await?;
        Ok(response.json().await?)
    }

    /// Handle for a table; nothing is sent until an operation is called.
    pub fn table(&self, name: impl Into<String>) -> Table {
        Table {
            client: self.clone(),
            name: name.into(),
        }
    }

    /// Create a table and return its handle
    pub async fn create_table(&self, name: impl Into<String>, policy: IdPolicy) -> Result<Table> {
        let table = self.table(name);
        table.create(policy).await?;
        Ok(table)
    }

    fn table_url<S: AsRef<str>>(
        &self,
        table: &str,
        path: &str,
        ids: &[S],
        flags: &[(&str, bool)],
    ) -> String {
        format!(
            "{}/{}/{}{}{}{}",
            self.location,
            self.database,
            table,
            path,
            wire::id_selector(ids),
            wire::query_string(flags)
        )
    }

    /// Send a request, turning non-success answers into errors.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        debug!(%method, url, "Sending request");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status_error = response.error_for_status_ref().err();
        let bytes = response.bytes().await?;

        match serde_json::from_slice::<ErrorBody>(&bytes) {
            Ok(body) => {
                debug!(status = status.as_u16(), message = %body.message, "Request rejected");
                Err(ClientError::Store(body.into_error()))
            }
            Err(_) => match status_error {
                Some(e) => Err(ClientError::Transport(e)),
                None => Err(ClientError::Store(Error::Rejected(format!(
                    "Unexpected response status {}",
                    status
                )))),
            },
        }
    }
}

fn insert_flags(options: Option<InsertOptions>) -> Vec<(&'static str, bool)> {
    options
        .map(|o| vec![(wire::REPLACE_FLAG, o.replace)])
        .unwrap_or_default()
}

fn update_flags(options: Option<UpdateOptions>) -> Vec<(&'static str, bool)> {
    options
        .map(|o| vec![(wire::INSERT_FLAG, o.insert)])
        .unwrap_or_default()
}

/// Handle for one table of the client's database.
///
/// Singular methods take and return one item; the `_many` variants take
/// and return lists in the same order.
#[derive(Debug, Clone)]
pub struct Table {
    client: Client,
    name: String,
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn url<S: AsRef<str>>(&self, path: &str, ids: &[S], flags: &[(&str, bool)]) -> String {
        self.client.table_url(&self.name, path, ids, flags)
    }

    async fn fetch<T, B>(&self, method: Method, url: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.client.send(method, url, body).await?;
        Ok(response.json().await?)
    }

    /// Create this table with the given id policy
    #[instrument(skip(self), fields(table = %self.name))]
    pub async fn create(&self, policy: IdPolicy) -> Result<()> {
        let url = self.url::<&str>("", &[], &[]);
        self.client
            .send(Method::PUT, &url, Some(&CreateTable { id: policy }))
            .await?;
        Ok(())
    }

    /// Fetch one document, `None` when it does not exist
    pub async fn get(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.get_many(&[id]).await?.into_iter().next().flatten())
    }

    /// Fetch documents by id, `None` in place of each missing one
    #[instrument(skip(self, ids), fields(table = %self.name, count = ids.len()))]
    pub async fn get_many<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Option<Document>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.url(wire::DOCUMENT, ids, &[]);
        self.fetch(Method::GET, &url, None::<&()>).await
    }

    /// Documents matching the criteria; `None` matches everything
    #[instrument(skip(self, criteria), fields(table = %self.name))]
    pub async fn query(&self, criteria: Option<&Document>) -> Result<Vec<Document>> {
        let url = self.url::<&str>(wire::QUERY, &[], &[]);
        self.fetch(Method::POST, &url, Some(&criteria)).await
    }

    /// Number of documents matching the criteria
    #[instrument(skip(self, criteria), fields(table = %self.name))]
    pub async fn count(&self, criteria: Option<&Document>) -> Result<u64> {
        let url = self.url::<&str>(wire::COUNT, &[], &[]);
        self.fetch(Method::POST, &url, Some(&criteria)).await
    }

    /// Insert one document, returning its id
    pub async fn insert(&self, document: &Document, options: Option<InsertOptions>) -> Result<String> {
        let ids: Vec<String> = self.send_documents(Method::POST, document, insert_flags(options)).await?;
        ids.into_iter().next().ok_or_else(|| {
            ClientError::Store(Error::Rejected("Insert answered no id".to_string()))
        })
    }

    /// Insert documents, returning their ids in input order
    #[instrument(skip(self, documents), fields(table = %self.name, count = documents.len()))]
    pub async fn insert_many(
        &self,
        documents: &[Document],
        options: Option<InsertOptions>,
    ) -> Result<Vec<String>> {
        self.send_documents(Method::POST, documents, insert_flags(options))
            .await
    }

    /// Merge one document into the stored one with the same id
    pub async fn update(&self, document: &Document, options: Option<UpdateOptions>) -> Result<()> {
        let url = self.url::<&str>(wire::DOCUMENT, &[], &update_flags(options));
        self.client.send(Method::PATCH, &url, Some(document)).await?;
        Ok(())
    }

    /// Merge documents into the stored ones with the same ids
    #[instrument(skip(self, documents), fields(table = %self.name, count = documents.len()))]
    pub async fn update_many(
        &self,
        documents: &[Document],
        options: Option<UpdateOptions>,
    ) -> Result<()> {
        let url = self.url::<&str>(wire::DOCUMENT, &[], &update_flags(options));
        self.client.send(Method::PATCH, &url, Some(documents)).await?;
        Ok(())
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.remove_many(&[id]).await
    }

    /// Delete documents by id; unknown ids are ignored
    #[instrument(skip(self, ids), fields(table = %self.name, count = ids.len()))]
    pub async fn remove_many<S: AsRef<str>>(&self, ids: &[S]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = self.url(wire::DOCUMENT, ids, &[]);
        self.client.send(Method::DELETE, &url, None::<&()>).await?;
        Ok(())
    }

    /// Delete every document, keeping the table
    pub async fn empty(&self) -> Result<()> {
        let url = self.url::<&str>(wire::DOCUMENTS, &[], &[]);
        self.client.send(Method::DELETE, &url, None::<&()>).await?;
        Ok(())
    }

    /// Drop the table
    pub async fn drop(&self) -> Result<()> {
        let url = self.url::<&str>("", &[], &[]);
        self.client.send(Method::DELETE, &url, None::<&()>).await?;
        Ok(())
    }

    async fn send_documents<B: Serialize + ?Sized>(
        &self,
        method: Method,
        payload: &B,
        flags: Vec<(&'static str, bool)>,
    ) -> Result<Vec<String>> {
        let url = self.url::<&str>(wire::DOCUMENT, &[], &flags);
        self.fetch(method, &url, Some(payload)).await
    }
}
