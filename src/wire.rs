//! Wire protocol shared by the HTTP server and the client.
//!
//! Addresses look like
//!
//! ```text
//! {base}/{database}/{table}{subpath}{/id,id,...}{?flag=bool&...}
//! ```
//!
//! Failures travel as a JSON body:
//!
//! ```json
//! {"statusCode": 404, "error": "Not Found", "message": "Unknown table", "code": "unknown_table"}
//! ```

use serde::{Deserialize, Serialize};

use crate::document::MAX_IDENTIFIER_LEN;
use crate::error::{Error, Result};
use crate::storage::IdPolicy;

/// Subpath for single-document operations.
pub const DOCUMENT: &str = "/document";
/// Subpath for whole-table document operations.
pub const DOCUMENTS: &str = "/documents";
pub const QUERY: &str = "/query";
pub const COUNT: &str = "/count";

/// Query flag for insert.
pub const REPLACE_FLAG: &str = "replace";
/// Query flag for update.
pub const INSERT_FLAG: &str = "insert";

/// Structured failure body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    pub fn into_error(self) -> Error {
        Error::from_code(self.code.as_deref(), self.message)
    }
}

/// Table creation payload: `{"id": <policy>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTable {
    pub id: IdPolicy,
}

/// A single item or a list of them; documents are sent either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

/// `/a,b,c` for the given ids, empty when there are none.
pub fn id_selector<S: AsRef<str>>(ids: &[S]) -> String {
    if ids.is_empty() {
        return String::new();
    }
    let joined: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();
    format!("/{}", joined.join(","))
}

/// Splits a comma-joined ids segment.
///
/// Each token must be 1-250 word characters (`[A-Za-z0-9_]`).
pub fn parse_ids(segment: &str) -> Result<Vec<String>> {
    let ids: Vec<String> = segment.split(',').map(str::to_string).collect();

    let valid = ids.iter().all(|id| {
        !id.is_empty()
            && id.len() <= MAX_IDENTIFIER_LEN
            && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    });

    if !valid {
        return Err(Error::Validation(format!("Invalid ids \"{}\"", segment)));
    }
    Ok(ids)
}

/// `?k=v&...` for the given flags, empty when there are none.
pub fn query_string(flags: &[(&str, bool)]) -> String {
    if flags.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = flags
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    format!("?{}", pairs.join("&"))
}

/// Parses a boolean flag value; absent means false.
pub fn parse_flag(name: &str, value: Option<&str>) -> Result<bool> {
    match value {
        None => Ok(false),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(Error::Validation(format!(
            "\"{}\" must be a boolean, got \"{}\"",
            name, other
        ))),
    }
}
