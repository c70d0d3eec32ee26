//! Datum and Document - the schema-free values SandboxDB stores.
//!
//! A `Datum` represents any JSON-like value a document field can hold.
//! A `Document` is an insertion-ordered map of field name to `Datum` with
//! one reserved field, `id`, which the table uses as its key.
//!
//! # Supported Types
//!
//! - **Null**: Absence of a value
//! - **Boolean**: true or false
//! - **Number**: f64 floating point numbers
//! - **String**: UTF-8 encoded text
//! - **Array**: Ordered list of datums
//! - **Object**: Ordered key-value map
//!
//! # Example
//!
//! ```rust
//! use sandboxdb::document::{Datum, Document};
//!
//! let mut doc = Document::new();
//! doc.insert("id", "x1");
//! doc.insert("a", 1);
//! assert_eq!(doc.id(), Some("x1"));
//! assert_eq!(doc.get("a"), Some(&Datum::Number(1.0)));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

/// Name of the field every stored document is keyed by.
pub const ID_FIELD: &str = "id";

/// Longest identifier accepted for ids, database and table names.
pub const MAX_IDENTIFIER_LEN: usize = 250;

/// Datum represents a single field value.
///
/// Numbers are kept as `f64` so `1` and `1.0` compare equal, matching the
/// strict equality clients expect from JSON numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<Datum>),
    Object(IndexMap<String, Datum>),
}

impl Datum {
    /// Check if datum is null
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Datum::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Datum::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl Serialize for Datum {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Datum::Null => serializer.serialize_unit(),
            Datum::Boolean(b) => serializer.serialize_bool(*b),
            // Integral values go out without a fraction so ids and counters
            // round-trip the way they came in.
            Datum::Number(n) if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Datum::Number(n) => serializer.serialize_f64(*n),
            Datum::String(s) => serializer.serialize_str(s),
            Datum::Array(arr) => arr.serialize(serializer),
            Datum::Object(obj) => obj.serialize(serializer),
        }
    }
}

// Conversions
impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::Boolean(b)
    }
}

impl From<i32> for Datum {
    fn from(n: i32) -> Self {
        Datum::Number(n as f64)
    }
}

impl From<i64> for Datum {
    fn from(n: i64) -> Self {
        Datum::Number(n as f64)
    }
}

impl From<f64> for Datum {
    fn from(n: f64) -> Self {
        Datum::Number(n)
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Self {
        Datum::String(s)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::String(s.to_string())
    }
}

impl From<serde_json::Value> for Datum {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Datum::Null,
            serde_json::Value::Bool(b) => Datum::Boolean(b),
            serde_json::Value::Number(n) => Datum::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Datum::String(s),
            serde_json::Value::Array(arr) => {
                Datum::Array(arr.into_iter().map(Datum::from).collect())
            }
            serde_json::Value::Object(obj) => Datum::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, Datum::from(v)))
                    .collect(),
            ),
        }
    }
}

impl std::fmt::Display for Datum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(std::fmt::Error),
        }
    }
}

/// A stored document: ordered field map, keyed in its table by `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(IndexMap<String, Datum>);

impl Document {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// The document id, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Datum::as_string)
    }

    /// Sets the id field, keeping its position when it already exists.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.0.insert(ID_FIELD.to_string(), Datum::String(id.into()));
    }

    pub fn get(&self, field: &str) -> Option<&Datum> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Datum>) -> Option<Datum> {
        self.0.insert(field.into(), value.into())
    }

    /// Shallow merge: every field of `other` overwrites or extends `self`.
    pub fn merge(&mut self, other: Document) {
        for (field, value) in other.0 {
            self.0.insert(field, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Datum)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks the `id` field shape.
    ///
    /// A missing id is accepted unless `required`; a present id must be a
    /// valid identifier string.
    pub fn validate_id(&self, required: bool) -> Result<()> {
        match self.0.get(ID_FIELD) {
            None if required => Err(Error::Validation(
                "Document missing string id key".to_string(),
            )),
            None => Ok(()),
            Some(Datum::String(id)) if is_identifier(id) => Ok(()),
            Some(_) => Err(Error::Validation(
                "Document missing string id key".to_string(),
            )),
        }
    }
}

impl FromIterator<(String, Datum)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Datum)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl TryFrom<serde_json::Value> for Document {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match Datum::from(value) {
            Datum::Object(obj) => Ok(Self(obj)),
            other => Err(Error::Validation(format!(
                "Document must be an object, got {}",
                other
            ))),
        }
    }
}

/// True for 1-250 ASCII alphanumeric characters.
pub fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_IDENTIFIER_LEN
        && value.bytes().all(|b| b.is_ascii_alphanumeric())
}
