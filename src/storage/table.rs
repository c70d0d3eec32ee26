//! A single table: its documents and id allocation state.
//!
//! `Table` is plain data with `&mut self` operations. Concurrency is the
//! owner's business: the database keeps each table behind its own mutex so
//! read-modify-write sequences (allocation, conflict-checked insert, merge)
//! run atomically per table.

use indexmap::IndexMap;
use tracing::debug;

use super::criteria::{self, Criteria};
use super::id::{IdAllocator, IdPolicy};
use crate::document::Document;
use crate::error::{Error, Result};

/// Options for [`Table::insert`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// Overwrite documents whose id is already taken.
    pub replace: bool,
}

/// Options for [`Table::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Store documents that do not exist yet (upsert).
    pub insert: bool,
}

#[derive(Debug)]
pub struct Table {
    name: String,
    ids: IdAllocator,
    documents: IndexMap<String, Document>,
}

impl Table {
    pub fn new(name: impl Into<String>, policy: IdPolicy) -> Self {
        Self {
            name: name.into(),
            ids: IdAllocator::new(policy),
            documents: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> IdPolicy {
        self.ids.policy()
    }

    /// Stores `documents` in order, allocating ids for those without one.
    ///
    /// A present id must be a valid identifier string. Stops at the first
    /// malformed id, or id conflict when `replace` is off. Documents written
    /// before the failure stay written.
    pub fn insert(&mut self, documents: Vec<Document>, options: InsertOptions) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(documents.len());

        for mut document in documents {
            document.validate_id(false)?;
            let id = match document.id() {
                Some(id) => id.to_string(),
                None => {
                    let id = self.ids.allocate();
                    document.set_id(id.clone());
                    id
                }
            };

            if !options.replace && self.documents.contains_key(&id) {
                debug!(table = %self.name, id = %id, "Insert conflict");
                return Err(Error::DocumentExists);
            }

            self.documents.insert(id.clone(), document);
            ids.push(id);
        }

        Ok(ids)
    }

    /// Merges `documents` into the stored ones by id.
    ///
    /// Missing documents are stored as-is when `insert` is set, otherwise the
    /// call fails at that document. Documents without an id are rejected.
    pub fn update(&mut self, documents: Vec<Document>, options: UpdateOptions) -> Result<()> {
        for document in documents {
            document.validate_id(true)?;
            let id = document
                .id()
                .map(str::to_string)
                .ok_or_else(|| Error::Validation("Document missing string id key".to_string()))?;

            match self.documents.get_mut(&id) {
                Some(stored) => stored.merge(document),
                None if options.insert => {
                    self.documents.insert(id, document);
                }
                None => {
                    debug!(table = %self.name, id = %id, "Update of unknown document");
                    return Err(Error::DocumentNotFound);
                }
            }
        }

        Ok(())
    }

    /// One slot per requested id, `None` where nothing is stored.
    pub fn get(&self, ids: &[String]) -> Vec<Option<Document>> {
        ids.iter().map(|id| self.documents.get(id).cloned()).collect()
    }

    pub fn query(&self, criteria: Criteria) -> Vec<Document> {
        let criteria = criteria::normalize(criteria);
        self.documents
            .values()
            .filter(|document| criteria::matches(document, criteria.as_ref()))
            .cloned()
            .collect()
    }

    pub fn count(&self, criteria: Criteria) -> u64 {
        match criteria::normalize(criteria) {
            None => self.documents.len() as u64,
            Some(criteria) => self
                .documents
                .values()
                .filter(|document| criteria::matches(document, Some(&criteria)))
                .count() as u64,
        }
    }

    /// Deletes the given ids; unknown ids are ignored.
    pub fn remove(&mut self, ids: &[String]) {
        for id in ids {
            self.documents.shift_remove(id);
        }
    }

    /// Deletes every document. The id cursor keeps its position.
    pub fn empty(&mut self) {
        self.documents.clear();
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        Document::try_from(value).unwrap()
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_insert_allocates_increment_ids() {
        let mut table = Table::new("test", IdPolicy::default());
        let allocated = table
            .insert(vec![doc(json!({"a": 1})), doc(json!({"a": 2}))], InsertOptions::default())
            .unwrap();
        assert_eq!(allocated, ids(&["1", "2"]));
        assert_eq!(
            table.get(&allocated),
            vec![Some(doc(json!({"a": 1, "id": "1"}))), Some(doc(json!({"a": 2, "id": "2"})))]
        );
    }

    #[test]
    fn test_insert_conflict_keeps_earlier_writes() {
        let mut table = Table::new("test", IdPolicy::default());
        table.insert(vec![doc(json!({"id": "x2"}))], InsertOptions::default()).unwrap();

        let err = table
            .insert(
                vec![doc(json!({"id": "x1"})), doc(json!({"id": "x2"})), doc(json!({"id": "x3"}))],
                InsertOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::DocumentExists));
        assert_eq!(table.len(), 2);
        assert!(table.get(&ids(&["x3"]))[0].is_none());
    }

    #[test]
    fn test_insert_replace_overwrites_in_place() {
        let mut table = Table::new("test", IdPolicy::default());
        table
            .insert(vec![doc(json!({"id": "x1", "a": 1})), doc(json!({"id": "x2"}))], InsertOptions::default())
            .unwrap();
        table
            .insert(vec![doc(json!({"id": "x1", "b": 2}))], InsertOptions { replace: true })
            .unwrap();

        let all = table.query(None);
        assert_eq!(all[0], doc(json!({"id": "x1", "b": 2})));
        assert_eq!(all[1].id(), Some("x2"));
    }

    #[test]
    fn test_update_merges_and_upserts() {
        let mut table = Table::new("test", IdPolicy::default());
        table
            .insert(vec![doc(json!({"id": "x1", "a": 1, "b": 2}))], InsertOptions::default())
            .unwrap();

        table
            .update(vec![doc(json!({"id": "x1", "a": 4, "c": 3}))], UpdateOptions::default())
            .unwrap();
        assert_eq!(
            table.get(&ids(&["x1"]))[0],
            Some(doc(json!({"id": "x1", "a": 4, "b": 2, "c": 3})))
        );

        let err = table
            .update(vec![doc(json!({"id": "x9", "a": 1}))], UpdateOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound));

        table
            .update(vec![doc(json!({"id": "x9", "a": 1}))], UpdateOptions { insert: true })
            .unwrap();
        assert_eq!(table.get(&ids(&["x9"]))[0], Some(doc(json!({"id": "x9", "a": 1}))));
    }

    #[test]
    fn test_update_requires_id() {
        let mut table = Table::new("test", IdPolicy::default());
        let err = table
            .update(vec![doc(json!({"a": 1}))], UpdateOptions { insert: true })
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_malformed_ids_are_rejected_not_replaced() {
        let mut table = Table::new("test", IdPolicy::default());

        for bad in [json!({"id": 5, "a": 1}), json!({"id": "a-b"}), json!({"id": ""})] {
            let err = table.insert(vec![doc(bad)], InsertOptions::default()).unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
        assert!(table.is_empty());
        assert_eq!(table.ids.cursor(), None);

        let err = table
            .update(vec![doc(json!({"id": 5}))], UpdateOptions { insert: true })
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_get_preserves_order_and_duplicates() {
        let mut table = Table::new("test", IdPolicy::default());
        table.insert(vec![doc(json!({"id": "a", "v": 1}))], InsertOptions::default()).unwrap();

        let got = table.get(&ids(&["a", "missing", "a"]));
        assert_eq!(got.len(), 3);
        assert_eq!(got[0], got[2]);
        assert!(got[0].is_some());
        assert!(got[1].is_none());
    }

    #[test]
    fn test_query_and_count_agree() {
        let mut table = Table::new("test", IdPolicy::default());
        table
            .insert(
                vec![
                    doc(json!({"id": "x1", "a": 1, "b": 1})),
                    doc(json!({"id": "x2", "a": 2, "b": 1})),
                    doc(json!({"id": "x3", "a": 2, "b": 2})),
                ],
                InsertOptions::default(),
            )
            .unwrap();

        for criteria in [
            None,
            Some(Document::new()),
            Some(doc(json!({"a": 2}))),
            Some(doc(json!({"a": 2, "b": 1}))),
            Some(doc(json!({"a": 3}))),
        ] {
            assert_eq!(table.count(criteria.clone()), table.query(criteria).len() as u64);
        }

        let matched: Vec<String> = table
            .query(Some(doc(json!({"a": 2}))))
            .iter()
            .filter_map(|d| d.id().map(str::to_string))
            .collect();
        assert_eq!(matched, ids(&["x2", "x3"]));
    }

    #[test]
    fn test_remove_and_empty() {
        let mut table = Table::new("test", IdPolicy::default());
        table
            .insert(vec![doc(json!({"a": 1})), doc(json!({"a": 2}))], InsertOptions::default())
            .unwrap();

        table.remove(&ids(&["1", "nope"]));
        table.remove(&ids(&["1"]));
        assert_eq!(table.count(None), 1);

        table.empty();
        assert_eq!(table.count(None), 0);
        assert!(table.is_empty());

        // cursor survives emptying
        let next = table.insert(vec![doc(json!({"a": 3}))], InsertOptions::default()).unwrap();
        assert_eq!(next, ids(&["3"]));
    }
}
