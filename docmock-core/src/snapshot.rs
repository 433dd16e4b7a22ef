//! Read results handed back to callers.
//!
//! Snapshots own a copy of the stored data; later writes to the store never show through
//! a snapshot that was already taken.

use bson::{Bson, Document, de::deserialize_from_bson};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::{StoreError, StoreResult},
    event::ChangeKind,
    value::lookup_field,
};

/// The state of a single document at the time it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    collection: String,
    id: String,
    data: Option<Document>,
}

impl DocumentSnapshot {
    pub(crate) fn new(collection: impl Into<String>, id: impl Into<String>, data: Option<Document>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            data,
        }
    }

    /// The document id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The `collection/id` path of the document.
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }

    /// Whether the document existed when it was read.
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    /// The stored fields, or `None` if the document does not exist.
    pub fn data(&self) -> Option<&Document> {
        self.data.as_ref()
    }

    /// Consumes the snapshot and returns the stored fields.
    pub fn into_data(self) -> Option<Document> {
        self.data
    }

    /// Reads a single field. Dotted references walk into nested maps.
    pub fn get(&self, field: &str) -> Option<&Bson> {
        lookup_field(self.data.as_ref()?, field)
    }

    /// Reads a timestamp field as a `chrono` date-time.
    pub fn get_instant(&self, field: &str) -> Option<DateTime<Utc>> {
        match self.get(field)? {
            Bson::DateTime(instant) => Some(instant.to_chrono()),
            _ => None,
        }
    }

    /// Deserializes the stored fields into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`](crate::error::StoreError::Serialization) if the
    /// data does not fit `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> StoreResult<Option<T>> {
        self.data
            .as_ref()
            .map(|data| deserialize_from_bson::<T>(Bson::Document(data.clone())).map_err(StoreError::from))
            .transpose()
    }

    /// Renders the stored fields as JSON through their serde representation.
    ///
    /// Plain values map to plain JSON; instants keep BSON's `$date` wrapper.
    pub fn to_json(&self) -> StoreResult<Option<Value>> {
        self.data
            .as_ref()
            .map(|data| serde_json::to_value(data).map_err(StoreError::from))
            .transpose()
    }
}

/// The result of running a query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySnapshot {
    docs: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    pub(crate) fn new(docs: Vec<DocumentSnapshot>) -> Self {
        Self { docs }
    }

    pub fn docs(&self) -> &[DocumentSnapshot] {
        &self.docs
    }

    pub fn size(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Ids of the matching documents, in result order.
    pub fn ids(&self) -> Vec<&str> {
        self.docs.iter().map(DocumentSnapshot::id).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentSnapshot> {
        self.docs.iter()
    }
}

impl IntoIterator for QuerySnapshot {
    type Item = DocumentSnapshot;
    type IntoIter = std::vec::IntoIter<DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.into_iter()
    }
}

impl<'a> IntoIterator for &'a QuerySnapshot {
    type Item = &'a DocumentSnapshot;
    type IntoIter = std::slice::Iter<'a, DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.iter()
    }
}

/// A change to a query's result set, delivered to query listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    /// How the result set changed.
    pub kind: ChangeKind,
    /// The document after the change. Empty for removals.
    pub doc: DocumentSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        name: String,
        age: i32,
    }

    #[test]
    fn test_missing_snapshot() {
        let snapshot = DocumentSnapshot::new("users", "nobody", None);
        assert!(!snapshot.exists());
        assert_eq!(snapshot.get("name"), None);
        assert_eq!(snapshot.data_as::<User>().unwrap(), None);
        assert_eq!(snapshot.to_json().unwrap(), None);
        assert_eq!(snapshot.path(), "users/nobody");
    }

    #[test]
    fn test_snapshot_field_access() {
        let at = bson::DateTime::from_millis(1_700_000_000_000);
        let snapshot = DocumentSnapshot::new(
            "users",
            "u1",
            Some(doc! { "name": "Ann", "age": 30, "meta": { "seen": at } }),
        );

        assert!(snapshot.exists());
        assert_eq!(snapshot.get("meta.seen"), Some(&Bson::DateTime(at)));
        assert_eq!(snapshot.get_instant("meta.seen").unwrap().timestamp_millis(), 1_700_000_000_000);
        assert_eq!(snapshot.get_instant("name"), None);
    }

    #[test]
    fn test_snapshot_deserializes_into_struct() {
        let snapshot = DocumentSnapshot::new("users", "u1", Some(doc! { "name": "Ann", "age": 30 }));
        let user = snapshot.data_as::<User>().unwrap().unwrap();
        assert_eq!(user, User { name: "Ann".to_string(), age: 30 });
        assert_eq!(snapshot.to_json().unwrap().unwrap()["name"], "Ann");
    }
}
