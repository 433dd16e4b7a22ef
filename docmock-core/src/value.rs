//! Normalization of caller-supplied documents into the stored representation.
//!
//! Stored documents are plain [`bson::Document`]s. Before anything is written, the payload
//! goes through [`serialize_document`], which rejects absent (`Bson::Undefined`) values and
//! arrays nested directly inside arrays, and turns date-like values into instants
//! (`Bson::DateTime`, millisecond precision).
//!
//! Callers hand data over through the [`DocumentData`] trait, which accepts BSON documents,
//! JSON objects and any `Serialize` type.

use bson::{Bson, DateTime, Document, ser::serialize_to_bson};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// Conversion of caller input into a raw, not yet validated, document.
pub trait DocumentData {
    /// Converts this value into a BSON document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] if the value is not map-shaped, or
    /// [`StoreError::Serialization`] if serde conversion fails.
    fn into_document(self) -> StoreResult<Document>;
}

impl DocumentData for Document {
    fn into_document(self) -> StoreResult<Document> {
        Ok(self)
    }
}

impl DocumentData for Value {
    fn into_document(self) -> StoreResult<Document> {
        match self {
            Value::Object(map) => map.into_document(),
            other => Err(StoreError::Validation(format!(
                "Document data must be an object, got {other}"
            ))),
        }
    }
}

impl DocumentData for Map<String, Value> {
    fn into_document(self) -> StoreResult<Document> {
        to_document(&self)
    }
}

impl<T: Serialize + ?Sized> DocumentData for &T {
    fn into_document(self) -> StoreResult<Document> {
        to_document(self)
    }
}

fn to_document<T: Serialize + ?Sized>(value: &T) -> StoreResult<Document> {
    match serialize_to_bson(value)? {
        Bson::Document(document) => Ok(document),
        other => Err(StoreError::Validation(format!(
            "Document data must serialize to a map, got {other}"
        ))),
    }
}

/// Validates and normalizes a document before it is stored.
///
/// `id` is only used to build the error message.
///
/// # Errors
///
/// Returns [`StoreError::Validation`] when a top-level field holds `Bson::Undefined` (the
/// message lists every such field), when a nested value is undefined, or when an array
/// directly contains another array.
pub fn serialize_document(document: &Document, id: &str) -> StoreResult<Document> {
    let undefined_keys = document
        .iter()
        .filter(|(_, value)| matches!(value, Bson::Undefined))
        .map(|(key, _)| key.as_str())
        .collect::<Vec<_>>();

    if !undefined_keys.is_empty() {
        return Err(StoreError::Validation(format!(
            "Document {id} contains undefined key values: {}. This document cannot be saved.",
            undefined_keys.join(" ")
        )));
    }

    serialize_map(document, "")
}

/// Resolves a field reference against a document.
///
/// An exact top-level key wins; otherwise a dotted reference walks into nested maps.
pub fn lookup_field<'a>(document: &'a Document, field: &str) -> Option<&'a Bson> {
    if let Some(value) = document.get(field) {
        return Some(value);
    }

    let mut segments = field.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

fn serialize_map(document: &Document, prefix: &str) -> StoreResult<Document> {
    let mut serialized = Document::new();

    for (key, value) in document {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        serialized.insert(key.clone(), serialize_at(value, &path)?);
    }

    Ok(serialized)
}

fn serialize_at(value: &Bson, path: &str) -> StoreResult<Bson> {
    match value {
        Bson::Undefined => Err(StoreError::Validation(format!(
            "Field {path} holds an undefined value and cannot be saved"
        ))),
        Bson::Timestamp(timestamp) => Ok(Bson::DateTime(DateTime::from_millis(
            i64::from(timestamp.time) * 1000,
        ))),
        Bson::Document(document) => Ok(Bson::Document(serialize_map(document, path)?)),
        Bson::Array(items) => serialize_array(items, path),
        _ => Ok(value.clone()),
    }
}

fn serialize_array(items: &[Bson], path: &str) -> StoreResult<Bson> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Bson::Array(_) => Err(StoreError::Validation(format!(
                "Document contains nested arrays at {path} and cannot be saved"
            ))),
            _ => serialize_at(item, &format!("{path}.{index}")),
        })
        .collect::<StoreResult<Vec<_>>>()
        .map(Bson::Array)
}
