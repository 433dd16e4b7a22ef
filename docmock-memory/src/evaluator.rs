//! Filter evaluation for in-memory document filtering.
//!
//! This module provides the evaluation engine for `where` filters, enabling comparison and
//! membership checks on stored BSON documents.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document};

use docmock_core::{
    backend::DocumentMap,
    error::{StoreError, StoreResult},
    query::{FieldFilter, FieldOp},
    value::lookup_field,
};

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 so that `Int32(1)`, `Int64(1)` and `Double(1.0)`
/// compare equal. Instants compare by their millisecond epoch.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// Instant in milliseconds since the epoch
    Instant(i64),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Any other BSON value, only equal to an identical value
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::Instant(value.timestamp_millis()),
            Bson::Timestamp(value) => Comparable::Instant(i64::from(value.time) * 1000),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::Instant(a), Comparable::Instant(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::Instant(a), Comparable::Instant(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Checks the operand of `in` and `array-contains-any` filters.
///
/// Runs before any document is looked at, so a malformed list fails even on an empty
/// collection.
pub(crate) fn validate_filter(filter: &FieldFilter, max_values: usize) -> StoreResult<()> {
    if !filter.op.takes_value_list() {
        return Ok(());
    }

    match &filter.value {
        Bson::Array(values) if values.is_empty() => Err(StoreError::InvalidArgument(format!(
            "The '{}' filter operator requires a non-empty array of values",
            filter.op
        ))),
        Bson::Array(values) if values.len() > max_values => Err(StoreError::InvalidArgument(format!(
            "Only up to {max_values} values can be filtered in an '{}' filter, got {}",
            filter.op,
            values.len()
        ))),
        Bson::Array(_) => Ok(()),
        _ => Err(StoreError::InvalidArgument(format!(
            "The '{}' filter operator requires an array of values",
            filter.op
        ))),
    }
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Whether the document satisfies every filter.
    pub fn matches_all(&self, filters: &[FieldFilter]) -> StoreResult<bool> {
        for filter in filters {
            if !self.evaluate(filter)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Whether the document satisfies a single filter.
    ///
    /// The filter is expected to have passed [`validate_filter`].
    pub fn evaluate(&self, filter: &FieldFilter) -> StoreResult<bool> {
        let field_value = lookup_field(self.document, &filter.field);

        match filter.op {
            FieldOp::Eq | FieldOp::Lt | FieldOp::Lte | FieldOp::Gt | FieldOp::Gte => {
                Self::compare(&filter.field, field_value, filter.op, &filter.value)
            }
            FieldOp::ArrayContains => match field_value {
                Some(Bson::Array(items)) => {
                    let needle = Comparable::from(&filter.value);
                    Ok(items.iter().any(|item| Comparable::from(item) == needle))
                }
                _ => Ok(false),
            },
            FieldOp::In => match (field_value, &filter.value) {
                (Some(field_value), Bson::Array(values)) => {
                    let field_value = Comparable::from(field_value);
                    Ok(values.iter().any(|value| Comparable::from(value) == field_value))
                }
                _ => Ok(false),
            },
            FieldOp::ArrayContainsAny => match (field_value, &filter.value) {
                (Some(Bson::Array(items)), Bson::Array(values)) => {
                    let items = items.iter().map(Comparable::from).collect::<Vec<_>>();
                    Ok(values
                        .iter()
                        .map(Comparable::from)
                        .any(|value| items.contains(&value)))
                }
                _ => Ok(false),
            },
        }
    }

    fn compare(name: &str, field_value: Option<&Bson>, op: FieldOp, value: &Bson) -> StoreResult<bool> {
        let Some(field_value) = field_value else {
            return Ok(false);
        };

        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        if matches!(left, Comparable::Instant(_)) && !matches!(right, Comparable::Instant(_)) {
            return Err(StoreError::TypeMismatch(format!(
                "Timestamp field {name} compared without a date value"
            )));
        }

        if op == FieldOp::Eq {
            return Ok(left == right);
        }

        Ok(match left.partial_cmp(&right) {
            Some(ordering) => match op {
                FieldOp::Gt => ordering == Ordering::Greater,
                FieldOp::Gte => ordering == Ordering::Greater || ordering == Ordering::Equal,
                FieldOp::Lt => ordering == Ordering::Less,
                FieldOp::Lte => ordering == Ordering::Less || ordering == Ordering::Equal,
                _ => false,
            },
            None => false,
        })
    }

    /// Keeps the documents matching `filter`, in their original order.
    pub fn filter_documents(documents: DocumentMap, filter: &FieldFilter) -> StoreResult<DocumentMap> {
        log::trace!("Evaluating {} against {} document(s)", filter.field, documents.len());

        let mut filtered = DocumentMap::with_capacity(documents.len());

        for (id, document) in documents {
            if DocumentEvaluator::new(&document).evaluate(filter)? {
                filtered.insert(id, document);
            }
        }

        Ok(filtered)
    }
}

/// Orders two documents by a field for query sorting.
///
/// Missing and incomparable values sort as equal.
pub(crate) fn compare_field(a: &Document, b: &Document, field: &str) -> Ordering {
    let left = lookup_field(a, field)
        .map(Comparable::from)
        .unwrap_or(Comparable::Null);
    let right = lookup_field(b, field)
        .map(Comparable::from)
        .unwrap_or(Comparable::Null);

    left.partial_cmp(&right).unwrap_or(Ordering::Equal)
}
