//! Error types and result types for mock store operations.
//!
//! Every fallible operation in the workspace returns [`StoreResult<T>`]. Errors are raised
//! straight to the caller; nothing is retried or recovered so that a test sees the defect
//! at the call site that caused it.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with the mock store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The document payload has an invalid shape (absent values, nested arrays, non-object input).
    #[error("Validation error: {0}")]
    Validation(String),
    /// An update targeted a document that does not exist.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} does not exist in collection {1}, failed to update")]
    NotFound(String, String),
    /// A query used an operator string that is not supported.
    #[error("Query.where() calls with operator '{0}' are not supported at this time")]
    UnsupportedOperator(String),
    /// An argument was malformed, e.g. the value list of an `in` filter.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A timestamp field was compared against a value that is not a date.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// Conversion between caller types and stored documents failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A change listener callback returned an error.
    #[error("Listener error: {0}")]
    Listener(String),
}

/// A specialized `Result` type for mock store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
