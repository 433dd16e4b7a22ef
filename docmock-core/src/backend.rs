//! Storage backend abstraction for the mock store.
//!
//! The client surface ([`DocumentStore`](crate::store::DocumentStore) and the references it
//! hands out) only talks to storage through the [`StoreBackend`] trait. A backend owns the
//! database, evaluates filters and fans change events out to attached listeners.
//!
//! # Example
//!
//! ```ignore
//! use docmock::backend::StoreBackend;
//! use docmock::document::SetOptions;
//! use bson::doc;
//!
//! let backend = InMemoryStore::new();
//! backend.set_document("users", "u1", doc! { "name": "Ann" }, SetOptions::default())?;
//! assert!(backend.get_document("users", "u1")?.is_some());
//! ```

use std::fmt::Debug;

use bson::Document;
use indexmap::IndexMap;

use crate::{
    document::SetOptions,
    error::StoreResult,
    event::{ListenerId, ListenerRef, ListenerScope},
    query::{FieldFilter, QueryDefinition},
};

/// Documents of one collection keyed by id, in insertion order.
pub type DocumentMap = IndexMap<String, Document>;

/// Abstract interface for document storage backends.
///
/// All operations are synchronous. Mutations must notify every listener attached to the
/// collection after the change is applied, and must not hold internal locks while doing so,
/// since listeners are free to call back into the backend.
///
/// Backends are cheap to clone; clones share the same database.
pub trait StoreBackend: Send + Sync + Debug + Clone + 'static {
    /// Looks up a single document. Returns `Ok(None)` when it does not exist.
    fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Writes a document, replacing it or merging into it depending on `options`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`](crate::error::StoreError::Validation) if the
    /// document cannot be serialized.
    fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: Document,
        options: SetOptions,
    ) -> StoreResult<()>;

    /// Overlays fields (plain names or dotted paths) onto an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`](crate::error::StoreError::NotFound) if the document
    /// does not exist.
    fn update_document(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()>;

    /// Deletes a document. Deleting a missing document is a no-op.
    fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Applies a single filter to `candidates`, or to the whole collection when `None`.
    ///
    /// The result keeps the order of the input. An empty candidate set is returned as is.
    fn filter_documents(
        &self,
        collection: &str,
        filter: &FieldFilter,
        candidates: Option<DocumentMap>,
    ) -> StoreResult<DocumentMap>;

    /// Runs a full query (filters, ordering, offset, limit) against a collection.
    fn query_documents(&self, collection: &str, query: &QueryDefinition) -> StoreResult<DocumentMap>;

    /// Registers a listener for the changes in `collection` that fall within `scope`.
    ///
    /// # Errors
    ///
    /// Query scopes are evaluated against the current documents to seed the tracked result
    /// set, so filter errors (e.g. an oversized `in` list) are returned here.
    fn attach_listener(
        &self,
        collection: &str,
        scope: ListenerScope,
        listener: ListenerRef,
    ) -> StoreResult<ListenerId>;

    /// Removes a listener. Returns whether it was registered.
    fn detach_listener(&self, collection: &str, id: ListenerId) -> StoreResult<bool>;

    /// Lists the ids of all collections that have been written to.
    fn list_collections(&self) -> StoreResult<Vec<String>>;

    /// Drops every collection and document. Listeners stay attached.
    fn clear(&self) -> StoreResult<()>;
}

/// Factory trait for creating backend instances.
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    fn build(self) -> StoreResult<Self::Backend>;
}
