//! Collection references and queries.
//!
//! A [`CollectionRef`] hands out document references and is also the starting point for
//! queries: every query method on it returns a [`Query`] over the whole collection that can
//! be narrowed further.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//!
//! let users = store.collection("users")?;
//! users.doc("u1")?.set(doc! { "name": "Ann", "age": 30 })?;
//! users.doc("u2")?.set(doc! { "name": "Bob", "age": 17 })?;
//!
//! let adults = users.where_field("age", ">=", 18)?.get()?;
//! assert_eq!(adults.ids(), vec!["u1"]);
//! ```

use std::sync::Arc;

use bson::Bson;
use uuid::Uuid;

use crate::{
    backend::{DocumentMap, StoreBackend},
    document::{DocumentRef, ListenerRegistration},
    error::{StoreError, StoreResult},
    event::{ChangeEvent, ListenerScope},
    query::{FieldFilter, QueryDefinition, Sort, SortDirection},
    snapshot::{DocumentChange, DocumentSnapshot, QuerySnapshot},
    value::DocumentData,
};

/// A reference to a collection of documents.
#[derive(Debug, Clone)]
pub struct CollectionRef<B: StoreBackend> {
    id: String,
    backend: B,
}

impl<B: StoreBackend> CollectionRef<B> {
    pub(crate) fn new(id: String, backend: B) -> StoreResult<Self> {
        if id.is_empty() {
            return Err(StoreError::InvalidArgument(
                "Collection ref instantiated without a collection id".to_string(),
            ));
        }

        Ok(Self::from_parts(id, backend))
    }

    pub(crate) fn from_parts(id: String, backend: B) -> Self {
        Self { id, backend }
    }

    /// The collection id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// A reference to the document with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] if `id` is empty.
    pub fn doc(&self, id: &str) -> StoreResult<DocumentRef<B>> {
        DocumentRef::new(self.id.clone(), id.to_string(), self.backend.clone())
    }

    /// A reference to a new document with a generated id.
    pub fn new_doc(&self) -> DocumentRef<B> {
        let id = Uuid::new_v4().simple().to_string();

        DocumentRef::from_parts(self.id.clone(), id, self.backend.clone())
    }

    /// Creates a document with a generated id and returns its reference.
    pub fn add(&self, data: impl DocumentData) -> StoreResult<DocumentRef<B>> {
        let doc_ref = self.new_doc();
        doc_ref.set(data)?;

        Ok(doc_ref)
    }

    /// A query matching every document of this collection.
    pub fn query(&self) -> Query<B> {
        Query::new(self.id.clone(), self.backend.clone())
    }

    /// See [`Query::where_field`].
    pub fn where_field(&self, field: &str, op: &str, value: impl Into<Bson>) -> StoreResult<Query<B>> {
        self.query().where_field(field, op, value)
    }

    /// See [`Query::filter`].
    pub fn filter(&self, filter: FieldFilter) -> Query<B> {
        self.query().filter(filter)
    }

    /// See [`Query::order_by`].
    pub fn order_by(&self, field: &str, direction: SortDirection) -> Query<B> {
        self.query().order_by(field, direction)
    }

    /// See [`Query::limit`].
    pub fn limit(&self, limit: usize) -> Query<B> {
        self.query().limit(limit)
    }

    /// Reads every document of the collection.
    pub fn get(&self) -> StoreResult<QuerySnapshot> {
        self.query().get()
    }

    /// Listens to every change in the collection. See [`Query::on_snapshot`].
    pub fn on_snapshot<F>(&self, callback: F) -> StoreResult<ListenerRegistration<B>>
    where
        F: Fn(&DocumentChange) -> StoreResult<()> + Send + Sync + 'static,
    {
        self.query().on_snapshot(callback)
    }
}

/// A filtered, ordered view over one collection.
///
/// Queries are immutable values; each builder method returns a new query.
#[derive(Debug, Clone)]
pub struct Query<B: StoreBackend> {
    collection: String,
    definition: QueryDefinition,
    backend: B,
}

impl<B: StoreBackend> Query<B> {
    pub(crate) fn new(collection: String, backend: B) -> Self {
        Self {
            collection,
            definition: QueryDefinition::new(),
            backend,
        }
    }

    /// The id of the queried collection.
    pub fn collection_id(&self) -> &str {
        &self.collection
    }

    pub fn definition(&self) -> &QueryDefinition {
        &self.definition
    }

    /// Adds a `field <op> value` filter, with the operator given as its string form
    /// (`"=="`, `"<"`, `"<="`, `">"`, `">="`, `"array-contains"`, `"in"`,
    /// `"array-contains-any"`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedOperator`] for any other operator.
    pub fn where_field(self, field: &str, op: &str, value: impl Into<Bson>) -> StoreResult<Self> {
        Ok(self.filter(FieldFilter::parse(field, op, value)?))
    }

    /// Adds a prebuilt filter.
    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.definition.filters.push(filter);
        self
    }

    /// Orders the results by a field.
    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.definition.sort = Some(Sort {
            field: field.to_string(),
            direction,
        });
        self
    }

    /// Returns at most `limit` documents.
    pub fn limit(mut self, limit: usize) -> Self {
        self.definition.limit = Some(limit);
        self
    }

    /// Skips the first `offset` documents.
    pub fn offset(mut self, offset: usize) -> Self {
        self.definition.offset = Some(offset);
        self
    }

    /// Runs the query.
    ///
    /// # Errors
    ///
    /// Returns the filter engine's errors, e.g. [`StoreError::InvalidArgument`] for an
    /// oversized `in` list or [`StoreError::TypeMismatch`] when a timestamp field is compared
    /// with a non-date value.
    pub fn get(&self) -> StoreResult<QuerySnapshot> {
        let documents = self
            .backend
            .query_documents(&self.collection, &self.definition)?;

        Ok(self.snapshot(documents))
    }

    /// Calls `callback` for every change to the query's result set.
    ///
    /// Ordering, offset and limit do not affect which changes are delivered; only the
    /// filters do.
    pub fn on_snapshot<F>(&self, callback: F) -> StoreResult<ListenerRegistration<B>>
    where
        F: Fn(&DocumentChange) -> StoreResult<()> + Send + Sync + 'static,
    {
        let scope = if self.definition.has_filters() {
            ListenerScope::Query(self.definition.filters.clone())
        } else {
            ListenerScope::Collection
        };

        let listener = move |event: &ChangeEvent| {
            callback(&DocumentChange {
                kind: event.kind,
                doc: DocumentSnapshot::new(
                    event.collection.clone(),
                    event.document_id.clone(),
                    event.document.clone(),
                ),
            })
        };

        let id = self
            .backend
            .attach_listener(&self.collection, scope, Arc::new(listener))?;

        Ok(ListenerRegistration::new(self.collection.clone(), id, self.backend.clone()))
    }

    fn snapshot(&self, documents: DocumentMap) -> QuerySnapshot {
        QuerySnapshot::new(
            documents
                .into_iter()
                .map(|(id, data)| DocumentSnapshot::new(self.collection.clone(), id, Some(data)))
                .collect(),
        )
    }
}
