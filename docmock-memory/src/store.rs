//! In-memory storage implementation for the mock store.
//!
//! Documents live in insertion-ordered maps behind a read-write lock. Every mutation
//! releases the lock before change events are delivered, so listeners can read from or
//! write to the store they are attached to.

use std::{collections::HashSet, sync::Arc};

use bson::{Bson, Document};
use indexmap::{IndexMap, map::Entry};
use parking_lot::RwLock;

use docmock_core::{
    backend::{DocumentMap, StoreBackend, StoreBackendBuilder},
    document::SetOptions,
    error::{StoreError, StoreResult},
    event::{ChangeEvent, ChangeKind, ListenerId, ListenerRef, ListenerScope},
    query::{FieldFilter, QueryDefinition, SortDirection},
    value::serialize_document,
};

use crate::{
    evaluator::{DocumentEvaluator, compare_field, validate_filter},
    notifier::ChangeNotifier,
};

type StoreMap = IndexMap<String, DocumentMap>;

/// Tunables of an [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Largest value list accepted by `in` and `array-contains-any` filters.
    pub max_disjunction_values: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { max_disjunction_values: 10 }
    }
}

/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses `Arc`-wrapped internal state. Clones share the
/// same documents and the same listeners.
///
/// Filters scan every document of a collection; there are no indexes.
///
/// # Example
///
/// ```ignore
/// use docmock_memory::InMemoryStore;
/// use docmock_core::{backend::StoreBackend, document::SetOptions};
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// store.set_document("users", "u1", doc! { "name": "Ann" }, SetOptions::default())?;
/// assert_eq!(store.list_collections()?, vec!["users".to_string()]);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection id -> (document id -> document)
    store: Arc<RwLock<StoreMap>>,
    notifier: ChangeNotifier,
    config: Arc<StoreConfig>,
}

impl InMemoryStore {
    /// Creates an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
            notifier: ChangeNotifier::new(),
            config: Arc::new(config),
        }
    }

    /// Creates a builder for an `InMemoryStore` with custom options.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use docmock_memory::InMemoryStore;
    /// use docmock_core::backend::StoreBackendBuilder;
    ///
    /// let store = InMemoryStore::builder().max_disjunction_values(30).build()?;
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of listeners attached to `collection`.
    pub fn listener_count(&self, collection: &str) -> usize {
        self.notifier.listener_count(collection)
    }

    /// Validates every filter, then narrows `documents` one filter at a time.
    fn run_filters(&self, documents: DocumentMap, filters: &[FieldFilter]) -> StoreResult<DocumentMap> {
        for filter in filters {
            validate_filter(filter, self.config.max_disjunction_values)?;
        }

        filters
            .iter()
            .try_fold(documents, |documents, filter| {
                DocumentEvaluator::filter_documents(documents, filter)
            })
    }

    fn collection_snapshot(&self, collection: &str) -> DocumentMap {
        self.store
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

/// Overlays `fields` onto `document`. Dotted keys address nested maps and are skipped when
/// an intermediate map is missing.
fn overlay_fields(document: &mut Document, fields: Document) {
    for (key, value) in fields {
        if key.contains('.') {
            set_path(document, &key, value);
        } else {
            document.insert(key, value);
        }
    }
}

fn set_path(document: &mut Document, path: &str, value: Bson) {
    let mut segments = path.split('.').collect::<Vec<_>>();
    let Some(last) = segments.pop() else {
        return;
    };

    let mut current = document;
    for segment in segments {
        match current.get_mut(segment) {
            Some(Bson::Document(nested)) => current = nested,
            _ => {
                log::debug!("Skipping update of {path}: {segment} is not a map");
                return;
            }
        }
    }

    current.insert(last, value);
}

impl StoreBackend for InMemoryStore {
    fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(
            self.store
                .read()
                .get(collection)
                .and_then(|documents| documents.get(id))
                .cloned()
        )
    }

    fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: Document,
        options: SetOptions,
    ) -> StoreResult<()> {
        let serialized = serialize_document(&document, id)?;

        let (kind, stored) = {
            let mut store = self.store.write();
            let documents = store.entry(collection.to_string()).or_default();

            match documents.entry(id.to_string()) {
                Entry::Occupied(mut entry) => {
                    if options.merge {
                        overlay_fields(entry.get_mut(), serialized);
                    } else {
                        entry.insert(serialized);
                    }
                    (ChangeKind::Modified, entry.get().clone())
                }
                Entry::Vacant(entry) => (ChangeKind::Added, entry.insert(serialized).clone()),
            }
        };

        log::debug!("Set {collection}/{id} ({kind})");
        self.notifier
            .notify(&ChangeEvent::new(collection, id, kind, Some(stored)))
    }

    fn update_document(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()> {
        let serialized = serialize_document(&fields, id)?;

        let stored = {
            let mut store = self.store.write();
            let document = store
                .get_mut(collection)
                .and_then(|documents| documents.get_mut(id))
                .ok_or_else(|| StoreError::NotFound(id.to_string(), collection.to_string()))?;

            overlay_fields(document, serialized);
            document.clone()
        };

        log::debug!("Updated {collection}/{id}");
        self.notifier.notify(&ChangeEvent::new(
            collection,
            id,
            ChangeKind::Modified,
            Some(stored),
        ))
    }

    fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        let removed = self
            .store
            .write()
            .get_mut(collection)
            .and_then(|documents| documents.shift_remove(id))
            .is_some();

        if !removed {
            return Ok(());
        }

        log::debug!("Deleted {collection}/{id}");
        self.notifier
            .notify(&ChangeEvent::new(collection, id, ChangeKind::Removed, None))
    }

    fn filter_documents(
        &self,
        collection: &str,
        filter: &FieldFilter,
        candidates: Option<DocumentMap>,
    ) -> StoreResult<DocumentMap> {
        validate_filter(filter, self.config.max_disjunction_values)?;

        let documents = match candidates {
            Some(candidates) if candidates.is_empty() => return Ok(candidates),
            Some(candidates) => candidates,
            None => self.collection_snapshot(collection),
        };

        DocumentEvaluator::filter_documents(documents, filter)
    }

    fn query_documents(&self, collection: &str, query: &QueryDefinition) -> StoreResult<DocumentMap> {
        let mut documents = self.run_filters(self.collection_snapshot(collection), &query.filters)?;

        if let Some(sort) = &query.sort {
            documents.sort_by(|_, a, _, b| match sort.direction {
                SortDirection::Asc => compare_field(a, b, &sort.field),
                SortDirection::Desc => compare_field(b, a, &sort.field),
            });
        }

        Ok(
            documents
                .into_iter()
                .skip(query.offset.unwrap_or(0))
                .take(query.limit.unwrap_or(usize::MAX))
                .collect()
        )
    }

    fn attach_listener(
        &self,
        collection: &str,
        scope: ListenerScope,
        listener: ListenerRef,
    ) -> StoreResult<ListenerId> {
        let members = match &scope {
            ListenerScope::Query(filters) => self
                .run_filters(self.collection_snapshot(collection), filters)?
                .into_keys()
                .collect::<HashSet<_>>(),
            _ => HashSet::new(),
        };

        Ok(self.notifier.attach(collection, scope, members, listener))
    }

    fn detach_listener(&self, collection: &str, id: ListenerId) -> StoreResult<bool> {
        Ok(self.notifier.detach(collection, id))
    }

    fn list_collections(&self) -> StoreResult<Vec<String>> {
        Ok(
            self.store
                .read()
                .keys()
                .cloned()
                .collect()
        )
    }

    fn clear(&self) -> StoreResult<()> {
        self.store.write().clear();
        self.notifier.reset_members();
        log::debug!("Cleared all collections");

        Ok(())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docmock_memory::InMemoryStore;
/// use docmock_core::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build()?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStoreBuilder {
    config: StoreConfig,
}

impl InMemoryStoreBuilder {
    /// Sets the largest value list accepted by `in` and `array-contains-any` filters.
    pub fn max_disjunction_values(mut self, max: usize) -> Self {
        self.config.max_disjunction_values = max;
        self
    }
}

impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    fn build(self) -> StoreResult<Self::Backend> {
        if self.config.max_disjunction_values == 0 {
            return Err(StoreError::InvalidArgument(
                "max_disjunction_values must be at least 1".to_string(),
            ));
        }

        Ok(InMemoryStore::with_config(self.config))
    }
}
