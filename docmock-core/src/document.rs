//! Document references and the options that control writes through them.
//!
//! A [`DocumentRef`] names one document (`collection/id`) and forwards reads and writes to
//! the backend. Holding a reference does not create the document.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//!
//! let user = store.collection("users")?.doc("u1")?;
//! user.set(doc! { "name": "Ann", "age": 30 })?;
//! user.update(doc! { "age": 31 })?;
//! assert_eq!(user.get()?.get("age"), Some(&bson::Bson::Int32(31)));
//! ```

use std::sync::Arc;

use crate::{
    backend::StoreBackend,
    collection::CollectionRef,
    error::{StoreError, StoreResult},
    event::{ChangeEvent, ListenerId, ListenerScope},
    snapshot::DocumentSnapshot,
    value::DocumentData,
};

/// Options for [`DocumentRef::set_with_options`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Overlay the given fields onto an existing document instead of replacing it.
    pub merge: bool,
}

impl SetOptions {
    /// Options for a merging write.
    pub fn merge() -> Self {
        Self { merge: true }
    }
}

/// A reference to a single document in a collection.
#[derive(Debug, Clone)]
pub struct DocumentRef<B: StoreBackend> {
    collection: String,
    id: String,
    backend: B,
}

impl<B: StoreBackend> DocumentRef<B> {
    pub(crate) fn new(collection: String, id: String, backend: B) -> StoreResult<Self> {
        if id.is_empty() {
            return Err(StoreError::InvalidArgument(format!(
                "Document ref in collection {collection} instantiated without a document id"
            )));
        }

        Ok(Self::from_parts(collection, id, backend))
    }

    pub(crate) fn from_parts(collection: String, id: String, backend: B) -> Self {
        Self { collection, id, backend }
    }

    /// The document id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The id of the collection this document belongs to.
    pub fn collection_id(&self) -> &str {
        &self.collection
    }

    /// The `collection/id` path of the document.
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }

    /// The collection containing this document.
    pub fn parent(&self) -> CollectionRef<B> {
        CollectionRef::from_parts(self.collection.clone(), self.backend.clone())
    }

    /// Replaces the document with `data`, creating it if needed.
    pub fn set(&self, data: impl DocumentData) -> StoreResult<()> {
        self.set_with_options(data, SetOptions::default())
    }

    /// Writes `data` according to `options`.
    ///
    /// With `merge`, the fields are overlaid onto an existing document the way
    /// [`update`](Self::update) does; a missing document is created.
    pub fn set_with_options(&self, data: impl DocumentData, options: SetOptions) -> StoreResult<()> {
        self.backend
            .set_document(&self.collection, &self.id, data.into_document()?, options)
    }

    /// Overlays fields onto the existing document.
    ///
    /// Keys may be dotted paths (`"address.city"`) into nested maps.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the document does not exist.
    pub fn update(&self, data: impl DocumentData) -> StoreResult<()> {
        self.backend
            .update_document(&self.collection, &self.id, data.into_document()?)
    }

    /// Deletes the document. Deleting a missing document succeeds.
    pub fn delete(&self) -> StoreResult<()> {
        self.backend.delete_document(&self.collection, &self.id)
    }

    /// Reads the current state of the document.
    pub fn get(&self) -> StoreResult<DocumentSnapshot> {
        Ok(DocumentSnapshot::new(
            self.collection.clone(),
            self.id.clone(),
            self.backend.get_document(&self.collection, &self.id)?,
        ))
    }

    /// Calls `callback` with a fresh snapshot every time this document changes.
    ///
    /// The returned registration stays active until [`ListenerRegistration::remove`] is
    /// called.
    pub fn on_snapshot<F>(&self, callback: F) -> StoreResult<ListenerRegistration<B>>
    where
        F: Fn(&DocumentSnapshot) -> StoreResult<()> + Send + Sync + 'static,
    {
        let listener = move |event: &ChangeEvent| {
            callback(&DocumentSnapshot::new(
                event.collection.clone(),
                event.document_id.clone(),
                event.document.clone(),
            ))
        };

        let id = self.backend.attach_listener(
            &self.collection,
            ListenerScope::Document(self.id.clone()),
            Arc::new(listener),
        )?;

        Ok(ListenerRegistration::new(self.collection.clone(), id, self.backend.clone()))
    }
}

/// Handle for an attached snapshot listener.
///
/// Dropping the handle leaves the listener attached; call [`remove`](Self::remove) to stop
/// receiving events.
#[derive(Debug)]
pub struct ListenerRegistration<B: StoreBackend> {
    collection: String,
    id: ListenerId,
    backend: B,
}

impl<B: StoreBackend> ListenerRegistration<B> {
    pub(crate) fn new(collection: String, id: ListenerId, backend: B) -> Self {
        Self { collection, id, backend }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Detaches the listener.
    pub fn remove(self) -> StoreResult<()> {
        self.backend.detach_listener(&self.collection, self.id)?;

        Ok(())
    }
}
