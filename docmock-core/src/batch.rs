//! Write batches.
//!
//! A [`WriteBatch`] collects writes without touching the store. On
//! [`commit`](WriteBatch::commit) all sets are applied first, then all updates, then all
//! deletes, each group in the order it was queued. There is no rollback: if an operation
//! fails, the commit stops there and the writes already applied stay applied.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//!
//! let user = store.collection("users")?.doc("u1")?;
//! let mut batch = store.batch();
//! batch.update(&user, doc! { "age": 31 })?;
//! batch.set(&user, doc! { "name": "Ann", "age": 30 })?;
//! batch.commit()?;
//!
//! // The set ran before the update.
//! assert_eq!(user.get()?.get("age"), Some(&bson::Bson::Int32(31)));
//! ```

use bson::Document;

use crate::{
    backend::StoreBackend,
    document::{DocumentRef, SetOptions},
    error::StoreResult,
    value::DocumentData,
};

#[derive(Debug, Clone)]
struct Target {
    collection: String,
    id: String,
}

impl Target {
    fn of<B: StoreBackend>(doc_ref: &DocumentRef<B>) -> Self {
        Self {
            collection: doc_ref.collection_id().to_string(),
            id: doc_ref.id().to_string(),
        }
    }
}

/// Pending writes grouped by kind, shared by batches and transactions.
#[derive(Debug, Default)]
pub(crate) struct WriteQueue {
    sets: Vec<(Target, Document, SetOptions)>,
    updates: Vec<(Target, Document)>,
    deletes: Vec<Target>,
}

impl WriteQueue {
    pub(crate) fn set<B: StoreBackend>(
        &mut self,
        doc_ref: &DocumentRef<B>,
        data: impl DocumentData,
        options: SetOptions,
    ) -> StoreResult<()> {
        self.sets
            .push((Target::of(doc_ref), data.into_document()?, options));

        Ok(())
    }

    pub(crate) fn update<B: StoreBackend>(
        &mut self,
        doc_ref: &DocumentRef<B>,
        data: impl DocumentData,
    ) -> StoreResult<()> {
        self.updates
            .push((Target::of(doc_ref), data.into_document()?));

        Ok(())
    }

    pub(crate) fn delete<B: StoreBackend>(&mut self, doc_ref: &DocumentRef<B>) {
        self.deletes.push(Target::of(doc_ref));
    }

    pub(crate) fn len(&self) -> usize {
        self.sets.len() + self.updates.len() + self.deletes.len()
    }

    pub(crate) fn apply<B: StoreBackend>(self, backend: &B) -> StoreResult<()> {
        log::debug!(
            "Committing {} set(s), {} update(s), {} delete(s)",
            self.sets.len(),
            self.updates.len(),
            self.deletes.len()
        );

        for (target, document, options) in self.sets {
            backend.set_document(&target.collection, &target.id, document, options)?;
        }

        for (target, fields) in self.updates {
            backend.update_document(&target.collection, &target.id, fields)?;
        }

        for target in self.deletes {
            backend.delete_document(&target.collection, &target.id)?;
        }

        Ok(())
    }
}

/// A group of writes applied together on [`commit`](Self::commit).
#[derive(Debug)]
pub struct WriteBatch<B: StoreBackend> {
    backend: B,
    queue: WriteQueue,
}

impl<B: StoreBackend> WriteBatch<B> {
    pub(crate) fn new(backend: B) -> Self {
        Self {
            backend,
            queue: WriteQueue::default(),
        }
    }

    /// Queues a replacing write.
    pub fn set(&mut self, doc_ref: &DocumentRef<B>, data: impl DocumentData) -> StoreResult<&mut Self> {
        self.set_with_options(doc_ref, data, SetOptions::default())
    }

    /// Queues a write with explicit options.
    pub fn set_with_options(
        &mut self,
        doc_ref: &DocumentRef<B>,
        data: impl DocumentData,
        options: SetOptions,
    ) -> StoreResult<&mut Self> {
        self.queue.set(doc_ref, data, options)?;

        Ok(self)
    }

    /// Queues a field update.
    pub fn update(&mut self, doc_ref: &DocumentRef<B>, data: impl DocumentData) -> StoreResult<&mut Self> {
        self.queue.update(doc_ref, data)?;

        Ok(self)
    }

    /// Queues a delete.
    pub fn delete(&mut self, doc_ref: &DocumentRef<B>) -> &mut Self {
        self.queue.delete(doc_ref);
        self
    }

    /// Number of queued writes.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.len() == 0
    }

    /// Applies the queued writes: sets, then updates, then deletes.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the backend. Writes applied before it are kept.
    pub fn commit(self) -> StoreResult<()> {
        self.queue.apply(&self.backend)
    }
}
