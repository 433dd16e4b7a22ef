//! Transactions.
//!
//! A [`Transaction`] queues writes exactly like a [`WriteBatch`](crate::batch::WriteBatch)
//! and adds a [`get`](Transaction::get) that reads straight from the store. There is no
//! snapshot isolation and no conflict detection: reads see the latest committed data and
//! the last write wins.
//!
//! Transactions are created by
//! [`DocumentStore::run_transaction`](crate::store::DocumentStore::run_transaction), which
//! commits the queued writes once the caller's future resolves successfully.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    backend::StoreBackend,
    batch::WriteQueue,
    document::{DocumentRef, SetOptions},
    error::StoreResult,
    snapshot::DocumentSnapshot,
    value::DocumentData,
};

/// Handle passed to a transaction callback.
///
/// Clones share the same queue of pending writes.
#[derive(Debug, Clone)]
pub struct Transaction<B: StoreBackend> {
    backend: B,
    queue: Arc<Mutex<WriteQueue>>,
}

impl<B: StoreBackend> Transaction<B> {
    pub(crate) fn new(backend: B) -> Self {
        Self {
            backend,
            queue: Arc::new(Mutex::new(WriteQueue::default())),
        }
    }

    /// Reads the current state of a document.
    pub fn get(&self, doc_ref: &DocumentRef<B>) -> StoreResult<DocumentSnapshot> {
        doc_ref.get()
    }

    /// Queues a replacing write.
    pub fn set(&self, doc_ref: &DocumentRef<B>, data: impl DocumentData) -> StoreResult<&Self> {
        self.set_with_options(doc_ref, data, SetOptions::default())
    }

    /// Queues a write with explicit options.
    pub fn set_with_options(
        &self,
        doc_ref: &DocumentRef<B>,
        data: impl DocumentData,
        options: SetOptions,
    ) -> StoreResult<&Self> {
        self.queue.lock().set(doc_ref, data, options)?;

        Ok(self)
    }

    /// Queues a field update.
    pub fn update(&self, doc_ref: &DocumentRef<B>, data: impl DocumentData) -> StoreResult<&Self> {
        self.queue.lock().update(doc_ref, data)?;

        Ok(self)
    }

    /// Queues a delete.
    pub fn delete(&self, doc_ref: &DocumentRef<B>) -> &Self {
        self.queue.lock().delete(doc_ref);
        self
    }

    /// Number of queued writes.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies the queued writes in the same order a batch does.
    pub(crate) fn commit(self) -> StoreResult<()> {
        let queue = std::mem::take(&mut *self.queue.lock());

        queue.apply(&self.backend)
    }
}
