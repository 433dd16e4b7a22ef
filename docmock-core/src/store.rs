//! The store handle tests interact with.
//!
//! [`DocumentStore`] wraps a backend and hands out collection references, write batches and
//! transactions. Clones share the same backend, so a handle can be passed into the code
//! under test while the test keeps its own copy for assertions.
//!
//! # Example
//!
//! ```ignore
//! use docmock::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let orders = store.collection("orders")?;
//! orders.doc("o1")?.set(doc! { "total": 12.5 })?;
//!
//! store.clear_data()?;
//! assert!(orders.get()?.is_empty());
//! ```

use std::future::Future;

use crate::{
    backend::StoreBackend,
    batch::WriteBatch,
    collection::CollectionRef,
    error::StoreResult,
    transaction::Transaction,
};

/// A document store bound to a specific backend implementation.
#[derive(Debug, Clone)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The backend this store delegates to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// A reference to the collection with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`](crate::error::StoreError::InvalidArgument)
    /// if `name` is empty.
    pub fn collection(&self, name: &str) -> StoreResult<CollectionRef<B>> {
        CollectionRef::new(name.to_string(), self.backend.clone())
    }

    /// Ids of all collections that hold or held documents since the last reset.
    pub fn list_collections(&self) -> StoreResult<Vec<String>> {
        self.backend.list_collections()
    }

    /// Starts an empty write batch.
    pub fn batch(&self) -> WriteBatch<B> {
        WriteBatch::new(self.backend.clone())
    }

    /// Runs `f` with a fresh transaction and commits its writes once `f` completes.
    ///
    /// Nothing is committed when `f` returns an error; the error is returned as is.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let counter = store.collection("counters")?.doc("visits")?;
    /// store
    ///     .run_transaction(|txn| {
    ///         let counter = counter.clone();
    ///         async move {
    ///             let current = txn.get(&counter)?.get("n").and_then(|n| n.as_i32()).unwrap_or(0);
    ///             txn.set(&counter, doc! { "n": current + 1 })?;
    ///             Ok(())
    ///         }
    ///     })
    ///     .await?;
    /// ```
    pub async fn run_transaction<F, Fut, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(Transaction<B>) -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let transaction = Transaction::new(self.backend.clone());
        let value = f(transaction.clone()).await?;

        log::debug!("Transaction callback finished, committing {} write(s)", transaction.len());
        transaction.commit()?;

        Ok(value)
    }

    /// Resets the store to an empty database. Attached listeners are kept.
    pub fn clear_data(&self) -> StoreResult<()> {
        self.backend.clear()
    }
}
