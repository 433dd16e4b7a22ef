//! Main docmock crate: an in-memory stand-in for a document database client.
//!
//! This crate is the primary entry point for tests. It re-exports the client surface from
//! `docmock-core` and wires it to the in-memory backend from `docmock-memory`.
//!
//! # Features
//!
//! - **Collection and document references** - `set`, `update`, `delete` and `get` on `collection/id` paths
//! - **Queries** - `where` filters with `==`, `<`, `<=`, `>`, `>=`, `array-contains`, `in` and `array-contains-any`
//! - **Snapshot listeners** - Synchronous `added`/`modified`/`removed` notifications
//! - **Batches and transactions** - Grouped writes applied on commit
//!
//! # Quick Start
//!
//! ```ignore
//! use docmock::prelude::*;
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> StoreResult<()> {
//!     let store = docmock::mock_store();
//!     let users = store.collection("users")?;
//!
//!     users.doc("u1")?.set(doc! { "name": "Ann", "age": 30 })?;
//!
//!     let registration = users.on_snapshot(|change| {
//!         println!("{} {}", change.kind, change.doc.id());
//!         Ok(())
//!     })?;
//!
//!     users.doc("u1")?.update(doc! { "age": 31 })?;
//!     registration.remove()?;
//!
//!     store
//!         .run_transaction(|txn| {
//!             let user = users.doc("u1");
//!             async move {
//!                 let user = user?;
//!                 let age = txn.get(&user)?.get("age").and_then(|age| age.as_i32()).unwrap_or(0);
//!                 txn.update(&user, doc! { "age": age + 1 })?;
//!                 Ok::<_, StoreError>(())
//!             }
//!         })
//!         .await?;
//!
//!     store.clear_data()?;
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - The in-memory backend every [`MockStore`] uses

pub mod prelude;

pub use docmock_core::{
    backend, batch, collection, document, error, event, query, snapshot, store, transaction, value,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docmock_memory::{ChangeNotifier, InMemoryStore, InMemoryStoreBuilder, StoreConfig};
}

/// A document store backed by the in-memory backend.
pub type MockStore = docmock_core::store::DocumentStore<docmock_memory::InMemoryStore>;

/// Creates an empty [`MockStore`] with the default configuration.
pub fn mock_store() -> MockStore {
    MockStore::new(docmock_memory::InMemoryStore::new())
}
