//! In-memory storage backend for docmock.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait,
//! meant to stand in for a real document database in tests.
//!
//! # Features
//!
//! - **Thread-safe access** - Documents and listeners behind `parking_lot` locks
//! - **Insertion-ordered collections** - Reads return documents in the order they were first written
//! - **Query support** - `where` filters, ordering, offset and limit
//! - **Change listeners** - Collection, query and document scoped, delivered synchronously
//!
//! # Quick Start
//!
//! ```ignore
//! use docmock::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let users = store.collection("users")?;
//! users.doc("u1")?.set(doc! { "name": "Ann", "age": 30 })?;
//!
//! let adults = users.where_field("age", ">=", 18)?.get()?;
//! assert_eq!(adults.ids(), vec!["u1"]);
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmock_memory;

pub mod evaluator;
pub mod notifier;
pub mod store;

pub use notifier::ChangeNotifier;
pub use store::{InMemoryStore, InMemoryStoreBuilder, StoreConfig};
