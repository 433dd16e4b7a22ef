//! Core types of docmock, an in-memory test double for a document database client.
//!
//! This crate provides:
//!
//! - **Value normalization** ([`value`]) - Turning caller data into stored documents
//! - **Store backend abstraction** ([`backend`]) - The narrow interface storage implementations provide
//! - **Query model** ([`query`]) - Filters, operators, ordering and limits
//! - **Change events** ([`event`]) - Events and listener contracts for snapshot listeners
//! - **Client references** ([`store`], [`collection`], [`document`]) - The surface tests call
//! - **Read results** ([`snapshot`]) - Document and query snapshots
//! - **Batches and transactions** ([`batch`], [`transaction`]) - Grouped writes
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docmock::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let user = store.collection("users")?.doc("u1")?;
//! user.set(doc! { "name": "Ann", "age": 30 })?;
//! assert!(user.get()?.exists());
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmock_core;

pub mod backend;
pub mod batch;
pub mod collection;
pub mod document;
pub mod error;
pub mod event;
pub mod query;
pub mod snapshot;
pub mod store;
pub mod transaction;
pub mod value;
