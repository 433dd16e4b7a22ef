//! Convenient re-exports of commonly used types from docmock.
//!
//! ```ignore
//! use docmock::prelude::*;
//! ```

pub use docmock_core::{
    backend::{DocumentMap, StoreBackend, StoreBackendBuilder},
    batch::WriteBatch,
    collection::{CollectionRef, Query},
    document::{DocumentRef, ListenerRegistration, SetOptions},
    error::{StoreError, StoreResult},
    event::{ChangeEvent, ChangeKind, ChangeListener, ListenerId, ListenerScope},
    query::{FieldFilter, FieldOp, Filter, QueryDefinition, Sort, SortDirection},
    snapshot::{DocumentChange, DocumentSnapshot, QuerySnapshot},
    store::DocumentStore,
    transaction::Transaction,
    value::DocumentData,
};

pub use crate::{MockStore, mock_store};
