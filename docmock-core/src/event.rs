//! Change events emitted after every successful mutation.
//!
//! Backends deliver a [`ChangeEvent`] to each [`ChangeListener`] attached to the mutated
//! collection, synchronously and in registration order. Any closure of the shape
//! `Fn(&ChangeEvent) -> StoreResult<()>` is a listener.

use std::{fmt, sync::Arc};

use bson::{Document, Uuid};

use crate::{error::StoreResult, query::FieldFilter};

/// The kind of change a mutation caused to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The document did not exist before.
    Added,
    /// The document existed and was overwritten or updated.
    Modified,
    /// The document was deleted.
    Removed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Removed => "removed",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single document change, as seen by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// The collection the document lives in.
    pub collection: String,
    /// The id of the changed document.
    pub document_id: String,
    /// What happened to the document.
    pub kind: ChangeKind,
    /// The document after the change. `None` for removals.
    pub document: Option<Document>,
}

impl ChangeEvent {
    pub fn new(
        collection: impl Into<String>,
        document_id: impl Into<String>,
        kind: ChangeKind,
        document: Option<Document>,
    ) -> Self {
        Self {
            collection: collection.into(),
            document_id: document_id.into(),
            kind,
            document,
        }
    }
}

/// A registered interest in the changes of one collection.
///
/// Errors returned from [`on_change`](ChangeListener::on_change) are not caught by the
/// store; they surface from the mutation call that triggered the event.
pub trait ChangeListener: Send + Sync {
    fn on_change(&self, event: &ChangeEvent) -> StoreResult<()>;
}

impl<F> ChangeListener for F
where
    F: Fn(&ChangeEvent) -> StoreResult<()> + Send + Sync,
{
    fn on_change(&self, event: &ChangeEvent) -> StoreResult<()> {
        self(event)
    }
}

/// Which documents of a collection a listener is interested in.
///
/// For [`ListenerScope::Query`] the backend tracks the ids currently matching the filters
/// and rewrites each event into the change seen by that result set: a document entering
/// it is `Added`, one staying in it is `Modified`, one leaving it is `Removed`, and
/// documents that stay outside produce no event.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListenerScope {
    /// Every document of the collection.
    #[default]
    Collection,
    /// Documents matching all of the filters.
    Query(Vec<FieldFilter>),
    /// A single document id.
    Document(String),
}

/// Shared handle to a listener held by a backend's notifier.
pub type ListenerRef = Arc<dyn ChangeListener>;

/// Identifies one listener registration so it can be detached later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
