//! Listener bookkeeping and change fan-out for the in-memory store.
//!
//! Listeners are grouped per collection and called synchronously, in the order they were
//! attached. Query-scoped listeners carry the set of document ids currently in their
//! result so that each change can be rewritten relative to that set.

use std::{collections::HashSet, fmt, sync::Arc};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use docmock_core::{
    error::StoreResult,
    event::{ChangeEvent, ChangeKind, ListenerId, ListenerRef, ListenerScope},
};

use crate::evaluator::DocumentEvaluator;

struct ListenerContext {
    id: ListenerId,
    scope: ListenerScope,
    members: Mutex<HashSet<String>>,
    listener: ListenerRef,
}

impl ListenerContext {
    /// The kind of change this listener should see for `event`, if any.
    ///
    /// A document the filters cannot be evaluated against counts as outside the result set.
    fn scoped(&self, event: &ChangeEvent) -> Option<ChangeKind> {
        match &self.scope {
            ListenerScope::Collection => Some(event.kind),
            ListenerScope::Document(id) => (*id == event.document_id).then_some(event.kind),
            ListenerScope::Query(filters) => {
                let is_member = match &event.document {
                    Some(document) => DocumentEvaluator::new(document)
                        .matches_all(filters)
                        .unwrap_or_else(|err| {
                            log::warn!(
                                "Listener {} cannot evaluate {}/{}: {err}",
                                self.id,
                                event.collection,
                                event.document_id
                            );
                            false
                        }),
                    None => false,
                };

                let mut members = self.members.lock();
                let was_member = if is_member {
                    !members.insert(event.document_id.clone())
                } else {
                    members.remove(&event.document_id)
                };

                match (was_member, is_member) {
                    (false, true) => Some(ChangeKind::Added),
                    (true, true) => Some(ChangeKind::Modified),
                    (true, false) => Some(ChangeKind::Removed),
                    (false, false) => None,
                }
            }
        }
    }
}

/// Per-collection registry of change listeners.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    listeners: Arc<RwLock<IndexMap<String, Vec<Arc<ListenerContext>>>>>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read();

        f.debug_struct("ChangeNotifier")
            .field("collections", &listeners.keys().collect::<Vec<_>>())
            .field("listeners", &listeners.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. `members` seeds the result set of a query scope and is ignored
    /// for the other scopes.
    pub fn attach(
        &self,
        collection: &str,
        scope: ListenerScope,
        members: HashSet<String>,
        listener: ListenerRef,
    ) -> ListenerId {
        let id = ListenerId::new();
        let context = Arc::new(ListenerContext {
            id,
            scope,
            members: Mutex::new(members),
            listener,
        });

        self.listeners
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(context);

        log::debug!("Attached listener {id} to collection {collection}");
        id
    }

    /// Removes a listener. Returns whether it was registered on `collection`.
    pub fn detach(&self, collection: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(contexts) = listeners.get_mut(collection) else {
            return false;
        };

        let before = contexts.len();
        contexts.retain(|context| context.id != id);
        let removed = contexts.len() != before;

        if removed {
            log::debug!("Detached listener {id} from collection {collection}");
        }

        removed
    }

    /// Number of listeners attached to `collection`.
    pub fn listener_count(&self, collection: &str) -> usize {
        self.listeners
            .read()
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Empties the tracked result set of every query listener, e.g. after the store is
    /// cleared.
    pub fn reset_members(&self) {
        for contexts in self.listeners.read().values() {
            for context in contexts {
                context.members.lock().clear();
            }
        }
    }

    /// Delivers `event` to the listeners of its collection.
    ///
    /// The registry lock is released before any listener runs. The first listener error
    /// stops delivery and is returned.
    pub fn notify(&self, event: &ChangeEvent) -> StoreResult<()> {
        let contexts = match self.listeners.read().get(&event.collection) {
            Some(contexts) => contexts.clone(),
            None => return Ok(()),
        };

        for context in contexts {
            let Some(kind) = context.scoped(event) else {
                continue;
            };

            let scoped = ChangeEvent { kind, ..event.clone() };

            if let Err(err) = context.listener.on_change(&scoped) {
                log::warn!(
                    "Listener {} failed on {} of {}/{}: {err}",
                    context.id,
                    kind,
                    event.collection,
                    event.document_id
                );
                return Err(err);
            }
        }

        Ok(())
    }
}
