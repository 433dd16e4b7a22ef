use std::sync::{Arc, Mutex};

use bson::{Bson, doc};
use docmock::prelude::*;

type Seen = Arc<Mutex<Vec<(ChangeKind, String)>>>;

fn watch<B: StoreBackend>(query: &Query<B>) -> StoreResult<(Seen, ListenerRegistration<B>)> {
    let seen = Seen::default();
    let sink = seen.clone();
    let registration = query.on_snapshot(move |change| {
        sink.lock().unwrap().push((change.kind, change.doc.id().to_string()));
        Ok(())
    })?;

    Ok((seen, registration))
}

fn events(kinds: &[(ChangeKind, &str)]) -> Vec<(ChangeKind, String)> {
    kinds.iter().map(|(kind, id)| (*kind, id.to_string())).collect()
}

#[test]
fn test_collection_listener_sees_every_change() -> StoreResult<()> {
    let store = mock_store();
    let orders = store.collection("orders")?;
    let (seen, _registration) = watch(&orders.query())?;

    orders.doc("o1")?.set(doc! { "total": 10 })?;
    assert_eq!(*seen.lock().unwrap(), events(&[(ChangeKind::Added, "o1")]));

    orders.doc("o1")?.set_with_options(doc! { "paid": true }, SetOptions::merge())?;
    orders.doc("o1")?.update(doc! { "total": 12 })?;
    orders.doc("o1")?.set(doc! { "total": 1 })?;
    orders.doc("o1")?.delete()?;
    orders.doc("o1")?.delete()?;

    assert_eq!(
        *seen.lock().unwrap(),
        events(&[
            (ChangeKind::Added, "o1"),
            (ChangeKind::Modified, "o1"),
            (ChangeKind::Modified, "o1"),
            (ChangeKind::Modified, "o1"),
            (ChangeKind::Removed, "o1"),
        ])
    );
    Ok(())
}

#[test]
fn test_change_carries_document_data() -> StoreResult<()> {
    let store = mock_store();
    let orders = store.collection("orders")?;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _registration = orders.on_snapshot(move |change| {
        sink.lock().unwrap().push(change.doc.data().cloned());
        Ok(())
    })?;

    orders.doc("o1")?.set(doc! { "total": 10 })?;
    orders.doc("o1")?.update(doc! { "paid": true })?;
    orders.doc("o1")?.delete()?;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Some(doc! { "total": 10 }),
            Some(doc! { "total": 10, "paid": true }),
            None,
        ]
    );
    Ok(())
}

#[test]
fn test_no_initial_snapshot_and_other_collections_ignored() -> StoreResult<()> {
    let store = mock_store();
    store.collection("orders")?.doc("o1")?.set(doc! { "total": 10 })?;

    let (seen, _registration) = watch(&store.collection("orders")?.query())?;
    store.collection("users")?.doc("u1")?.set(doc! { "name": "Ann" })?;

    assert!(seen.lock().unwrap().is_empty());
    Ok(())
}

#[test]
fn test_query_listener_tracks_result_set() -> StoreResult<()> {
    let store = mock_store();
    let orders = store.collection("orders")?;
    orders.doc("o1")?.set(doc! { "status": "open" })?;
    orders.doc("o2")?.set(doc! { "status": "closed" })?;

    let (seen, _registration) = watch(&orders.where_field("status", "==", "open")?)?;

    orders.doc("o3")?.set(doc! { "status": "closed" })?;
    orders.doc("o1")?.update(doc! { "note": "rush" })?;
    orders.doc("o2")?.update(doc! { "status": "open" })?;
    orders.doc("o1")?.update(doc! { "status": "closed" })?;
    orders.doc("o1")?.delete()?;
    orders.doc("o2")?.delete()?;

    assert_eq!(
        *seen.lock().unwrap(),
        events(&[
            (ChangeKind::Modified, "o1"),
            (ChangeKind::Added, "o2"),
            (ChangeKind::Removed, "o1"),
            (ChangeKind::Removed, "o2"),
        ])
    );
    Ok(())
}

#[test]
fn test_document_listener() -> StoreResult<()> {
    let store = mock_store();
    let users = store.collection("users")?;
    let ann = users.doc("u1")?;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _registration = ann.on_snapshot(move |snapshot| {
        sink.lock().unwrap().push(snapshot.get("age").cloned());
        Ok(())
    })?;

    users.doc("u2")?.set(doc! { "age": 50 })?;
    ann.set(doc! { "age": 30 })?;
    ann.update(doc! { "age": 31 })?;
    ann.delete()?;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some(Bson::Int32(30)), Some(Bson::Int32(31)), None]
    );
    Ok(())
}

#[test]
fn test_removed_registration_stops_delivery() -> StoreResult<()> {
    let store = mock_store();
    let orders = store.collection("orders")?;
    let (seen, registration) = watch(&orders.query())?;
    let (others, _kept) = watch(&orders.query())?;

    orders.doc("o1")?.set(doc! { "total": 1 })?;
    registration.remove()?;
    orders.doc("o2")?.set(doc! { "total": 2 })?;

    assert_eq!(*seen.lock().unwrap(), events(&[(ChangeKind::Added, "o1")]));
    assert_eq!(others.lock().unwrap().len(), 2);
    assert_eq!(store.backend().listener_count("orders"), 1);
    Ok(())
}

#[test]
fn test_listeners_run_in_registration_order() -> StoreResult<()> {
    let store = mock_store();
    let orders = store.collection("orders")?;
    let order = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second", "third"] {
        let sink = order.clone();
        orders.on_snapshot(move |_| {
            sink.lock().unwrap().push(name);
            Ok(())
        })?;
    }

    orders.doc("o1")?.set(doc! { "total": 1 })?;
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    Ok(())
}

#[test]
fn test_listener_error_surfaces_from_the_mutation() -> StoreResult<()> {
    let store = mock_store();
    let orders = store.collection("orders")?;
    orders.on_snapshot(|change| match change.kind {
        ChangeKind::Added => Err(StoreError::Listener("rejected".to_string())),
        _ => Ok(()),
    })?;
    let (seen, _registration) = watch(&orders.query())?;

    let err = orders.doc("o1")?.set(doc! { "total": 1 }).unwrap_err();

    assert_eq!(err, StoreError::Listener("rejected".to_string()));
    assert!(orders.doc("o1")?.get()?.exists());
    assert!(seen.lock().unwrap().is_empty());

    orders.doc("o1")?.update(doc! { "total": 2 })?;
    assert_eq!(*seen.lock().unwrap(), events(&[(ChangeKind::Modified, "o1")]));
    Ok(())
}

#[test]
fn test_listener_can_write_to_the_store() -> StoreResult<()> {
    let store = mock_store();
    let orders = store.collection("orders")?;
    let audit = store.collection("audit")?;
    let log = audit.clone();

    orders.on_snapshot(move |change| {
        log.add(doc! { "kind": change.kind.as_str(), "order": change.doc.id() })?;
        Ok(())
    })?;

    orders.doc("o1")?.set(doc! { "total": 1 })?;
    orders.doc("o1")?.delete()?;

    let entries = audit.get()?;
    let kinds = entries
        .iter()
        .filter_map(|entry| entry.get("kind").and_then(Bson::as_str))
        .collect::<Vec<_>>();
    assert_eq!(kinds, vec!["added", "removed"]);
    Ok(())
}

#[test]
fn test_clear_data_keeps_listeners() -> StoreResult<()> {
    let store = mock_store();
    let orders = store.collection("orders")?;
    let (seen, _registration) = watch(&orders.query())?;
    let (large, _large_registration) = watch(&orders.where_field("total", ">=", 1)?)?;

    orders.doc("o1")?.set(doc! { "total": 1 })?;
    store.clear_data()?;
    orders.doc("o1")?.set(doc! { "total": 1 })?;

    let expected = events(&[(ChangeKind::Added, "o1"), (ChangeKind::Added, "o1")]);
    assert_eq!(*seen.lock().unwrap(), expected);
    assert_eq!(*large.lock().unwrap(), expected);
    Ok(())
}

#[test]
fn test_unevaluable_query_filter_does_not_fail_writes() -> StoreResult<()> {
    let store = mock_store();
    let events_ref = store.collection("events")?;
    let (strict, _strict_registration) = watch(&events_ref.where_field("at", "==", 5)?)?;
    let (all, _registration) = watch(&events_ref.query())?;

    events_ref.doc("e1")?.set(doc! { "at": bson::DateTime::from_millis(5) })?;

    assert!(events_ref.doc("e1")?.get()?.exists());
    assert!(strict.lock().unwrap().is_empty());
    assert_eq!(*all.lock().unwrap(), events(&[(ChangeKind::Added, "e1")]));
    Ok(())
}
