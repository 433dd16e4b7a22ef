use bson::{Bson, DateTime, doc};
use docmock::prelude::*;

fn seeded() -> StoreResult<MockStore> {
    let store = mock_store();
    let orders = store.collection("orders")?;

    orders.doc("o1")?.set(doc! {
        "status": "open", "total": 12.5, "items": 2, "tags": ["gift", "express"],
        "placed": DateTime::from_millis(1_000), "customer": { "tier": "gold" },
    })?;
    orders.doc("o2")?.set(doc! {
        "status": "closed", "total": 40_i64, "items": 5, "tags": ["bulk"],
        "placed": DateTime::from_millis(3_000), "customer": { "tier": "silver" },
    })?;
    orders.doc("o3")?.set(doc! {
        "status": "open", "total": 7, "items": 1, "tags": [],
        "placed": DateTime::from_millis(2_000), "customer": { "tier": "gold" },
    })?;

    Ok(store)
}

#[test]
fn test_comparison_operators() -> StoreResult<()> {
    let orders = seeded()?.collection("orders")?;

    assert_eq!(orders.where_field("status", "==", "open")?.get()?.ids(), vec!["o1", "o3"]);
    assert_eq!(orders.where_field("total", ">", 10)?.get()?.ids(), vec!["o1", "o2"]);
    assert_eq!(orders.where_field("total", ">=", 40.0)?.get()?.ids(), vec!["o2"]);
    assert_eq!(orders.where_field("items", "<", 2)?.get()?.ids(), vec!["o3"]);
    assert_eq!(orders.where_field("items", "<=", 2)?.get()?.ids(), vec!["o1", "o3"]);
    Ok(())
}

#[test]
fn test_mixed_kinds_never_match() -> StoreResult<()> {
    let orders = seeded()?.collection("orders")?;

    assert!(orders.where_field("total", "==", "12.5")?.get()?.is_empty());
    assert!(orders.where_field("status", ">", 0)?.get()?.is_empty());
    assert!(orders.where_field("missing", "==", Bson::Null)?.get()?.is_empty());
    Ok(())
}

#[test]
fn test_array_operators() -> StoreResult<()> {
    let orders = seeded()?.collection("orders")?;

    assert_eq!(orders.where_field("tags", "array-contains", "gift")?.get()?.ids(), vec!["o1"]);
    assert_eq!(
        orders
            .where_field("tags", "array-contains-any", vec!["bulk", "express"])?
            .get()?
            .ids(),
        vec!["o1", "o2"]
    );
    assert_eq!(
        orders.where_field("status", "in", vec!["closed", "void"])?.get()?.ids(),
        vec!["o2"]
    );
    Ok(())
}

#[test]
fn test_instant_comparisons() -> StoreResult<()> {
    let orders = seeded()?.collection("orders")?;

    assert_eq!(
        orders.where_field("placed", ">=", DateTime::from_millis(2_000))?.get()?.ids(),
        vec!["o2", "o3"]
    );
    assert_eq!(
        orders
            .where_field("placed", "in", vec![DateTime::from_millis(1_000)])?
            .get()?
            .ids(),
        vec!["o1"]
    );

    let err = orders.where_field("placed", "==", 1_000)?.get().unwrap_err();
    assert!(matches!(err, StoreError::TypeMismatch(_)));
    Ok(())
}

#[test]
fn test_value_lists_are_validated_before_matching() -> StoreResult<()> {
    let store = mock_store();
    let empty = store.collection("orders")?;
    let eleven = (0..11).collect::<Vec<i32>>();

    assert!(matches!(
        empty.where_field("items", "in", eleven.clone())?.get(),
        Err(StoreError::InvalidArgument(_))
    ));
    assert!(matches!(
        empty.where_field("tags", "array-contains-any", Vec::<String>::new())?.get(),
        Err(StoreError::InvalidArgument(_))
    ));
    assert!(matches!(
        empty.where_field("status", "in", "open")?.get(),
        Err(StoreError::InvalidArgument(_))
    ));

    let orders = seeded()?.collection("orders")?;
    assert!(matches!(
        orders.where_field("items", "in", eleven)?.get(),
        Err(StoreError::InvalidArgument(_))
    ));
    assert_eq!(
        orders.where_field("items", "in", (0..10).collect::<Vec<i32>>())?.get()?.size(),
        3
    );
    Ok(())
}

#[test]
fn test_unknown_operator() -> StoreResult<()> {
    let orders = mock_store().collection("orders")?;
    let err = orders.where_field("status", "!=", "open").unwrap_err();

    assert_eq!(err, StoreError::UnsupportedOperator("!=".to_string()));
    Ok(())
}

#[test]
fn test_filters_are_conjunctive() -> StoreResult<()> {
    let orders = seeded()?.collection("orders")?;

    let result = orders
        .where_field("status", "==", "open")?
        .where_field("total", ">", 10)?
        .get()?;
    assert_eq!(result.ids(), vec!["o1"]);

    let result = orders
        .filter(Filter::eq("customer.tier", "gold"))
        .filter(Filter::lt("items", 2))
        .get()?;
    assert_eq!(result.ids(), vec!["o3"]);
    Ok(())
}

#[test]
fn test_ordering_and_paging() -> StoreResult<()> {
    let orders = seeded()?.collection("orders")?;

    let by_total = orders.order_by("total", SortDirection::Desc).get()?;
    assert_eq!(by_total.ids(), vec!["o2", "o1", "o3"]);

    let page = orders
        .order_by("placed", SortDirection::Asc)
        .offset(1)
        .limit(1)
        .get()?;
    assert_eq!(page.ids(), vec!["o3"]);

    assert_eq!(orders.limit(2).get()?.ids(), vec!["o1", "o2"]);
    Ok(())
}

#[test]
fn test_results_follow_insertion_order() -> StoreResult<()> {
    let store = seeded()?;
    let orders = store.collection("orders")?;

    orders.doc("o1")?.update(doc! { "items": 3 })?;
    orders.doc("o0")?.set(doc! { "status": "open" })?;

    assert_eq!(orders.get()?.ids(), vec!["o1", "o2", "o3", "o0"]);
    Ok(())
}

#[test]
fn test_query_on_missing_collection_is_empty() -> StoreResult<()> {
    let store = mock_store();
    let snapshot = store.collection("nothing")?.where_field("a", "==", 1)?.get()?;

    assert!(snapshot.is_empty());
    assert_eq!(snapshot.size(), 0);
    Ok(())
}

#[test]
fn test_backend_filter_with_candidates() -> StoreResult<()> {
    let store = seeded()?;
    let backend = store.backend();

    let open = backend.filter_documents("orders", &Filter::eq("status", "open"), None)?;
    assert_eq!(open.keys().collect::<Vec<_>>(), vec!["o1", "o3"]);

    let cheap = backend.filter_documents("orders", &Filter::lt("total", 10), Some(open))?;
    assert_eq!(cheap.keys().collect::<Vec<_>>(), vec!["o3"]);

    let none = backend.filter_documents("orders", &Filter::eq("status", "open"), Some(DocumentMap::new()))?;
    assert!(none.is_empty());
    Ok(())
}

#[test]
fn test_configured_disjunction_limit() -> StoreResult<()> {
    let backend = docmock::memory::InMemoryStore::builder()
        .max_disjunction_values(30)
        .build()?;
    let store = DocumentStore::new(backend);
    let orders = store.collection("orders")?;

    assert!(orders.where_field("items", "in", (0..30).collect::<Vec<i32>>())?.get().is_ok());
    assert!(orders.where_field("items", "in", (0..31).collect::<Vec<i32>>())?.get().is_err());
    Ok(())
}
