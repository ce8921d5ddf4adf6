mod common;

use common::{Customer, broken_store, created, store};
use recordlayer::{
    bson::{Bson, Uuid, doc},
    memory::InMemoryStore,
    prelude::*,
};

#[tokio::test]
async fn create_then_get_returns_stamped_record() {
    let store = store();
    let mut customer = Customer::named("A");

    let id = store
        .op::<Customer>("alice", "signup")
        .create(&mut customer)
        .await
        .unwrap();

    let found = store.op::<Customer>("alice", "").get(id).await.unwrap();

    assert_eq!(found.id, Some(id));
    assert_eq!(found.created_by.as_deref(), Some("alice"));
    assert!(found.created_at.is_some());
    assert_eq!(found, customer);
}

#[tokio::test]
async fn create_twice_stores_two_records() {
    let store = store();
    let op = store.op::<Customer>("alice", "");
    let mut customer = Customer::named("A");

    let first = op.create(&mut customer).await.unwrap();
    let second = op.create(&mut customer).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(op.count().await.unwrap(), 2);
}

#[tokio::test]
async fn save_stamps_update_metadata() {
    let store = store();
    let mut customer = created(&store, "A").await;

    customer.name = "B".to_string();
    store.op::<Customer>("bob", "rename").save(&mut customer).await.unwrap();

    let found = store
        .op::<Customer>("bob", "")
        .get(customer.id.unwrap())
        .await
        .unwrap();

    assert_eq!(found.name, "B");
    assert_eq!(found.updated_by.as_deref(), Some("bob"));
    assert!(found.updated_at > found.created_at);
}

#[tokio::test]
async fn save_of_uncreated_record_is_schema_violation() {
    let store = store();
    let mut customer = Customer::named("A");

    let err = store
        .op::<Customer>("bob", "")
        .save(&mut customer)
        .await
        .unwrap_err();

    assert!(matches!(err, RecordStoreError::SchemaViolation(_)));
    assert!(customer.updated_by.is_none());
}

#[tokio::test]
async fn soft_delete_hides_record_but_raw_path_finds_it() {
    let store = store();
    let mut customer = created(&store, "A").await;
    let id = customer.id.unwrap();

    store.op::<Customer>("bob", "duplicate").delete(&mut customer).await.unwrap();

    let op = store.op::<Customer>("carol", "");

    assert!(op.find_all().await.unwrap().is_empty());
    assert!(op.get(id).await.unwrap_err().is_not_found());

    let raw = op.records().get(vec![id]).await.unwrap();

    assert_eq!(raw.len(), 1);
    assert!(raw[0].is_removed);
    assert_eq!(raw[0].removed_by.as_deref(), Some("bob"));
    assert!(raw[0].removed_at.is_some());
}

#[tokio::test]
async fn count_drops_after_soft_delete() {
    let store = store();
    let mut first = created(&store, "A").await;
    created(&store, "B").await;

    let op = store.op::<Customer>("bob", "");

    assert_eq!(op.count().await.unwrap(), 2);

    op.delete(&mut first).await.unwrap();

    assert_eq!(op.count().await.unwrap(), 1);
}

#[tokio::test]
async fn erase_removes_permanently_and_is_idempotent() {
    let store = store();
    let customer = created(&store, "A").await;
    let id = customer.id.unwrap();
    let op = store.op::<Customer>("bob", "");

    op.erase(&customer).await.unwrap();
    op.erase(&customer).await.unwrap();

    assert!(op.records().get(vec![id]).await.unwrap().is_empty());
}

#[tokio::test]
async fn legacy_removed_flag_is_honoured() {
    let store = store();
    let visible = created(&store, "A").await;
    let hidden = Uuid::new();

    store
        .collection("customers")
        .upsert(vec![(
            hidden,
            Bson::Document(doc! { "id": hidden, "name": "Legacy", "IsRemoved": true }),
        )])
        .await
        .unwrap();

    let all = store.op::<Customer>("bob", "").find_all().await.unwrap();

    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, visible.id);
}

#[tokio::test]
async fn filter_sort_skip_and_limit_compose() {
    let store = store();

    for name in ["Ann", "Abe", "Bea", "Amy", "Al"] {
        created(&store, name).await;
    }

    let names = store
        .op::<Customer>("bob", "")
        .filter(Filter::starts_with("name", "A"))
        .sort("name", SortDirection::Asc)
        .skip(1)
        .limit(2)
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .map(|customer| customer.name)
        .collect::<Vec<_>>();

    assert_eq!(names, vec!["Al", "Amy"]);
}

#[tokio::test]
async fn default_order_is_newest_first() {
    let store = store();
    let mut older = created(&store, "old").await;
    created(&store, "new").await;

    let names = |customers: Vec<Customer>| {
        customers
            .into_iter()
            .map(|customer| customer.name)
            .collect::<Vec<_>>()
    };

    let op = store.op::<Customer>("bob", "");

    assert_eq!(names(op.find_all().await.unwrap()), vec!["new", "old"]);

    op.save(&mut older).await.unwrap();

    assert_eq!(names(op.find_all().await.unwrap()), vec!["old", "new"]);
}

#[tokio::test]
async fn get_by_filter_returns_first_match_or_not_found() {
    let store = store();
    created(&store, "A").await;

    let found = store
        .op::<Customer>("bob", "")
        .filter(Filter::eq("name", "A"))
        .get_by_filter()
        .await
        .unwrap();

    assert_eq!(found.name, "A");

    let err = store
        .op::<Customer>("bob", "")
        .filter(Filter::eq("name", "Z"))
        .get_by_filter()
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn select_projects_fields_and_keeps_identity() {
    let store = store();
    let mut customer = Customer::with_tier("A", "gold");
    let id = store.op::<Customer>("alice", "").create(&mut customer).await.unwrap();

    let op = store.op::<Customer>("bob", "");

    let rows = op.find_with_select(&["tier"]).await.unwrap();
    let row = rows[0].as_document().unwrap();

    assert_eq!(row.get_str("tier").unwrap(), "gold");
    assert!(row.get("name").is_none());
    assert!(row.get("id").is_some());

    let single = op.get_with_select(id, &["name"]).await.unwrap();

    assert_eq!(single.as_document().unwrap().get_str("name").unwrap(), "A");
    assert!(op.get_with_select(Uuid::new(), &["name"]).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn distinct_ignores_removed_records() {
    let store = store();
    let op = store.op::<Customer>("alice", "");

    for (name, tier) in [("A", "gold"), ("B", "silver"), ("C", "gold")] {
        op.create(&mut Customer::with_tier(name, tier)).await.unwrap();
    }

    let mut bronze = Customer::with_tier("D", "bronze");
    op.create(&mut bronze).await.unwrap();
    op.delete(&mut bronze).await.unwrap();

    let tiers = op.distinct("tier").await.unwrap();

    assert_eq!(tiers.len(), 2);
    assert!(tiers.contains(&Bson::from("gold")));
    assert!(tiers.contains(&Bson::from("silver")));
}

#[tokio::test]
async fn find_page_reports_navigation() {
    let store = store();

    for i in 0..7 {
        created(&store, &format!("c{i}")).await;
    }

    let page = store
        .op::<Customer>("bob", "")
        .sort("name", SortDirection::Asc)
        .find_page(PaginationParams::new(2, 3))
        .await
        .unwrap();

    assert_eq!(page.count, 7);
    assert_eq!(
        page.items.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        vec!["c3", "c4", "c5"]
    );
    assert_eq!(page.previous_page, Some(1));
    assert_eq!(page.next_page, Some(3));
}

#[tokio::test]
async fn erase_all_uses_raw_filter() {
    let store = store();
    let mut removed = created(&store, "gone").await;
    created(&store, "kept").await;

    store.op::<Customer>("bob", "").delete(&mut removed).await.unwrap();

    let erased = store
        .op::<Customer>("bob", "cleanup")
        .filter(Filter::eq("name", "gone"))
        .erase_all()
        .await
        .unwrap();

    assert_eq!(erased, 1);
    assert_eq!(store.typed_collection::<Customer>().query(Query::new()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reload_refreshes_caller_copy() {
    let store = store();
    let mut stale = created(&store, "A").await;
    let mut fresh = stale.clone();

    fresh.name = "B".to_string();
    store.op::<Customer>("bob", "").save(&mut fresh).await.unwrap();
    store.op::<Customer>("bob", "").reload(&mut stale).await.unwrap();

    assert_eq!(stale, fresh);
}

#[tokio::test]
async fn explicit_collection_overrides_type_default() {
    let store = store();
    let mut customer = Customer::named("A");

    store
        .op::<Customer>("alice", "")
        .in_collection("archived_customers")
        .create(&mut customer)
        .await
        .unwrap();

    assert!(store.op::<Customer>("alice", "").find_all().await.unwrap().is_empty());
    assert_eq!(
        store
            .op::<Customer>("alice", "")
            .in_collection("archived_customers")
            .count()
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn concurrent_saves_leave_one_payload_intact() {
    let store = store();
    let original = created(&store, "A").await;
    let id = original.id.unwrap();

    let mut left = Customer { name: "left".into(), tags: vec!["l".into()], ..original.clone() };
    let mut right = Customer { name: "right".into(), tags: vec!["r".into()], ..original };

    let left_op = store.op::<Customer>("left", "race");
    let right_op = store.op::<Customer>("right", "race");

    let (a, b) = tokio::join!(left_op.save(&mut left), right_op.save(&mut right));
    a.unwrap();
    b.unwrap();

    let stored = store.op::<Customer>("bob", "").get(id).await.unwrap();

    assert!(stored == left || stored == right);
}

#[tokio::test]
async fn failed_writes_leave_caller_record_untouched() {
    let memory = InMemoryStore::new();
    let broken = broken_store(&memory, "customers");
    let op = broken.op::<Customer>("bob", "");

    let mut fresh = Customer::named("A");
    assert!(op.create(&mut fresh).await.is_err());
    assert_eq!(fresh, Customer::named("A"));

    let mut existing = Customer::named("B");
    RecordStore::new(memory.clone())
        .op::<Customer>("alice", "")
        .create(&mut existing)
        .await
        .unwrap();
    let before = existing.clone();

    assert!(op.save(&mut existing).await.is_err());
    assert!(op.delete(&mut existing).await.is_err());
    assert_eq!(existing, before);
    assert!(!existing.is_removed);
}
