mod common;

use chrono::TimeZone;
use common::{Customer, broken_store, created, store};
use recordlayer::{
    bson::{DateTime, Uuid},
    memory::InMemoryStore,
    prelude::*,
};

#[tokio::test]
async fn create_with_log_snapshots_stored_state() {
    let store = store();
    let mut customer = Customer::named("A");

    let entry = store
        .op::<Customer>("alice", "signup")
        .create_with_log(&mut customer)
        .await
        .unwrap();

    assert_eq!(entry.operation, Operation::Create);
    assert_eq!(entry.created_by, "alice");
    assert_eq!(entry.change_reason, "signup");
    assert_eq!(entry.model_name, "Customer");
    assert_eq!(Some(entry.model_obj_id), customer.id);
    assert_eq!(entry.snapshot::<Customer>().unwrap(), customer);
}

#[tokio::test]
async fn save_with_log_writes_one_entry_with_new_metadata() {
    let store = store();
    let mut customer = created(&store, "A").await;

    customer.name = "B".to_string();

    let entry = store
        .op::<Customer>("bob", "rename")
        .save_with_log(&mut customer)
        .await
        .unwrap();

    let snapshot = entry.snapshot::<Customer>().unwrap();

    assert_eq!(entry.operation, Operation::Update);
    assert_eq!(snapshot.name, "B");
    assert_eq!(snapshot.updated_by.as_deref(), Some("bob"));
    assert_eq!(snapshot.updated_at, customer.updated_at);
    assert_eq!(store.change_log().entries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_with_log_snapshot_is_flagged_removed() {
    let store = store();
    let mut customer = created(&store, "A").await;

    let entry = store
        .op::<Customer>("bob", "duplicate")
        .delete_with_log(&mut customer)
        .await
        .unwrap();

    let snapshot = entry.snapshot::<Customer>().unwrap();

    assert_eq!(entry.operation, Operation::Delete);
    assert!(snapshot.is_removed);
    assert_eq!(snapshot.removed_by.as_deref(), Some("bob"));
}

#[tokio::test]
async fn erase_with_log_keeps_pre_image_after_removal() {
    let store = store();
    let customer = created(&store, "A").await;
    let id = customer.id.unwrap();

    let entry = store
        .op::<Customer>("bob", "gdpr request")
        .erase_with_log(&customer)
        .await
        .unwrap();

    assert_eq!(entry.operation, Operation::Erase);
    assert_eq!(entry.snapshot::<Customer>().unwrap(), customer);

    let err = store.op::<Customer>("bob", "").get(id).await.unwrap_err();
    assert!(err.is_not_found());

    let history = store.change_log().history("Customer", id).await.unwrap();
    assert_eq!(history, vec![entry]);
}

#[tokio::test]
async fn erase_with_log_of_unstored_record_erases_and_logs_nothing() {
    let store = store();
    let mut ghost = Customer::named("ghost");
    ghost.id = Some(Uuid::new());

    let err = store
        .op::<Customer>("bob", "")
        .erase_with_log(&ghost)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(store.change_log().entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn history_lists_lifecycle_oldest_first() {
    let store = store();
    let mut customer = Customer::named("A");

    store.op::<Customer>("alice", "signup").create_with_log(&mut customer).await.unwrap();
    store.op::<Customer>("bob", "rename").save_with_log(&mut customer).await.unwrap();
    store.op::<Customer>("carol", "churn").delete_with_log(&mut customer).await.unwrap();

    let other = created(&store, "unrelated").await;
    store.op::<Customer>("dave", "").save_with_log(&mut other.clone()).await.unwrap();

    let history = store
        .change_log()
        .history("Customer", customer.id.unwrap())
        .await
        .unwrap();

    assert_eq!(
        history.iter().map(|entry| entry.operation).collect::<Vec<_>>(),
        vec![Operation::Create, Operation::Update, Operation::Delete]
    );
    assert_eq!(
        history.iter().map(|entry| entry.created_by.as_str()).collect::<Vec<_>>(),
        vec!["alice", "bob", "carol"]
    );
}

#[tokio::test]
async fn create_delete_scenario_keeps_raw_access() {
    let store = store();
    let mut customer = Customer::named("A");

    store.op::<Customer>("alice", "signup").create_with_log(&mut customer).await.unwrap();
    store.op::<Customer>("bob", "duplicate").delete_with_log(&mut customer).await.unwrap();

    assert!(store.op::<Customer>("carol", "").find_all().await.unwrap().is_empty());

    let raw = store
        .typed_collection::<Customer>()
        .get(vec![customer.id.unwrap()])
        .await
        .unwrap();

    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].created_by.as_deref(), Some("alice"));
    assert_eq!(raw[0].removed_by.as_deref(), Some("bob"));
}

#[tokio::test]
async fn log_collection_name_is_configurable() {
    let store = RecordStore::new(InMemoryStore::new()).with_config(
        RecordStoreConfig::builder()
            .change_log_collection("audit")
            .build(),
    );
    let mut customer = Customer::named("A");

    store.op::<Customer>("alice", "").create_with_log(&mut customer).await.unwrap();

    assert_eq!(store.collection("audit").query(Query::new()).await.unwrap().len(), 1);
    assert!(store.collection("ChangeLog").query(Query::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn fixed_clock_stamps_record_and_entry() {
    let instant = chrono::Utc.timestamp_opt(1_600_000_000, 0).unwrap();
    let store = RecordStore::new(InMemoryStore::new()).with_clock(FixedClock(instant));
    let mut customer = Customer::named("A");

    let entry = store
        .op::<Customer>("alice", "")
        .create_with_log(&mut customer)
        .await
        .unwrap();

    let expected = DateTime::from_millis(1_600_000_000_000);

    assert_eq!(customer.created_at, Some(expected));
    assert_eq!(entry.created_at, expected);
}

#[tokio::test]
async fn save_with_log_keeps_mutation_when_log_write_fails() {
    let memory = InMemoryStore::new();
    let healthy = RecordStore::new(memory.clone());
    let mut customer = Customer::named("A");
    healthy.op::<Customer>("alice", "").create(&mut customer).await.unwrap();

    let broken = broken_store(&memory, "ChangeLog");
    customer.name = "B".to_string();

    let err = broken
        .op::<Customer>("bob", "rename")
        .save_with_log(&mut customer)
        .await
        .unwrap_err();

    assert!(matches!(err, RecordStoreError::Backend(_)));

    let stored = healthy
        .op::<Customer>("carol", "")
        .get(customer.id.unwrap())
        .await
        .unwrap();

    assert_eq!(stored.name, "B");
    assert_eq!(stored.updated_by.as_deref(), Some("bob"));
    assert!(healthy.change_log().entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn erase_with_log_keeps_record_when_log_write_fails() {
    let memory = InMemoryStore::new();
    let healthy = RecordStore::new(memory.clone());
    let mut customer = Customer::named("A");
    let id = healthy.op::<Customer>("alice", "").create(&mut customer).await.unwrap();

    let err = broken_store(&memory, "ChangeLog")
        .op::<Customer>("bob", "gdpr request")
        .erase_with_log(&customer)
        .await
        .unwrap_err();

    assert!(matches!(err, RecordStoreError::Backend(_)));
    assert_eq!(healthy.op::<Customer>("carol", "").get(id).await.unwrap(), customer);
}
