#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use recordlayer::{
    bson::{Bson, DateTime, Uuid},
    memory::InMemoryStore,
    prelude::*,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
#[record(collection = "customers")]
pub struct Customer {
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: Option<DateTime>,
    pub created_by: Option<String>,
    pub updated_at: Option<DateTime>,
    pub updated_by: Option<String>,
    pub removed_at: Option<DateTime>,
    pub removed_by: Option<String>,
    #[serde(default)]
    pub is_removed: bool,
}

impl Customer {
    pub fn named(name: &str) -> Self {
        Self { name: name.to_string(), ..Default::default() }
    }

    pub fn with_tier(name: &str, tier: &str) -> Self {
        Self { tier: tier.to_string(), ..Self::named(name) }
    }
}

/// Advances one millisecond per reading, so timestamps are strictly ordered.
#[derive(Debug)]
pub struct StepClock {
    millis: AtomicI64,
}

impl Default for StepClock {
    fn default() -> Self {
        Self { millis: AtomicI64::new(1_700_000_000_000) }
    }
}

impl Clock for StepClock {
    fn now(&self) -> chrono::DateTime<Utc> {
        let millis = self.millis.fetch_add(1, Ordering::SeqCst);

        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }
}

pub fn store() -> RecordStore<InMemoryStore> {
    RecordStore::new(InMemoryStore::new()).with_clock(StepClock::default())
}

pub async fn created(store: &RecordStore<InMemoryStore>, name: &str) -> Customer {
    let mut customer = Customer::named(name);

    store
        .op::<Customer>("seed", "fixture")
        .create(&mut customer)
        .await
        .unwrap();

    customer
}

/// In-memory backend whose writes to one collection always fail.
#[derive(Debug, Clone)]
pub struct BrokenWrites {
    inner: InMemoryStore,
    collection: String,
}

impl BrokenWrites {
    pub fn on(inner: InMemoryStore, collection: &str) -> Self {
        Self { inner, collection: collection.to_string() }
    }
}

#[async_trait]
impl StoreBackend for BrokenWrites {
    async fn upsert_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> RecordStoreResult<()> {
        if collection == self.collection {
            return Err(RecordStoreError::Backend(format!("{collection} is read-only")));
        }

        StoreBackend::upsert_documents(&self.inner, documents, collection).await
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> RecordStoreResult<()> {
        StoreBackend::delete_documents(&self.inner, ids, collection).await
    }

    async fn delete_matching(&self, filter: Option<Expr>, collection: &str) -> RecordStoreResult<u64> {
        StoreBackend::delete_matching(&self.inner, filter, collection).await
    }

    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> RecordStoreResult<Vec<Bson>> {
        StoreBackend::get_documents(&self.inner, ids, collection).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> RecordStoreResult<Vec<Bson>> {
        StoreBackend::query_documents(&self.inner, query, collection).await
    }

    async fn count_documents(&self, query: Query, collection: &str) -> RecordStoreResult<u64> {
        StoreBackend::count_documents(&self.inner, query, collection).await
    }

    async fn distinct_values(&self, field: &str, query: Query, collection: &str) -> RecordStoreResult<Vec<Bson>> {
        StoreBackend::distinct_values(&self.inner, field, query, collection).await
    }

    async fn list_collections(&self) -> RecordStoreResult<Vec<String>> {
        StoreBackend::list_collections(&self.inner).await
    }

    async fn drop_collection(&self, name: &str) -> RecordStoreResult<()> {
        StoreBackend::drop_collection(&self.inner, name).await
    }
}

/// A store over `inner` whose writes to `collection` fail.
pub fn broken_store(inner: &InMemoryStore, collection: &str) -> RecordStore<BrokenWrites> {
    RecordStore::new(BrokenWrites::on(inner.clone(), collection)).with_clock(StepClock::default())
}
