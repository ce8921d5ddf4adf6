//! The entry point: a record store bound to a backend.
//!
//! [`RecordStore`] owns the backend connection, the configuration and the clock, and
//! hands out per-call [`RecordOp`] contexts and collection handles.
//!
//! ```ignore
//! use recordlayer::{prelude::*, memory::InMemoryStore};
//!
//! let store = RecordStore::new(InMemoryStore::new());
//! let mut customer = Customer { name: "A".into(), ..Default::default() };
//!
//! store.op::<Customer>("alice", "signup").create(&mut customer).await?;
//! ```

use bson::{Bson, Uuid, de::deserialize_from_bson};

use crate::{
    backend::{DynStoreBackend, StoreBackend},
    changelog::ChangeLogger,
    clock::{Clock, SystemClock},
    collection::{Collection, TypedCollection},
    config::RecordStoreConfig,
    error::{RecordStoreError, RecordStoreResult},
    ops::RecordOp,
    query::{Filter, Query},
    record::{Record, fields},
};

/// A record store over backend `B`.
///
/// The store is `Sync` when the backend is, and one instance serves any number of
/// concurrent operations.
#[derive(Debug)]
pub struct RecordStore<B: StoreBackend> {
    backend: B,
    config: RecordStoreConfig,
    clock: Box<dyn Clock>,
}

/// A record store over a backend selected at runtime.
pub type DynRecordStore = RecordStore<Box<dyn DynStoreBackend>>;

impl<B: StoreBackend> RecordStore<B> {
    /// Creates a store with the default configuration and the system clock.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: RecordStoreConfig::default(),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_config(mut self, config: RecordStoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &RecordStoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Starts an operation on record type `R` on behalf of `operator`.
    ///
    /// `reason` is recorded on every change-log entry the operation writes.
    pub fn op<R: Record>(
        &self,
        operator: impl Into<String>,
        reason: impl Into<String>,
    ) -> RecordOp<'_, B, R> {
        RecordOp::new(
            &self.backend,
            &self.config,
            self.clock.as_ref(),
            operator.into(),
            reason.into(),
        )
    }

    /// Unfiltered handle on the collection of record type `R`.
    pub fn typed_collection<R: Record>(&self) -> TypedCollection<'_, B, R> {
        TypedCollection::new(R::collection_name().to_string(), &self.backend)
    }

    /// Unfiltered handle on a collection by name.
    pub fn collection(&self, name: &str) -> Collection<'_, B> {
        Collection::new(name.to_string(), &self.backend)
    }

    /// Reader/writer for the shared change-log collection.
    pub fn change_log(&self) -> ChangeLogger<'_, B> {
        ChangeLogger::new(&self.backend, &self.config.change_log_collection, self.clock.as_ref())
    }

    /// Folds the legacy soft-delete spelling into the canonical key for one collection.
    ///
    /// Every document carrying the legacy key gets the canonical key set to `true` if
    /// either spelling was `true`, and loses the legacy key. Returns the number of
    /// rewritten documents. Once every collection is migrated, the legacy spelling can
    /// be dropped from the configuration with
    /// [`RemovedFlag::canonical_only`](crate::scope::RemovedFlag::canonical_only).
    pub async fn migrate_removed_flag(&self, collection: &str) -> RecordStoreResult<u64> {
        let canonical = self.config.removed_flag.canonical.as_str();
        let legacy = self
            .config
            .removed_flag
            .legacy
            .as_deref()
            .unwrap_or(fields::LEGACY_IS_REMOVED);

        let documents = self
            .backend
            .query_documents(
                Query::builder()
                    .filter(Filter::exists(legacy))
                    .build(),
                collection,
            )
            .await?
            .into_iter()
            .map(|bson| -> RecordStoreResult<(Uuid, Bson)> {
                let mut document = match bson {
                    Bson::Document(document) => document,
                    other => {
                        return Err(RecordStoreError::SchemaViolation(format!(
                            "stored value in {collection} is not a document: {other:?}"
                        )));
                    }
                };

                let id: Uuid = deserialize_from_bson(
                    document
                        .get(fields::ID)
                        .cloned()
                        .ok_or_else(|| {
                            RecordStoreError::SchemaViolation(format!(
                                "document in {collection} has no {} field",
                                fields::ID
                            ))
                        })?,
                )?;

                let removed = [legacy, canonical]
                    .iter()
                    .any(|key| matches!(document.get(*key), Some(Bson::Boolean(true))));

                document.remove(legacy);
                document.insert(canonical, removed);

                Ok((id, Bson::Document(document)))
            })
            .collect::<RecordStoreResult<Vec<_>>>()?;

        let migrated = documents.len() as u64;

        if migrated > 0 {
            self.backend
                .upsert_documents(documents, collection)
                .await?;
        }

        tracing::info!(collection, legacy, canonical, migrated, "migrated legacy soft-delete flag");

        Ok(migrated)
    }

    pub async fn list_collections(&self) -> RecordStoreResult<Vec<String>> {
        self.backend.list_collections().await
    }

    pub async fn drop_collection(&self, name: &str) -> RecordStoreResult<()> {
        self.backend.drop_collection(name).await
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> RecordStoreResult<()> {
        self.backend.shutdown().await
    }
}

impl<B: StoreBackend + 'static> RecordStore<B> {
    /// Erases the backend type, keeping configuration and clock.
    pub fn into_dyn(self) -> DynRecordStore {
        RecordStore {
            backend: Box::new(self.backend),
            config: self.config,
            clock: self.clock,
        }
    }
}
