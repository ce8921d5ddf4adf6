//! In-memory storage implementation for record stores.
//!
//! Documents are kept as BSON values in HashMaps behind an async-safe read-write lock.

use std::{collections::{BTreeSet, HashMap}, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, Document, Uuid};

use recordlayer_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{RecordStoreError, RecordStoreResult},
    query::{Expr, Query},
};

use crate::evaluator::{DocumentEvaluator, compare_documents, lookup};

type CollectionMap = HashMap<Uuid, Bson>;
type StoreMap = HashMap<String, CollectionMap>;

/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, so clones
/// share the same data and can be handed to concurrent tasks.
///
/// Queries scan every document of a collection; there is no indexing.
///
/// # Example
///
/// ```ignore
/// use recordlayer_memory::InMemoryStore;
/// use recordlayer::backend::StoreBackend;
/// use bson::{Uuid, Bson, doc};
///
/// let store = InMemoryStore::new();
/// let id = Uuid::new();
///
/// store.upsert_documents(vec![(id, Bson::Document(doc! { "id": id, "name": "Alice" }))], "users").await?;
/// assert_eq!(store.get_documents(vec![id], "users").await?.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> (document id -> document)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Filters and sorts the documents of one collection, without offset or limit.
    fn select(collection_map: &CollectionMap, query: &Query) -> RecordStoreResult<Vec<Bson>> {
        let mut documents = match &query.filter {
            Some(filter) => DocumentEvaluator::filter_documents(collection_map.values(), filter)?,
            None => collection_map
                .values()
                .cloned()
                .collect::<Vec<_>>(),
        };

        if !query.sort.is_empty() {
            documents.sort_by(|a, b| compare_documents(a, b, &query.sort));
        }

        Ok(documents)
    }

    fn window(documents: Vec<Bson>, query: &Query) -> impl Iterator<Item = Bson> {
        documents
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
    }
}

/// Copies the listed fields, dotted paths included, into a new document.
///
/// The `id` field is always kept.
fn project(document: Bson, fields: &[String]) -> Bson {
    let Bson::Document(source) = document else {
        return document;
    };

    let mut projected = Document::new();

    if let Some(id) = source.get("id") {
        projected.insert("id", id.clone());
    }

    for field in fields {
        if let Some(value) = lookup(&source, field) {
            insert_path(&mut projected, field, value.clone());
        }
    }

    Bson::Document(projected)
}

fn insert_path(target: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            target.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(target.get(head), Some(Bson::Document(_))) {
                target.insert(head, Document::new());
            }

            if let Some(Bson::Document(child)) = target.get_mut(head) {
                insert_path(child, rest, value);
            }
        }
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn upsert_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> RecordStoreResult<()> {
        if let Some((id, _)) = documents.iter().find(|(_, doc)| doc.as_document().is_none()) {
            return Err(RecordStoreError::SchemaViolation(format!(
                "document {id} for {collection} is not a BSON document"
            )));
        }

        let mut store = self.store.write().await;

        store
            .entry(collection.to_string())
            .or_default()
            .extend(documents);

        Ok(())
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> RecordStoreResult<()> {
        let mut store = self.store.write().await;

        if let Some(collection_map) = store.get_mut(collection) {
            for id in ids {
                collection_map.remove(&id);
            }
        }

        Ok(())
    }

    async fn delete_matching(&self, filter: Option<Expr>, collection: &str) -> RecordStoreResult<u64> {
        let mut store = self.store.write().await;
        let Some(collection_map) = store.get_mut(collection) else {
            return Ok(0);
        };

        let before = collection_map.len();

        match filter {
            Some(filter) => {
                let mut doomed = Vec::new();

                for (id, doc) in collection_map.iter() {
                    if DocumentEvaluator::new(doc).evaluate(&filter)? {
                        doomed.push(*id);
                    }
                }

                for id in doomed {
                    collection_map.remove(&id);
                }
            }
            None => collection_map.clear(),
        }

        let deleted = (before - collection_map.len()) as u64;

        tracing::debug!(collection, deleted, "deleted matching documents");

        Ok(deleted)
    }

    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> RecordStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(vec![]);
        };

        Ok(
            ids
                .iter()
                .filter_map(|id| collection_map.get(id).cloned())
                .collect()
        )
    }

    async fn query_documents(&self, query: Query, collection: &str) -> RecordStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(vec![]);
        };

        let documents = Self::window(Self::select(collection_map, &query)?, &query);

        Ok(match &query.projection {
            Some(fields) => documents
                .map(|doc| project(doc, fields))
                .collect(),
            None => documents.collect(),
        })
    }

    async fn count_documents(&self, query: Query, collection: &str) -> RecordStoreResult<u64> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(0);
        };

        Ok(Self::window(Self::select(collection_map, &query)?, &query).count() as u64)
    }

    async fn distinct_values(&self, field: &str, query: Query, collection: &str) -> RecordStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(vec![]);
        };

        let filter_only = Query { filter: query.filter, ..Query::default() };
        let mut seen = BTreeSet::new();
        let mut values = Vec::new();

        for doc in Self::select(collection_map, &filter_only)? {
            let Some(value) = doc.as_document().and_then(|doc| lookup(doc, field)) else {
                continue;
            };

            let candidates = match value {
                Bson::Array(items) => items.clone(),
                other => vec![other.clone()],
            };

            for candidate in candidates {
                // Bson is not Hash; its display form serves as the identity key.
                if seen.insert(candidate.to_string()) {
                    values.push(candidate);
                }
            }
        }

        Ok(values)
    }

    async fn list_collections(&self) -> RecordStoreResult<Vec<String>> {
        let mut names = self.store
            .read()
            .await
            .keys()
            .cloned()
            .collect::<Vec<_>>();

        names.sort();

        Ok(names)
    }

    async fn drop_collection(&self, name: &str) -> RecordStoreResult<()> {
        let mut store = self.store.write().await;

        if store.remove(name).is_none() {
            return Err(RecordStoreError::CollectionNotFound(name.to_string()));
        }

        tracing::debug!(collection = name, "dropped collection");

        Ok(())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// ```ignore
/// use recordlayer_memory::InMemoryStore;
/// use recordlayer::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder()
///     .with_collection("customers", seed)
///     .build()
///     .await?;
/// ```
#[derive(Default, Debug)]
pub struct InMemoryStoreBuilder {
    seed: StoreMap,
}

impl InMemoryStoreBuilder {
    /// Pre-populates a collection, replacing earlier seeds for the same name.
    pub fn with_collection(
        mut self,
        name: impl Into<String>,
        documents: impl IntoIterator<Item = (Uuid, Bson)>,
    ) -> Self {
        self.seed.insert(name.into(), documents.into_iter().collect());
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> RecordStoreResult<Self::Backend> {
        tracing::debug!(collections = self.seed.len(), "building in-memory store");

        Ok(InMemoryStore {
            store: Arc::new(RwLock::new(self.seed)),
        })
    }
}
