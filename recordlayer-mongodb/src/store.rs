use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream::iter};
use bson::{Bson, Document, Uuid, doc};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, CountOptions, FindOptions},
};
use recordlayer_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{RecordStoreError, RecordStoreResult},
    query::{Expr, Query, QueryVisitor},
};

use crate::{query::MongoQueryTranslator, sanitizer::KeySanitizer};

fn backend_error(error: mongodb::error::Error) -> RecordStoreError {
    RecordStoreError::Backend(error.to_string())
}

/// MongoDB-backed [`StoreBackend`].
///
/// Each record is stored under `_id` equal to its identity, next to its own fields.
/// Upserts replace the stored document in one `replaceOne` call.
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    /// Wraps an already connected client.
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&KeySanitizer::sanitize_key(collection_name))
    }

    fn prepare_document(&self, id: &Uuid, document: &Bson) -> RecordStoreResult<Document> {
        Ok(Document::from_iter(
            KeySanitizer::sanitize_value(document)
                .as_document()
                .cloned()
                .ok_or_else(|| RecordStoreError::SchemaViolation(format!("document {id} is not a BSON document")))?
                .into_iter()
                .chain(vec![("_id".to_string(), (*id).into())].into_iter()),
        ))
    }

    fn restore_document(&self, document: Document) -> Bson {
        KeySanitizer::restore_value(&Bson::Document(
            document
                .into_iter()
                .filter(|(k, _)| k != "_id")
                .collect(),
        ))
    }

    fn translate(filter: Option<&Expr>) -> RecordStoreResult<Document> {
        match filter {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn upsert_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> RecordStoreResult<()> {
        let target = self.get_collection(collection);

        iter(documents)
            .then(async |(id, doc)| {
                target
                    .replace_one(doc! { "_id": id }, self.prepare_document(&id, &doc)?)
                    .upsert(true)
                    .await
                    .map_err(backend_error)
            })
            .try_collect::<Vec<_>>()
            .await?;

        Ok(())
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> RecordStoreResult<()> {
        self.get_collection(collection)
            .delete_many(doc! { "_id": { "$in": ids } })
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn delete_matching(&self, filter: Option<Expr>, collection: &str) -> RecordStoreResult<u64> {
        let deleted = self.get_collection(collection)
            .delete_many(Self::translate(filter.as_ref())?)
            .await
            .map_err(backend_error)?
            .deleted_count;

        tracing::debug!(collection, deleted, "deleted matching documents");

        Ok(deleted)
    }

    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> RecordStoreResult<Vec<Bson>> {
        Ok(
            self.get_collection(collection)
                .find(doc! { "_id": { "$in": ids } })
                .await
                .map_err(backend_error)?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(backend_error)?
                .into_iter()
                .map(|doc| self.restore_document(doc))
                .collect()
        )
    }

    async fn query_documents(&self, query: Query, collection: &str) -> RecordStoreResult<Vec<Bson>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(skip) = query.offset {
            options.skip = Some(skip as u64);
        }
        if !query.sort.is_empty() {
            options.sort = Some(MongoQueryTranslator::sort(&query.sort));
        }
        if let Some(fields) = &query.projection {
            options.projection = Some(MongoQueryTranslator::projection(fields));
        }

        Ok(
            self.get_collection(collection)
                .find(Self::translate(query.filter.as_ref())?)
                .with_options(options)
                .await
                .map_err(backend_error)?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(backend_error)?
                .into_iter()
                .map(|doc| self.restore_document(doc))
                .collect()
        )
    }

    async fn count_documents(&self, query: Query, collection: &str) -> RecordStoreResult<u64> {
        let mut options = CountOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as u64);
        }
        if let Some(skip) = query.offset {
            options.skip = Some(skip as u64);
        }

        self.get_collection(collection)
            .count_documents(Self::translate(query.filter.as_ref())?)
            .with_options(options)
            .await
            .map_err(backend_error)
    }

    async fn distinct_values(&self, field: &str, query: Query, collection: &str) -> RecordStoreResult<Vec<Bson>> {
        Ok(
            self.get_collection(collection)
                .distinct(KeySanitizer::sanitize_path(field), Self::translate(query.filter.as_ref())?)
                .await
                .map_err(backend_error)?
                .iter()
                .map(KeySanitizer::restore_value)
                .collect()
        )
    }

    async fn list_collections(&self) -> RecordStoreResult<Vec<String>> {
        let mut names = self.client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(backend_error)?
            .iter()
            .map(|name| KeySanitizer::restore_key(name))
            .collect::<Vec<_>>();

        names.sort();

        Ok(names)
    }

    async fn drop_collection(&self, name: &str) -> RecordStoreResult<()> {
        self.get_collection(name)
            .drop()
            .await
            .map_err(backend_error)?;

        tracing::debug!(collection = name, "dropped collection");

        Ok(())
    }

    async fn shutdown(self) -> RecordStoreResult<()> {
        tracing::debug!(database = %self.database, "shutting down mongodb client");

        self.client.shutdown().await;

        Ok(())
    }
}

/// Connects a [`MongoDbStore`] from a connection string.
#[derive(Debug)]
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
    app_name: Option<String>,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
            app_name: None,
        }
    }

    /// Application name reported to the server in connection handshakes.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> RecordStoreResult<Self::Backend> {
        let mut options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| RecordStoreError::Initialization(e.to_string()))?;

        if self.app_name.is_some() {
            options.app_name = self.app_name;
        }

        let client = Client::with_options(options)
            .map_err(|e| RecordStoreError::Initialization(e.to_string()))?;

        tracing::info!(database = %self.database, "connected mongodb store");

        Ok(MongoDbStore::new(client, self.database))
    }
}
