//! Storage backend abstraction.
//!
//! A backend is the already-connected document store this layer runs on. It stores
//! documents as BSON keyed by UUID, one collection per record type, and evaluates the
//! [`Query`] values built by the filter composition in [`scope`](crate::scope).
//!
//! - [`StoreBackend`]: the core trait for storage backends
//! - [`DynStoreBackend`]: object-safe companion used for runtime backend selection
//! - [`StoreBackendBuilder`]: factory trait for creating backend instances
//!
//! ```ignore
//! use recordlayer::backend::StoreBackend;
//! use bson::{Uuid, Bson, doc};
//!
//! let backend = MyBackendImpl::new();
//! let id = Uuid::new();
//! backend.upsert_documents(vec![(id, Bson::Document(doc! { "name": "Alice" }))], "users").await?;
//! ```

use async_trait::async_trait;
use bson::{Bson, Uuid};
use std::fmt::Debug;

use crate::{
    error::RecordStoreResult,
    query::{Expr, Query},
};

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` and support concurrent calls from many
/// operations at once. The only consistency this layer relies on is that a single
/// upsert replaces the whole stored document atomically.
///
/// # Cancellation
///
/// This layer sets no timeouts. Dropping a returned future is the cancellation
/// mechanism; backends decide what that means for in-flight requests.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts documents, replacing any stored document with the same ID entirely.
    ///
    /// Collections are created on first write.
    async fn upsert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> RecordStoreResult<()>;

    /// Deletes documents by ID. IDs that do not exist are skipped.
    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> RecordStoreResult<()>;

    /// Deletes every document matching `filter`, or every document when `filter` is `None`.
    ///
    /// Returns the number of deleted documents.
    async fn delete_matching(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> RecordStoreResult<u64>;

    /// Retrieves documents by ID, unfiltered. Missing IDs are omitted from the result.
    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>>;

    /// Runs a query: filter, sort keys in order, offset, limit, then projection.
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>>;

    /// Counts the documents a query would return, honouring offset and limit.
    async fn count_documents(&self, query: Query, collection: &str) -> RecordStoreResult<u64>;

    /// Returns the distinct values of `field` among documents matching the query filter.
    ///
    /// Array values contribute their elements.
    async fn distinct_values(
        &self,
        field: &str,
        query: Query,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> RecordStoreResult<Vec<String>>;

    /// Drops a collection and all its documents.
    async fn drop_collection(&self, name: &str) -> RecordStoreResult<()>;

    /// Releases backend resources. The default implementation is a no-op.
    async fn shutdown(self) -> RecordStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn upsert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> RecordStoreResult<()> {
        (*self)
            .upsert_documents(documents, collection)
            .await
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> RecordStoreResult<()> {
        (*self)
            .delete_documents(ids, collection)
            .await
    }

    async fn delete_matching(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> RecordStoreResult<u64> {
        (*self)
            .delete_matching(filter, collection)
            .await
    }

    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>> {
        (*self)
            .get_documents(ids, collection)
            .await
    }

    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>> {
        (*self)
            .query_documents(query, collection)
            .await
    }

    async fn count_documents(&self, query: Query, collection: &str) -> RecordStoreResult<u64> {
        (*self)
            .count_documents(query, collection)
            .await
    }

    async fn distinct_values(
        &self,
        field: &str,
        query: Query,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>> {
        (*self)
            .distinct_values(field, query, collection)
            .await
    }

    async fn list_collections(&self) -> RecordStoreResult<Vec<String>> {
        (*self).list_collections().await
    }

    async fn drop_collection(&self, name: &str) -> RecordStoreResult<()> {
        (*self).drop_collection(name).await
    }
}

/// Object-safe form of [`StoreBackend`], implemented for every backend.
///
/// `Box<dyn DynStoreBackend>` itself implements [`StoreBackend`], so a store can be
/// built over a backend chosen at runtime.
#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn upsert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> RecordStoreResult<()>;
    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> RecordStoreResult<()>;
    async fn delete_matching(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> RecordStoreResult<u64>;
    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>>;
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>>;
    async fn count_documents(&self, query: Query, collection: &str) -> RecordStoreResult<u64>;
    async fn distinct_values(
        &self,
        field: &str,
        query: Query,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>>;
    async fn list_collections(&self) -> RecordStoreResult<Vec<String>>;
    async fn drop_collection(&self, name: &str) -> RecordStoreResult<()>;
    async fn shutdown_boxed(self: Box<Self>) -> RecordStoreResult<()>;
}

#[async_trait]
impl<B: StoreBackend + 'static> DynStoreBackend for B {
    async fn upsert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> RecordStoreResult<()> {
        StoreBackend::upsert_documents(self, documents, collection).await
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> RecordStoreResult<()> {
        StoreBackend::delete_documents(self, ids, collection).await
    }

    async fn delete_matching(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> RecordStoreResult<u64> {
        StoreBackend::delete_matching(self, filter, collection).await
    }

    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>> {
        StoreBackend::get_documents(self, ids, collection).await
    }

    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>> {
        StoreBackend::query_documents(self, query, collection).await
    }

    async fn count_documents(&self, query: Query, collection: &str) -> RecordStoreResult<u64> {
        StoreBackend::count_documents(self, query, collection).await
    }

    async fn distinct_values(
        &self,
        field: &str,
        query: Query,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>> {
        StoreBackend::distinct_values(self, field, query, collection).await
    }

    async fn list_collections(&self) -> RecordStoreResult<Vec<String>> {
        StoreBackend::list_collections(self).await
    }

    async fn drop_collection(&self, name: &str) -> RecordStoreResult<()> {
        StoreBackend::drop_collection(self, name).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> RecordStoreResult<()> {
        StoreBackend::shutdown(*self).await
    }
}

#[async_trait]
impl StoreBackend for Box<dyn DynStoreBackend> {
    async fn upsert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> RecordStoreResult<()> {
        (**self)
            .upsert_documents(documents, collection)
            .await
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> RecordStoreResult<()> {
        (**self)
            .delete_documents(ids, collection)
            .await
    }

    async fn delete_matching(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> RecordStoreResult<u64> {
        (**self)
            .delete_matching(filter, collection)
            .await
    }

    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>> {
        (**self)
            .get_documents(ids, collection)
            .await
    }

    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>> {
        (**self)
            .query_documents(query, collection)
            .await
    }

    async fn count_documents(&self, query: Query, collection: &str) -> RecordStoreResult<u64> {
        (**self)
            .count_documents(query, collection)
            .await
    }

    async fn distinct_values(
        &self,
        field: &str,
        query: Query,
        collection: &str,
    ) -> RecordStoreResult<Vec<Bson>> {
        (**self)
            .distinct_values(field, query, collection)
            .await
    }

    async fn list_collections(&self) -> RecordStoreResult<Vec<String>> {
        (**self).list_collections().await
    }

    async fn drop_collection(&self, name: &str) -> RecordStoreResult<()> {
        (**self).drop_collection(name).await
    }

    async fn shutdown(self) -> RecordStoreResult<()> {
        self.shutdown_boxed().await
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> RecordStoreResult<Self::Backend>;
}
