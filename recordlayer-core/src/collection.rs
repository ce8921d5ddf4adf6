//! Collection handles bound to a backend.
//!
//! - [`Collection`] - untyped handle working on raw BSON documents
//! - [`TypedCollection`] - handle for one [`Record`] type
//!
//! Handles are cheap to create and hold only a name and a backend reference; they
//! apply no filtering of their own. Soft-delete filtering lives one level up, in
//! [`RecordOp`](crate::ops::RecordOp).

use bson::{Bson, Uuid};
use std::marker::PhantomData;

use crate::{
    backend::StoreBackend,
    error::RecordStoreResult,
    query::{Expr, Query},
    record::{Record, RecordExt},
};

/// An untyped collection with a reference to a storage backend.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts or replaces documents keyed by their IDs.
    pub async fn upsert(&self, documents: Vec<(Uuid, Bson)>) -> RecordStoreResult<()> {
        self.backend
            .upsert_documents(documents, &self.name)
            .await
    }

    /// Deletes documents by ID. Missing IDs are ignored.
    pub async fn delete(&self, ids: Vec<Uuid>) -> RecordStoreResult<()> {
        self.backend
            .delete_documents(ids, &self.name)
            .await
    }

    /// Deletes every document matching the filter verbatim.
    pub async fn delete_matching(&self, filter: Option<Expr>) -> RecordStoreResult<u64> {
        self.backend
            .delete_matching(filter, &self.name)
            .await
    }

    /// Retrieves documents by ID without any filtering.
    pub async fn get(&self, ids: Vec<Uuid>) -> RecordStoreResult<Vec<Bson>> {
        self.backend
            .get_documents(ids, &self.name)
            .await
    }

    /// Runs a query as given.
    pub async fn query(&self, query: Query) -> RecordStoreResult<Vec<Bson>> {
        self.backend
            .query_documents(query, &self.name)
            .await
    }

    pub async fn count(&self, query: Query) -> RecordStoreResult<u64> {
        self.backend
            .count_documents(query, &self.name)
            .await
    }

    pub async fn distinct(&self, field: &str, query: Query) -> RecordStoreResult<Vec<Bson>> {
        self.backend
            .distinct_values(field, query, &self.name)
            .await
    }
}

/// A collection handle for a single record type.
///
/// Records are converted to and from BSON at this boundary.
#[derive(Debug)]
pub struct TypedCollection<'a, B: StoreBackend, R: Record> {
    inner: Collection<'a, B>,
    _marker: PhantomData<R>,
}

impl<'a, B: StoreBackend, R: Record> TypedCollection<'a, B, R> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { inner: Collection::new(name, backend), _marker: PhantomData }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the untyped view of the same collection.
    pub fn raw(&self) -> &Collection<'a, B> {
        &self.inner
    }

    /// Inserts or replaces records keyed by their identity.
    ///
    /// # Errors
    ///
    /// Fails with [`SchemaViolation`](crate::error::RecordStoreError::SchemaViolation)
    /// if any record has no identity.
    pub async fn upsert(&self, records: &[R]) -> RecordStoreResult<()> {
        self.inner
            .upsert(
                records
                    .iter()
                    .map(|record| -> RecordStoreResult<(Uuid, Bson)> {
                        Ok((record.require_id()?, record.to_bson()?))
                    })
                    .collect::<RecordStoreResult<Vec<(Uuid, Bson)>>>()?,
            )
            .await
    }

    /// Deletes records by identity. Missing identities are ignored.
    pub async fn delete(&self, ids: Vec<Uuid>) -> RecordStoreResult<()> {
        self.inner.delete(ids).await
    }

    /// Retrieves records by identity without any filtering.
    pub async fn get(&self, ids: Vec<Uuid>) -> RecordStoreResult<Vec<R>> {
        self.inner
            .get(ids)
            .await?
            .into_iter()
            .map(R::from_bson)
            .collect()
    }

    /// Runs a query as given and decodes the results.
    pub async fn query(&self, query: Query) -> RecordStoreResult<Vec<R>> {
        self.inner
            .query(query)
            .await?
            .into_iter()
            .map(R::from_bson)
            .collect()
    }
}
