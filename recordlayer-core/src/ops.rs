//! The record-operation engine.
//!
//! A [`RecordOp`] is the context of one logical operation on one record type: the
//! collection handles, the acting operator, the reason given for a change, and the
//! volatile query state (filter, sort, skip, limit). Create one per call chain from
//! [`RecordStore::op`](crate::store::RecordStore::op); never share one between
//! concurrent callers.
//!
//! # Mutations
//!
//! | operation | metadata written                         | persistence        |
//! |-----------|------------------------------------------|--------------------|
//! | create    | fresh `id`, `created_at`, `created_by`   | upsert by identity |
//! | save      | `updated_at`, `updated_by`               | upsert by identity |
//! | delete    | `is_removed`, `removed_at`, `removed_by` | upsert by identity |
//! | erase     | none                                     | remove by identity |
//!
//! The `*_with_log` variants add a change-log entry. Create, save and delete mutate
//! first and then log the stored state; erase logs first, because nothing is left to
//! snapshot afterwards. A failed log write after a successful mutation is returned as
//! an error but the mutation stays in place.
//!
//! # Reads
//!
//! Every read composes the query state with the soft-delete exclusion (see
//! [`scope`](crate::scope)). [`RecordOp::erase_all`] is the one exception and uses the
//! caller's filter verbatim.
//!
//! ```ignore
//! let mut customer = Customer { name: "A".into(), ..Default::default() };
//!
//! store.op::<Customer>("alice", "onboarding").create(&mut customer).await?;
//! store.op::<Customer>("bob", "duplicate account").delete_with_log(&mut customer).await?;
//!
//! let visible = store
//!     .op::<Customer>("carol", "")
//!     .filter(Filter::starts_with("name", "A"))
//!     .find_all()
//!     .await?;
//! ```

use bson::{Bson, Uuid};
use std::marker::PhantomData;

use crate::{
    backend::StoreBackend,
    changelog::{ChangeLog, ChangeLogger, Operation},
    clock::Clock,
    collection::TypedCollection,
    config::RecordStoreConfig,
    error::{RecordStoreError, RecordStoreResult},
    page::{Page, PaginationParams},
    query::{Expr, Query, Sort, SortDirection},
    record::{Record, RecordExt},
    scope::QueryScope,
};

/// Operation context for record type `R` on backend `B`.
#[derive(Debug)]
pub struct RecordOp<'a, B: StoreBackend, R: Record> {
    backend: &'a B,
    config: &'a RecordStoreConfig,
    clock: &'a dyn Clock,
    collection: String,
    operator: String,
    reason: String,
    scope: QueryScope,
    _marker: PhantomData<R>,
}

impl<'a, B: StoreBackend, R: Record> RecordOp<'a, B, R> {
    pub(crate) fn new(
        backend: &'a B,
        config: &'a RecordStoreConfig,
        clock: &'a dyn Clock,
        operator: String,
        reason: String,
    ) -> Self {
        Self {
            backend,
            config,
            clock,
            collection: R::collection_name().to_string(),
            operator,
            reason,
            scope: QueryScope::default(),
            _marker: PhantomData,
        }
    }

    /// Targets an explicitly named collection instead of [`Record::collection_name`].
    pub fn in_collection(mut self, name: impl Into<String>) -> Self {
        self.collection = name.into();
        self
    }

    /// Sets the caller filter, AND-composed with the soft-delete exclusion on reads.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.scope.filter = Some(filter);
        self
    }

    /// Appends a sort key. Without any, reads sort by newest update, then newest creation.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.scope.sort.push(Sort { field: field.into(), direction });
        self
    }

    /// Number of records to skip; zero means none.
    pub fn skip(mut self, skip: usize) -> Self {
        self.scope.skip = skip;
        self
    }

    /// Maximum number of records to return; zero means no limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.scope.limit = limit;
        self
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Handle on the record collection, bypassing all filtering.
    pub fn records(&self) -> TypedCollection<'a, B, R> {
        TypedCollection::new(self.collection.clone(), self.backend)
    }

    /// Handle on the shared change-log collection.
    pub fn change_log(&self) -> ChangeLogger<'a, B> {
        ChangeLogger::new(self.backend, &self.config.change_log_collection, self.clock)
    }

    // ---- mutations ----

    /// Assigns a fresh identity and the creation metadata, then upserts the record.
    ///
    /// Calling this again on the same record creates a second stored record under a
    /// new identity. The caller's record only receives the new metadata once the
    /// upsert succeeded; on failure it is left untouched.
    pub async fn create(&self, record: &mut R) -> RecordStoreResult<Uuid> {
        let mut stamped = record.clone();
        let id = stamped.stamp_created(&self.operator, self.clock.now_bson());

        tracing::debug!(collection = %self.collection, %id, operator = %self.operator, "creating record");

        self.persist(record, stamped).await?;

        Ok(id)
    }

    /// Refreshes the update metadata, then upserts the record.
    ///
    /// An identity that is not stored yet is inserted.
    ///
    /// # Errors
    ///
    /// Fails with [`RecordStoreError::SchemaViolation`] if the record was never created.
    pub async fn save(&self, record: &mut R) -> RecordStoreResult<()> {
        let id = record.require_id()?;
        let mut stamped = record.clone();
        stamped.stamp_updated(&self.operator, self.clock.now_bson());

        tracing::debug!(collection = %self.collection, %id, operator = %self.operator, "saving record");

        self.persist(record, stamped).await
    }

    /// Soft-deletes the record: flags it removed, stamps the removal metadata and upserts it.
    ///
    /// Filtered reads no longer return it; it stays in storage until erased.
    pub async fn delete(&self, record: &mut R) -> RecordStoreResult<()> {
        let id = record.require_id()?;
        let mut stamped = record.clone();
        stamped.stamp_removed(&self.operator, self.clock.now_bson());

        tracing::debug!(collection = %self.collection, %id, operator = %self.operator, "soft-deleting record");

        self.persist(record, stamped).await
    }

    /// Upserts `stamped` and only then hands it back through `record`.
    async fn persist(&self, record: &mut R, stamped: R) -> RecordStoreResult<()> {
        self.records().upsert(std::slice::from_ref(&stamped)).await?;
        *record = stamped;

        Ok(())
    }

    /// Permanently removes the record. Succeeds if it is already gone.
    pub async fn erase(&self, record: &R) -> RecordStoreResult<()> {
        let id = record.require_id()?;

        tracing::debug!(collection = %self.collection, %id, operator = %self.operator, "erasing record");

        self.records().delete(vec![id]).await
    }

    /// [`create`](Self::create), then a `CREATE` entry with the stored state.
    pub async fn create_with_log(&self, record: &mut R) -> RecordStoreResult<ChangeLog> {
        let id = self.create(record).await?;

        self.log_after(Operation::Create, id).await
    }

    /// [`save`](Self::save), then an `UPDATE` entry with the stored state.
    pub async fn save_with_log(&self, record: &mut R) -> RecordStoreResult<ChangeLog> {
        self.save(record).await?;

        self.log_after(Operation::Update, record.require_id()?).await
    }

    /// [`delete`](Self::delete), then a `DELETE` entry with the stored state.
    pub async fn delete_with_log(&self, record: &mut R) -> RecordStoreResult<ChangeLog> {
        self.delete(record).await?;

        self.log_after(Operation::Delete, record.require_id()?).await
    }

    /// An `ERASE` entry with the state stored before removal, then [`erase`](Self::erase).
    ///
    /// Nothing is erased if the entry cannot be written.
    pub async fn erase_with_log(&self, record: &R) -> RecordStoreResult<ChangeLog> {
        let entry = self
            .log(Operation::Erase, record.require_id()?)
            .await?;

        self.erase(record).await?;

        Ok(entry)
    }

    async fn log(&self, operation: Operation, id: Uuid) -> RecordStoreResult<ChangeLog> {
        self.change_log()
            .record::<R>(operation, &self.operator, &self.reason, &self.collection, id)
            .await
    }

    async fn log_after(&self, operation: Operation, id: Uuid) -> RecordStoreResult<ChangeLog> {
        self.log(operation, id)
            .await
            .inspect_err(|err| {
                tracing::warn!(
                    collection = %self.collection,
                    %id,
                    %operation,
                    error = %err,
                    "mutation persisted but change log entry was not written"
                )
            })
    }

    // ---- reads ----

    /// The composed query for the current state, for chaining against
    /// [`records`](Self::records) or a backend directly.
    pub fn query(&self) -> Query {
        self.scope.compose(&self.config.removed_flag)
    }

    /// Number of visible records matching the filter, within skip/limit.
    pub async fn count(&self) -> RecordStoreResult<u64> {
        self.records()
            .raw()
            .count(self.query())
            .await
    }

    /// All visible records matching the filter.
    pub async fn find_all(&self) -> RecordStoreResult<Vec<R>> {
        tracing::debug!(collection = %self.collection, "finding records");

        self.records().query(self.query()).await
    }

    /// The visible record with the given identity.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::NotFound`] when no such record is stored or it is
    /// soft-deleted.
    pub async fn get(&self, id: Uuid) -> RecordStoreResult<R> {
        self.records()
            .query(self.scope.compose_for_id(id, &self.config.removed_flag))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| self.not_found(id.to_string()))
    }

    /// Replaces `record` with its stored, visible state.
    pub async fn reload(&self, record: &mut R) -> RecordStoreResult<()> {
        *record = self.get(record.require_id()?).await?;

        Ok(())
    }

    /// The first visible record matching the filter in sort order.
    pub async fn get_by_filter(&self) -> RecordStoreResult<R> {
        let mut query = self.query();
        query.limit = Some(1);

        self.records()
            .query(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| self.not_found("<filter>".to_string()))
    }

    /// Visible records matching the filter, reduced to the given fields.
    pub async fn find_with_select(&self, fields: &[&str]) -> RecordStoreResult<Vec<Bson>> {
        let mut query = self.query();
        query.projection = Some(fields.iter().map(|field| field.to_string()).collect());

        self.records().raw().query(query).await
    }

    /// The visible record with the given identity, reduced to the given fields.
    pub async fn get_with_select(&self, id: Uuid, fields: &[&str]) -> RecordStoreResult<Bson> {
        let mut query = self.scope.compose_for_id(id, &self.config.removed_flag);
        query.projection = Some(fields.iter().map(|field| field.to_string()).collect());

        self.records()
            .raw()
            .query(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| self.not_found(id.to_string()))
    }

    /// Distinct values of `field` among visible records matching the filter.
    pub async fn distinct(&self, field: &str) -> RecordStoreResult<Vec<Bson>> {
        self.records()
            .raw()
            .distinct(field, self.query())
            .await
    }

    /// One page of visible records matching the filter. The page parameters take the
    /// place of skip/limit.
    pub async fn find_page(&self, params: PaginationParams) -> RecordStoreResult<Page<R>> {
        let mut query = self.query();
        query.offset = None;
        query.limit = None;

        let count = self.records().raw().count(query.clone()).await?;

        query.offset = Some(params.offset()).filter(|offset| *offset > 0);
        query.limit = Some(params.per_page).filter(|limit| *limit > 0);

        let items = self.records().query(query).await?;

        Ok(params.page_of(items, count))
    }

    /// Permanently removes every record matching the filter, soft-deleted or not.
    ///
    /// Without a filter this empties the collection.
    pub async fn erase_all(&self) -> RecordStoreResult<u64> {
        let erased = self
            .records()
            .raw()
            .delete_matching(self.scope.raw_filter())
            .await?;

        tracing::debug!(collection = %self.collection, erased, operator = %self.operator, "erased matching records");

        Ok(erased)
    }

    fn not_found(&self, what: String) -> RecordStoreError {
        RecordStoreError::NotFound(what, self.collection.clone())
    }
}
