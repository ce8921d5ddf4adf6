//! Append-only audit trail of record mutations.
//!
//! A [`ChangeLog`] entry records who changed which record, when, why, and the state
//! the record was in. Entries reference the record only by identity and type name and
//! carry their own copy of its state, so they stay meaningful after the record is
//! erased. Nothing in this crate updates or deletes an entry once written.
//!
//! # Snapshot source
//!
//! The snapshot is re-read from the record's collection rather than taken from the
//! caller's in-memory copy, so it reflects what the backend actually holds. The price
//! is a window between the mutation and the re-read: a concurrent writer can land in
//! it, and the entry then shows that writer's state.

use bson::{Bson, DateTime, Uuid, ser::serialize_to_bson};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    backend::StoreBackend,
    clock::Clock,
    error::{RecordStoreError, RecordStoreResult},
    query::{Filter, Query, SortDirection},
    record::{Record, RecordExt, fields},
};

/// The mutation a change-log entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Erase,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Erase => "ERASE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable change-log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLog {
    pub id: Uuid,
    pub created_at: DateTime,
    pub created_by: String,
    pub change_reason: String,
    pub operation: Operation,
    /// Identity of the record the entry describes.
    pub model_obj_id: Uuid,
    /// [`Record::model_name`] of the record type.
    pub model_name: String,
    /// The record document as stored when the entry was written.
    pub model_value: Bson,
}

impl ChangeLog {
    /// Decodes the embedded snapshot as the given record type.
    pub fn snapshot<R: Record>(&self) -> RecordStoreResult<R> {
        R::from_bson(self.model_value.clone())
    }
}

mod keys {
    pub const MODEL_OBJ_ID: &str = "model_obj_id";
    pub const MODEL_NAME: &str = "model_name";
}

/// Writes and reads change-log entries in the shared log collection.
#[derive(Debug)]
pub struct ChangeLogger<'a, B: StoreBackend> {
    backend: &'a B,
    collection: &'a str,
    clock: &'a dyn Clock,
}

impl<'a, B: StoreBackend> ChangeLogger<'a, B> {
    pub(crate) fn new(backend: &'a B, collection: &'a str, clock: &'a dyn Clock) -> Self {
        Self { backend, collection, clock }
    }

    /// Name of the log collection.
    pub fn collection_name(&self) -> &str {
        self.collection
    }

    /// Snapshots the stored record `id` from `record_collection` and appends an entry.
    ///
    /// The record is read by identity alone, so soft-deleted records can be logged.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::NotFound`] if the record is not stored, or the
    /// backend error of the read or the write.
    pub async fn record<R: Record>(
        &self,
        operation: Operation,
        operator: &str,
        reason: &str,
        record_collection: &str,
        id: Uuid,
    ) -> RecordStoreResult<ChangeLog> {
        let model_value = self
            .backend
            .get_documents(vec![id], record_collection)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RecordStoreError::NotFound(id.to_string(), record_collection.to_string()))?;

        let entry = ChangeLog {
            id: Uuid::new(),
            created_at: self.clock.now_bson(),
            created_by: operator.to_string(),
            change_reason: reason.to_string(),
            operation,
            model_obj_id: id,
            model_name: R::model_name().to_string(),
            model_value,
        };

        self.backend
            .upsert_documents(vec![(entry.id, serialize_to_bson(&entry)?)], self.collection)
            .await?;

        tracing::info!(
            log_id = %entry.id,
            record_id = %id,
            model = R::model_name(),
            operation = %operation,
            operator,
            "change log entry written"
        );

        Ok(entry)
    }

    /// All entries for one record, oldest first.
    pub async fn history(&self, model_name: &str, id: Uuid) -> RecordStoreResult<Vec<ChangeLog>> {
        self.query(
            Query::builder()
                .filter(Filter::eq(keys::MODEL_NAME, model_name).and(Filter::eq(keys::MODEL_OBJ_ID, id)))
                .sort(fields::CREATED_AT, SortDirection::Asc)
                .build(),
        )
        .await
    }

    /// All entries in the log, oldest first.
    pub async fn entries(&self) -> RecordStoreResult<Vec<ChangeLog>> {
        self.query(
            Query::builder()
                .sort(fields::CREATED_AT, SortDirection::Asc)
                .build(),
        )
        .await
    }

    async fn query(&self, query: Query) -> RecordStoreResult<Vec<ChangeLog>> {
        self.backend
            .query_documents(query, self.collection)
            .await?
            .into_iter()
            .map(|doc| -> RecordStoreResult<ChangeLog> { Ok(bson::de::deserialize_from_bson(doc)?) })
            .collect()
    }
}
