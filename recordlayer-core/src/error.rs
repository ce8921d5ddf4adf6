//! Error types and result types for record store operations.
//!
//! Every fallible operation in this crate returns [`RecordStoreResult<T>`]. Backend
//! failures are surfaced verbatim; nothing in this layer retries or recovers.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when operating on records.
#[derive(Error, Debug)]
pub enum RecordStoreError {
    /// The record (or a stored value) does not satisfy the record contract.
    ///
    /// This is a defect in the calling code, for example saving a record that was
    /// never created and therefore has no identity.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),
    /// An identity-scoped read found no matching document.
    /// The first argument is the record ID, the second is the collection name.
    #[error("Record {0} not found in collection {1}")]
    NotFound(String, String),
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// Serialization/deserialization error when converting between record formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// An error reported by the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl RecordStoreError {
    /// Returns `true` if this error is a [`RecordStoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecordStoreError::NotFound(..))
    }
}

/// A specialized `Result` type for record store operations.
pub type RecordStoreResult<T> = Result<T, RecordStoreError>;

impl From<BsonError> for RecordStoreError {
    fn from(err: BsonError) -> Self {
        RecordStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for RecordStoreError {
    fn from(err: SerdeJsonError) -> Self {
        RecordStoreError::Serialization(err.to_string())
    }
}
