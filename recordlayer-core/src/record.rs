//! The record contract and the helpers that stamp lifecycle metadata onto records.
//!
//! Every type managed by a [`RecordStore`](crate::store::RecordStore) implements [`Record`],
//! which exposes the well-known identity, audit and soft-delete fields. The contract is
//! checked at compile time: a type that lacks one of the fields simply cannot implement
//! the trait (and `#[derive(Record)]` reports the missing field by name).
//!
//! # Persisted layout
//!
//! The well-known fields are stored under the keys in [`fields`], next to whatever
//! fields the record type defines itself.
//!
//! # Example
//!
//! ```ignore
//! use recordlayer::{Record, bson::{Uuid, DateTime}};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
//! #[record(collection = "customers")]
//! pub struct Customer {
//!     pub id: Option<Uuid>,
//!     pub name: String,
//!     pub created_at: Option<DateTime>,
//!     pub created_by: Option<String>,
//!     pub updated_at: Option<DateTime>,
//!     pub updated_by: Option<String>,
//!     pub removed_at: Option<DateTime>,
//!     pub removed_by: Option<String>,
//!     #[serde(default)]
//!     pub is_removed: bool,
//! }
//! ```

use bson::{Bson, DateTime, Uuid, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value, to_value};

use crate::error::{RecordStoreError, RecordStoreResult};

/// Document keys of the well-known record fields.
pub mod fields {
    pub const ID: &str = "id";
    pub const CREATED_AT: &str = "created_at";
    pub const CREATED_BY: &str = "created_by";
    pub const UPDATED_AT: &str = "updated_at";
    pub const UPDATED_BY: &str = "updated_by";
    pub const REMOVED_AT: &str = "removed_at";
    pub const REMOVED_BY: &str = "removed_by";
    pub const IS_REMOVED: &str = "is_removed";
    /// Spelling of the soft-delete flag written by older versions of the data.
    pub const LEGACY_IS_REMOVED: &str = "IsRemoved";
}

/// Capability contract every stored record type must implement.
///
/// The accessors read and write the well-known fields through `&self` / `&mut self`,
/// so metadata stamped by the store is visible through the caller's own reference.
/// Prefer `#[derive(Record)]` over writing this by hand.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Name of the record type, recorded in change-log entries.
    fn model_name() -> &'static str;

    /// Name of the collection the record type is stored in.
    ///
    /// Defaults to [`Record::model_name`].
    fn collection_name() -> &'static str {
        Self::model_name()
    }

    /// The store-assigned identity, or `None` if the record was never created.
    fn id(&self) -> Option<Uuid>;
    fn set_id(&mut self, id: Uuid);

    fn created_at(&self) -> Option<DateTime>;
    fn set_created_at(&mut self, at: DateTime);
    fn created_by(&self) -> Option<&str>;
    fn set_created_by(&mut self, by: String);

    fn updated_at(&self) -> Option<DateTime>;
    fn set_updated_at(&mut self, at: DateTime);
    fn updated_by(&self) -> Option<&str>;
    fn set_updated_by(&mut self, by: String);

    fn removed_at(&self) -> Option<DateTime>;
    fn set_removed_at(&mut self, at: DateTime);
    fn removed_by(&self) -> Option<&str>;
    fn set_removed_by(&mut self, by: String);

    /// Soft-delete flag.
    fn is_removed(&self) -> bool;
    fn set_removed(&mut self, removed: bool);
}

/// Extension methods available on every [`Record`].
///
/// Provides format conversion and the metadata stamping used by the mutation
/// operations. Implemented automatically for all records.
pub trait RecordExt: Record {
    /// Returns the identity, failing with [`RecordStoreError::SchemaViolation`] when unset.
    fn require_id(&self) -> RecordStoreResult<Uuid>;

    /// Assigns a fresh identity and the creation metadata.
    fn stamp_created(&mut self, operator: &str, now: DateTime) -> Uuid;

    /// Refreshes the update metadata.
    fn stamp_updated(&mut self, operator: &str, now: DateTime);

    /// Flags the record as removed and sets the removal metadata.
    fn stamp_removed(&mut self, operator: &str, now: DateTime);

    /// Converts this record to a BSON value for storage.
    fn to_bson(&self) -> RecordStoreResult<Bson>;

    /// Creates a record from a BSON value.
    fn from_bson(bson: Bson) -> RecordStoreResult<Self>;

    /// Converts this record to a JSON value.
    fn to_json(&self) -> RecordStoreResult<Value>;

    /// Creates a record from a JSON value.
    fn from_json(value: Value) -> RecordStoreResult<Self>;
}

impl<R: Record> RecordExt for R {
    fn require_id(&self) -> RecordStoreResult<Uuid> {
        self.id().ok_or_else(|| {
            RecordStoreError::SchemaViolation(format!(
                "{} record has no identity; it must be created before this operation",
                R::model_name()
            ))
        })
    }

    fn stamp_created(&mut self, operator: &str, now: DateTime) -> Uuid {
        let id = Uuid::new();

        self.set_id(id);
        self.set_created_at(now);
        self.set_created_by(operator.to_string());

        id
    }

    fn stamp_updated(&mut self, operator: &str, now: DateTime) {
        self.set_updated_at(now);
        self.set_updated_by(operator.to_string());
    }

    fn stamp_removed(&mut self, operator: &str, now: DateTime) {
        self.set_removed(true);
        self.set_removed_at(now);
        self.set_removed_by(operator.to_string());
    }

    fn to_bson(&self) -> RecordStoreResult<Bson> {
        match serialize_to_bson(self)? {
            bson @ Bson::Document(_) => Ok(bson),
            other => Err(RecordStoreError::SchemaViolation(format!(
                "{} must serialize to a document, got {:?}",
                R::model_name(),
                other.element_type()
            ))),
        }
    }

    fn from_bson(bson: Bson) -> RecordStoreResult<Self> {
        Ok(deserialize_from_bson(bson)?)
    }

    fn to_json(&self) -> RecordStoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> RecordStoreResult<Self> {
        Ok(from_value(value)?)
    }
}
