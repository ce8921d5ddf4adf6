//! Record lifecycle and change-log layer over document stores.
//!
//! This crate is the primary entry point for users of recordlayer. It re-exports the
//! core types from the sub-crates, the `#[derive(Record)]` macro and the storage
//! backends.
//!
//! # Features
//!
//! - **Lifecycle metadata** - Creation, update and removal are stamped with time and operator
//! - **Soft deletion** - Deleted records stay stored but vanish from every filtered read
//! - **Change log** - Optional audit entries carrying a snapshot of the stored record
//! - **Multiple backends** - In-memory and MongoDB storage behind one backend trait
//!
//! # Quick Start
//!
//! ```ignore
//! use recordlayer::{prelude::*, memory::InMemoryStore, bson::{Uuid, DateTime}};
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
//!
//! #[tokio::main]
//! async fn main() -> RecordStoreResult<()> {
//!     let store = RecordStore::new(InMemoryStore::builder().build().await?);
//!
//!     let mut customer = Customer { name: "Acme".into(), ..Default::default() };
//!     store.op::<Customer>("alice", "signup").create_with_log(&mut customer).await?;
//!
//!     customer.name = "Acme Ltd".into();
//!     store.op::<Customer>("bob", "rename").save_with_log(&mut customer).await?;
//!
//!     let found = store
//!         .op::<Customer>("bob", "")
//!         .filter(Filter::starts_with("name", "Acme"))
//!         .find_all()
//!         .await?;
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! A store can be converted with [`RecordStore::into_dyn`](store::RecordStore::into_dyn)
//! when the backend is chosen at runtime. The resulting [`DynRecordStore`](store::DynRecordStore)
//! has the same API.
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - `mongodb` - Persistent MongoDB backend (requires the `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as recordlayer;

pub mod prelude;

pub use recordlayer_core::{
    backend, changelog, clock, collection, config, error, ops, page, query, record, scope, store,
};
pub use recordlayer_macros::Record;

pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use recordlayer_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use recordlayer_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
