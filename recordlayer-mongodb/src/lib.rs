//! MongoDB backend implementation for recordlayer.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait.
//! Filters, sorting, projection, counting and distinct values all run in the
//! MongoDB query engine.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! recordlayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Storage layout
//!
//! Every record is stored as one document whose `_id` is the record identity. Keys
//! containing `.`, `$` or NUL are escaped on write and restored on read.
//!
//! # Example
//!
//! ```ignore
//! use recordlayer::{backend::StoreBackendBuilder, mongodb::MongoDbStore, RecordStore};
//!
//! let backend = MongoDbStore::builder("mongodb://localhost:27017", "crm")
//!     .app_name("billing")
//!     .build()
//!     .await?;
//! let store = RecordStore::new(backend);
//! ```

#[allow(unused_extern_crates)]
extern crate self as recordlayer_mongodb;

pub mod store;
pub mod query;
pub mod sanitizer;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
