//! In-memory storage backend for recordlayer.
//!
//! A thread-safe implementation of the `StoreBackend` trait over async-aware
//! read-write locks, for development, tests and small deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Full query support** - Filtering with dotted paths, multi-key sorting, pagination,
//!   projection and distinct values
//! - **Seeding** - Collections can be pre-populated through the builder
//!
//! # Quick Start
//!
//! ```ignore
//! use recordlayer::{prelude::*, memory::InMemoryStore};
//!
//! let store = RecordStore::new(InMemoryStore::builder().build().await?);
//! let mut customer = Customer { name: "Alice".into(), ..Default::default() };
//!
//! store.op::<Customer>("admin", "import").create(&mut customer).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as recordlayer_memory;

pub mod store;
pub mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
