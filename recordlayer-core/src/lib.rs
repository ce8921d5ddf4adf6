//! A thin record-operation layer over a document store, with lifecycle metadata,
//! soft deletion and an append-only change log.
//!
//! This crate is the core of the recordlayer project and provides:
//!
//! - **Record contract** ([`record`]) - The well-known identity, audit and soft-delete fields
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Query and filtering API** ([`query`]) - Filter expressions and query descriptions
//! - **Filter composition** ([`scope`]) - Soft-delete exclusion and default ordering for reads
//! - **Operation engine** ([`ops`]) - Create, save, delete, erase and the filtered reads
//! - **Change log** ([`changelog`]) - Audit entries with record snapshots
//! - **Record store** ([`store`]) - Entry point owning backend, configuration and clock
//! - **Collections** ([`collection`]) - Unfiltered raw and typed collection handles
//! - **Configuration** ([`config`]) and **clocks** ([`clock`])
//! - **Pagination** ([`page`]) and **errors** ([`error`])
//!
//! # Example
//!
//! ```ignore
//! use recordlayer::{prelude::*, memory::InMemoryStore};
//!
//! let store = RecordStore::new(InMemoryStore::new());
//! let op = store.op::<Customer>("alice", "signup");
//!
//! let mut customer = Customer { name: "Acme".into(), ..Default::default() };
//! op.create_with_log(&mut customer).await?;
//!
//! let visible = store.op::<Customer>("alice", "").find_all().await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as recordlayer_core;

pub mod backend;
pub mod changelog;
pub mod clock;
pub mod collection;
pub mod config;
pub mod error;
pub mod ops;
pub mod page;
pub mod query;
pub mod record;
pub mod scope;
pub mod store;
