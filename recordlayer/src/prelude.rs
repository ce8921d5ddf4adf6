//! Convenient re-exports of commonly used types from recordlayer.
//!
//! ```ignore
//! use recordlayer::prelude::*;
//! ```

pub use recordlayer_core::{
    backend::{DynStoreBackend, StoreBackend, StoreBackendBuilder},
    changelog::{ChangeLog, ChangeLogger, Operation},
    clock::{Clock, FixedClock, SystemClock},
    collection::{Collection, TypedCollection},
    config::{RecordStoreConfig, RecordStoreConfigBuilder},
    error::{RecordStoreError, RecordStoreResult},
    ops::RecordOp,
    page::{Page, PaginationParams},
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    record::{Record, RecordExt},
    scope::{QueryScope, RemovedFlag},
    store::{DynRecordStore, RecordStore},
};
pub use recordlayer_macros::Record;
