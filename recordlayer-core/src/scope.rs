//! Composition of caller queries with the soft-delete exclusion.
//!
//! Every read issued through a [`RecordOp`](crate::ops::RecordOp) is built here: the
//! caller's filter is AND-ed with the "not removed" predicate, a default sort is applied
//! when none was given, and zero skip/limit values are dropped. The only query that
//! escapes this composition is the raw filter used by bulk erase.

use bson::Uuid;
use serde::{Deserialize, Serialize};

use crate::{
    query::{Expr, Filter, Query, Sort, SortDirection},
    record::fields,
};

/// Names of the soft-delete flag a record may carry.
///
/// A document counts as removed when the flag is `true` under the canonical key or,
/// while `legacy` is set, under the legacy key. Absent or non-`true` values count as
/// not removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedFlag {
    pub canonical: String,
    pub legacy: Option<String>,
}

impl Default for RemovedFlag {
    fn default() -> Self {
        Self {
            canonical: fields::IS_REMOVED.to_string(),
            legacy: Some(fields::LEGACY_IS_REMOVED.to_string()),
        }
    }
}

impl RemovedFlag {
    /// Only the canonical key, for stores that ran the legacy flag migration.
    pub fn canonical_only() -> Self {
        Self { legacy: None, ..Self::default() }
    }

    /// The predicate matching documents that are not soft-deleted.
    pub fn not_removed(&self) -> Expr {
        let canonical = Filter::ne(self.canonical.as_str(), true);

        match &self.legacy {
            Some(legacy) => canonical.and(Filter::ne(legacy.as_str(), true)),
            None => canonical,
        }
    }
}

/// Volatile query state of one operation: filter, sort keys, skip and limit.
#[derive(Debug, Clone, Default)]
pub struct QueryScope {
    pub filter: Option<Expr>,
    pub sort: Vec<Sort>,
    pub skip: usize,
    pub limit: usize,
}

impl QueryScope {
    /// Sort applied when the caller gave none: newest update first, then newest creation.
    pub fn default_sort() -> Vec<Sort> {
        vec![
            Sort { field: fields::UPDATED_AT.to_string(), direction: SortDirection::Desc },
            Sort { field: fields::CREATED_AT.to_string(), direction: SortDirection::Desc },
        ]
    }

    /// The effective query for a filtered read.
    pub fn compose(&self, removed: &RemovedFlag) -> Query {
        self.build(self.filter.clone(), removed)
    }

    /// The effective query for a lookup by identity.
    ///
    /// The caller's filter is replaced by the identity match; the soft-delete exclusion,
    /// sort, skip and limit still apply.
    pub fn compose_for_id(&self, id: Uuid, removed: &RemovedFlag) -> Query {
        self.build(Some(Filter::eq(fields::ID, id)), removed)
    }

    /// The caller's filter verbatim, without the soft-delete exclusion.
    pub fn raw_filter(&self) -> Option<Expr> {
        self.filter.clone()
    }

    fn build(&self, filter: Option<Expr>, removed: &RemovedFlag) -> Query {
        let filter = match filter {
            Some(Expr::And(mut list)) => {
                list.push(removed.not_removed());
                Expr::And(list)
            }
            Some(expr) => Expr::And(vec![expr, removed.not_removed()]),
            None => removed.not_removed(),
        };

        Query {
            filter: Some(filter),
            limit: (self.limit != 0).then_some(self.limit),
            offset: (self.skip != 0).then_some(self.skip),
            sort: if self.sort.is_empty() {
                Self::default_sort()
            } else {
                self.sort.clone()
            },
            projection: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FieldOp;
    use bson::Bson;

    fn not_removed(field: &str) -> Expr {
        Expr::field(field.to_string(), FieldOp::Ne, Bson::Boolean(true))
    }

    #[test]
    fn empty_scope_excludes_removed_under_both_spellings() {
        let query = QueryScope::default().compose(&RemovedFlag::default());

        assert_eq!(
            query.filter,
            Some(Expr::And(vec![not_removed("is_removed"), not_removed("IsRemoved")]))
        );
        assert_eq!(query.sort, QueryScope::default_sort());
        assert_eq!(query.limit, None);
        assert_eq!(query.offset, None);
    }

    #[test]
    fn caller_filter_is_and_composed() {
        let scope = QueryScope {
            filter: Some(Filter::eq("name", "A")),
            ..Default::default()
        };

        let query = scope.compose(&RemovedFlag::canonical_only());

        assert_eq!(
            query.filter,
            Some(Expr::And(vec![Filter::eq("name", "A"), not_removed("is_removed")]))
        );
    }

    #[test]
    fn caller_conjunction_is_extended_not_nested() {
        let scope = QueryScope {
            filter: Some(Filter::and([Filter::eq("a", 1), Filter::eq("b", 2)])),
            ..Default::default()
        };

        match scope.compose(&RemovedFlag::canonical_only()).filter {
            Some(Expr::And(list)) => assert_eq!(list.len(), 3),
            other => panic!("expected conjunction, got {other:?}"),
        }
    }

    #[test]
    fn explicit_sort_skip_and_limit_pass_through() {
        let scope = QueryScope {
            sort: vec![Sort::asc("name")],
            skip: 5,
            limit: 10,
            ..Default::default()
        };

        let query = scope.compose(&RemovedFlag::default());

        assert_eq!(query.sort, vec![Sort::asc("name")]);
        assert_eq!(query.offset, Some(5));
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn id_lookup_replaces_caller_filter_but_keeps_exclusion() {
        let id = Uuid::new();
        let scope = QueryScope {
            filter: Some(Filter::eq("name", "A")),
            ..Default::default()
        };

        let query = scope.compose_for_id(id, &RemovedFlag::canonical_only());

        assert_eq!(
            query.filter,
            Some(Expr::And(vec![Filter::eq("id", id), not_removed("is_removed")]))
        );
    }

    #[test]
    fn raw_filter_skips_exclusion() {
        let scope = QueryScope::default();

        assert_eq!(scope.raw_filter(), None);
    }
}
