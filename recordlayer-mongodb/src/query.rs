//! Query translation from recordlayer expressions to MongoDB query syntax.

use bson::{Bson, Document, doc};

use recordlayer_core::{
    error::RecordStoreError,
    query::{Expr, FieldOp, QueryVisitor, Sort, SortDirection},
};

use crate::sanitizer::KeySanitizer;

/// Translates filter expressions into MongoDB query documents.
///
/// Field paths are sanitized the same way stored keys are, so filters address the
/// keys as they were written.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Builds a `$sort` document, keys in order.
    pub(crate) fn sort(sort: &[Sort]) -> Document {
        sort.iter()
            .map(|key| {
                (
                    KeySanitizer::sanitize_path(&key.field),
                    Bson::Int32(match key.direction {
                        SortDirection::Asc => 1,
                        SortDirection::Desc => -1,
                    }),
                )
            })
            .collect()
    }

    /// Builds an inclusion projection. The record `id` is always included.
    pub(crate) fn projection(fields: &[String]) -> Document {
        let mut projection = doc! { "id": 1 };

        for field in fields {
            projection.insert(KeySanitizer::sanitize_path(field), 1);
        }

        projection
    }
}

/// Escapes regular expression metacharacters so a value matches literally.
fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());

    for c in input.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = RecordStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        // `$not` only applies to a single field; `$nor` negates a whole expression.
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        let path = KeySanitizer::sanitize_path(field);

        Ok(doc! {
            path: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let path = KeySanitizer::sanitize_path(field);
        let values = match value {
            Bson::Array(_) => value.clone(),
            single => Bson::Array(vec![single.clone()]),
        };

        Ok(doc! {
            path: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Ne => doc! { "$ne": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::Lt => doc! { "$lt": value },
                FieldOp::Lte => doc! { "$lte": value },
                FieldOp::Contains => match value {
                    Bson::String(s) => doc! { "$regex": escape_regex(s) },
                    other => doc! { "$eq": other },
                },
                FieldOp::StartsWith => match value {
                    Bson::String(s) => doc! { "$regex": format!("^{}", escape_regex(s)) },
                    _ => return Err(RecordStoreError::Backend("StartsWith operator requires a string value".to_string())),
                },
                FieldOp::AnyOf => doc! { "$in": values },
                FieldOp::NoneOf => doc! { "$nin": values },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordlayer_core::query::Filter;

    #[test]
    fn soft_delete_exclusion_translates_to_ne() {
        let expr = Filter::ne("is_removed", true).and(Filter::ne("IsRemoved", true));

        assert_eq!(
            MongoQueryTranslator.visit_expr(&expr).unwrap(),
            doc! {
                "$and": [
                    { "is_removed": { "$ne": true } },
                    { "IsRemoved": { "$ne": true } },
                ]
            }
        );
    }

    #[test]
    fn not_uses_nor() {
        let expr = Filter::eq("name", "a").not();

        assert_eq!(
            MongoQueryTranslator.visit_expr(&expr).unwrap(),
            doc! { "$nor": [{ "name": { "$eq": "a" } }] }
        );
    }

    #[test]
    fn string_matches_escape_metacharacters() {
        assert_eq!(
            MongoQueryTranslator.visit_expr(&Filter::starts_with("name", "a.b")).unwrap(),
            doc! { "name": { "$regex": "^a\\.b" } }
        );
    }

    #[test]
    fn sort_keeps_key_order() {
        let sort = MongoQueryTranslator::sort(&[Sort::desc("updated_at"), Sort::desc("created_at")]);

        assert_eq!(sort, doc! { "updated_at": -1, "created_at": -1 });
    }
}
