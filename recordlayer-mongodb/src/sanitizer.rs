//! Document key sanitization for MongoDB compatibility.
//!
//! MongoDB restricts field names: dots address embedded fields and a leading dollar
//! sign marks an operator. Keys are escaped on the way in and restored on the way
//! out. String values are stored untouched.

use bson::Bson;

/// Escapes and restores document keys.
///
/// Replaced sequences:
/// - Dots (`.`)
/// - Dollar signs (`$`)
/// - Null bytes (`\0`)
pub(crate) struct KeySanitizer;

impl KeySanitizer {
    const REPLACEMENTS: [(&'static str, &'static str); 3] = [
        (".", "__dot__"),
        ("$", "__dollar__"),
        ("\0", "__null__"),
    ];

    /// Recursively escapes the keys of every embedded document.
    pub(crate) fn sanitize_value(value: &Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(
                arr
                    .iter()
                    .map(Self::sanitize_value)
                    .collect(),
            ),
            Bson::Document(doc) => Bson::Document(
                doc.iter()
                    .map(|(k, v)| (Self::sanitize_key(k), Self::sanitize_value(v)))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    pub(crate) fn sanitize_key(input: &str) -> String {
        let mut sanitized = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter() {
            sanitized = sanitized.replace(*target, *replacement);
        }
        sanitized
    }

    /// Escapes each segment of a dotted field path, keeping the dots as path separators.
    pub(crate) fn sanitize_path(path: &str) -> String {
        path
            .split('.')
            .map(Self::sanitize_key)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Inverse of [`sanitize_value`](Self::sanitize_value).
    pub(crate) fn restore_value(value: &Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(
                arr
                    .iter()
                    .map(Self::restore_value)
                    .collect(),
            ),
            Bson::Document(doc) => Bson::Document(
                doc.iter()
                    .map(|(k, v)| (Self::restore_key(k), Self::restore_value(v)))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    pub(crate) fn restore_key(input: &str) -> String {
        let mut restored = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter().rev() {
            restored = restored.replace(*replacement, *target);
        }
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn keys_are_escaped_and_values_kept() {
        let value = Bson::Document(doc! { "a.b": { "$c": "x.y$" } });
        let sanitized = KeySanitizer::sanitize_value(&value);

        assert_eq!(
            sanitized,
            Bson::Document(doc! { "a__dot__b": { "__dollar__c": "x.y$" } })
        );
        assert_eq!(KeySanitizer::restore_value(&sanitized), value);
    }

    #[test]
    fn path_keeps_separators() {
        assert_eq!(KeySanitizer::sanitize_path("address.$city"), "address.__dollar__city");
    }
}
