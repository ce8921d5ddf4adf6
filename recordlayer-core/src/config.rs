//! Store-level configuration.

use serde::{Deserialize, Serialize};

use crate::scope::RemovedFlag;

/// Collection that holds change-log entries unless configured otherwise.
pub const DEFAULT_CHANGE_LOG_COLLECTION: &str = "ChangeLog";

/// Settings shared by every operation created from a [`RecordStore`](crate::store::RecordStore).
///
/// Deserializable so it can be embedded in an application's own configuration file.
///
/// ```ignore
/// let config = RecordStoreConfig::builder()
///     .change_log_collection("audit")
///     .removed_flag(RemovedFlag::canonical_only())
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordStoreConfig {
    /// Name of the collection shared by all record types for change-log entries.
    pub change_log_collection: String,
    /// Soft-delete flag spellings honoured by filtered reads.
    pub removed_flag: RemovedFlag,
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self {
            change_log_collection: DEFAULT_CHANGE_LOG_COLLECTION.to_string(),
            removed_flag: RemovedFlag::default(),
        }
    }
}

impl RecordStoreConfig {
    pub fn builder() -> RecordStoreConfigBuilder {
        RecordStoreConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordStoreConfigBuilder {
    config: RecordStoreConfig,
}

impl RecordStoreConfigBuilder {
    pub fn change_log_collection(mut self, name: impl Into<String>) -> Self {
        self.config.change_log_collection = name.into();
        self
    }

    pub fn removed_flag(mut self, flag: RemovedFlag) -> Self {
        self.config.removed_flag = flag;
        self
    }

    pub fn build(self) -> RecordStoreConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: RecordStoreConfig =
            serde_json::from_str(r#"{ "change_log_collection": "audit" }"#).unwrap();

        assert_eq!(config.change_log_collection, "audit");
        assert_eq!(config.removed_flag, RemovedFlag::default());
    }

    #[test]
    fn legacy_spelling_can_be_switched_off() {
        let config: RecordStoreConfig = serde_json::from_str(
            r#"{ "removed_flag": { "canonical": "is_removed", "legacy": null } }"#,
        )
        .unwrap();

        assert_eq!(config.removed_flag, RemovedFlag::canonical_only());
        assert_eq!(config.change_log_collection, DEFAULT_CHANGE_LOG_COLLECTION);
    }
}
