//! Configuration for the write pipeline and the in-memory store.
//!
//! Both structs deserialize with every field optional, so a host can load them
//! from whatever source it uses and fall back to the defaults.

use serde::{Deserialize, Serialize};

/// Policy switches of the write service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Accept ids supplied by the client on create.
    pub allow_client_generated_ids: bool,
    /// Accept add/remove relationship requests with an empty value set (a no-op).
    pub allow_empty_relationship_changes: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            allow_client_generated_ids: true,
            allow_empty_relationship_changes: true,
        }
    }
}

/// Settings of a [`StoreActor`](crate::store::StoreActor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Capacity of the request channel.
    pub buffer_size: usize,
    /// Version rows and reject updates carrying a stale version.
    pub optimistic_concurrency: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            buffer_size: 32,
            optimistic_concurrency: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let options: WriteOptions =
            serde_json::from_str(r#"{ "allow_client_generated_ids": false }"#).unwrap();
        assert!(!options.allow_client_generated_ids);
        assert!(options.allow_empty_relationship_changes);

        let store: StoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(store, StoreConfig::default());
    }
}
