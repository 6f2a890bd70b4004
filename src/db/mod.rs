//! Flat, namespaced key-value document behind every store.
//!
//! Each namespace is one JSON document addressed with dotted keys
//! (`appDefinitions.<name>`, `projectDefinitions.<id>`, `registries`).
//! Writes always replace the whole value under a key; there are no partial
//! field updates and no multi-key transactions. A write or delete resolves
//! only once the document is durably committed.

use crate::errors::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

mod file;
mod memory;
pub mod path;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

pub const APP_DEFINITIONS: &str = "appDefinitions";
pub const PROJECT_DEFINITIONS: &str = "projectDefinitions";
pub const REGISTRIES: &str = "registries";
pub const DEFAULT_PUSH_REGISTRY_ID: &str = "defaultPushRegistryId";
pub const SCHEMA_VERSION: &str = "schemaVersion";

/// Pluggable storage back-end. Production writes to disk; tests use
/// an in-memory implementation.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

pub async fn fetch<T>(store: &dyn KvStore, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(Value::Null) | None => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

pub async fn save<T>(store: &dyn KvStore, key: &str, value: &T) -> Result<()>
where
    T: Serialize,
{
    let value = serde_json::to_value(value)?;
    store.set(key, value).await
}

pub fn child_key(parent: &str, name: &str) -> String {
    format!("{}.{}", parent, name)
}
