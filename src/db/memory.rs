use super::{path, KvStore};
use crate::errors::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// Volatile document, used by tests and dry runs.
#[derive(Debug)]
pub struct MemoryStore {
    document: Mutex<Value>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            document: Mutex::new(Value::Object(Map::new())),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Value {
        self.document.lock().await.clone()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let document = self.document.lock().await;
        Ok(path::get_path(&document, key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut document = self.document.lock().await;
        path::set_path(&mut document, key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut document = self.document.lock().await;
        path::delete_path(&mut document, key);
        Ok(())
    }
}
