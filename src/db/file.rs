use super::{path, KvStore};
use crate::errors::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Stores one namespace in `<data_directory>/config-<namespace>.json`.
///
/// The document is kept in memory and rewritten as a whole on every
/// mutation: serialized into a temp file next to the target, fsynced, then
/// renamed over it. A mutation only becomes visible to readers after that
/// commit succeeded.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    document: Mutex<Value>,
}

impl JsonFileStore {
    pub fn file_name(namespace: &str) -> String {
        format!("config-{}.json", namespace)
    }

    #[tracing::instrument(name = "Open file store")]
    pub async fn open(data_directory: &Path, namespace: &str) -> Result<Self> {
        tokio::fs::create_dir_all(data_directory).await?;
        let path = data_directory.join(Self::file_name(namespace));

        let document = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Value::Object(Map::new()),
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No store file at {}, starting empty", path.display());
                Value::Object(Map::new())
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn commit(&self, document: &Value) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, json.as_bytes()))
            .await
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))??;

        tracing::debug!("Committed store file {}", self.path.display());
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    // Owner read/write only, the document carries encrypted secrets
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))?;
    }

    tmp.persist(path)?;

    #[cfg(unix)]
    if let Ok(dir) = std::fs::File::open(dir) {
        dir.sync_all().ok();
    }

    Ok(())
}

#[async_trait]
impl KvStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let document = self.document.lock().await;
        Ok(path::get_path(&document, key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut document = self.document.lock().await;
        let mut next = document.clone();
        path::set_path(&mut next, key, value);
        self.commit(&next).await?;
        *document = next;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut document = self.document.lock().await;
        let mut next = document.clone();
        if !path::delete_path(&mut next, key) {
            return Ok(());
        }
        self.commit(&next).await?;
        *document = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_reopen_sees_committed_state() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonFileStore::open(dir.path(), "captain").await.unwrap();
            store.set("appDefinitions.web", json!({"instanceCount": 2})).await.unwrap();
            store.set("appDefinitions.db", json!({"instanceCount": 1})).await.unwrap();
            store.delete("appDefinitions.db").await.unwrap();
        }

        let store = JsonFileStore::open(dir.path(), "captain").await.unwrap();
        assert_eq!(
            store.get("appDefinitions.web").await.unwrap(),
            Some(json!({"instanceCount": 2}))
        );
        assert_eq!(store.get("appDefinitions.db").await.unwrap(), None);
        assert!(dir.path().join("config-captain.json").exists());
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(&dir.path().join("nested"), "other").await.unwrap();
        assert_eq!(store.get("anything").await.unwrap(), None);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config-bad.json"), "{not json").unwrap();
        assert!(JsonFileStore::open(dir.path(), "bad").await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path(), "captain").await.unwrap();
        store.set("schemaVersion", json!(2)).await.unwrap();

        let perms = std::fs::metadata(store.path()).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }
}
