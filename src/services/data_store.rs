use crate::configuration::Settings;
use crate::db::{self, JsonFileStore, KvStore, SCHEMA_VERSION};
use crate::errors::Result;
use crate::helpers::Encryptor;
use crate::services::{AppsStore, ProjectsStore, RegistriesStore};
use std::sync::Arc;

pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// One namespace of persisted state and the stores built on top of it.
///
/// Constructed once at startup and passed to whoever needs it.
pub struct DataStore {
    namespace: String,
    store: Arc<dyn KvStore>,
    apps: Arc<AppsStore>,
    projects: Arc<ProjectsStore>,
    registries: Arc<RegistriesStore>,
}

impl DataStore {
    #[tracing::instrument(name = "Open data store", skip(settings), fields(namespace = %settings.namespace))]
    pub async fn open(settings: &Settings) -> Result<Self> {
        let store = JsonFileStore::open(&settings.data_directory, &settings.namespace).await?;
        let encryptor = Encryptor::new(&settings.encryption_key)?;
        Self::from_store(
            &settings.namespace,
            Arc::new(store),
            encryptor,
            settings.max_versions_to_keep,
        )
        .await
    }

    pub async fn from_store(
        namespace: &str,
        store: Arc<dyn KvStore>,
        encryptor: Encryptor,
        max_versions_to_keep: usize,
    ) -> Result<Self> {
        let encryptor = Arc::new(encryptor);
        let data_store = Self {
            namespace: namespace.to_string(),
            apps: Arc::new(AppsStore::new(store.clone(), encryptor.clone(), max_versions_to_keep)),
            projects: Arc::new(ProjectsStore::new(store.clone())),
            registries: Arc::new(RegistriesStore::new(store.clone(), encryptor)),
            store,
        };
        data_store.migrate().await?;
        Ok(data_store)
    }

    async fn migrate(&self) -> Result<()> {
        let version: u32 = db::fetch(self.store.as_ref(), SCHEMA_VERSION)
            .await?
            .unwrap_or(0);
        if version >= CURRENT_SCHEMA_VERSION {
            return Ok(());
        }

        let tagged = self.apps.mark_all_as_legacy_named().await?;
        db::save(self.store.as_ref(), SCHEMA_VERSION, &CURRENT_SCHEMA_VERSION).await?;
        tracing::info!(
            "Migrated {} from schema {} to {}, {} apps tagged as legacy",
            self.namespace,
            version,
            CURRENT_SCHEMA_VERSION,
            tagged
        );
        Ok(())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn apps(&self) -> Arc<AppsStore> {
        self.apps.clone()
    }

    pub fn projects(&self) -> Arc<ProjectsStore> {
        self.projects.clone()
    }

    pub fn registries(&self) -> Arc<RegistriesStore> {
        self.registries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, APP_DEFINITIONS};
    use serde_json::json;

    fn encryptor() -> Encryptor {
        Encryptor::new("0123456789abcdef0123456789abcdef").unwrap()
    }

    #[tokio::test]
    async fn test_old_schema_tags_apps_as_legacy() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(
            APP_DEFINITIONS,
            json!({"old-app": {"instanceCount": 1}, "other": {}}),
        )
        .await
        .unwrap();

        let data = DataStore::from_store("captain", kv.clone(), encryptor(), 10).await.unwrap();
        let apps = data.apps().get_app_definitions().await.unwrap();
        assert!(apps.values().all(|app| app.is_legacy_app_name));
        assert_eq!(kv.get(SCHEMA_VERSION).await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_current_schema_is_left_alone() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(SCHEMA_VERSION, json!(2)).await.unwrap();
        kv.set(APP_DEFINITIONS, json!({"fresh": {}})).await.unwrap();

        let data = DataStore::from_store("captain", kv, encryptor(), 10).await.unwrap();
        let app = data.apps().get_app_definition("fresh").await.unwrap();
        assert!(!app.is_legacy_app_name);
    }

    #[tokio::test]
    async fn test_new_apps_after_migration_are_not_legacy() {
        let kv = Arc::new(MemoryStore::new());
        let data = DataStore::from_store("captain", kv, encryptor(), 10).await.unwrap();
        data.apps().register_app_definition("web", false).await.unwrap();
        assert!(!data.apps().get_app_definition("web").await.unwrap().is_legacy_app_name);
        assert_eq!(data.namespace(), "captain");
    }
}
