#![allow(dead_code)]

use dockyard::connectors::docker::mock::MockDockerApi;
use dockyard::db::{JsonFileStore, KvStore, MemoryStore};
use dockyard::helpers::{DockerRegistryHelper, Encryptor};
use dockyard::services::{DataStore, ImageCleanup};
use std::path::Path;
use std::sync::Arc;

pub const ENCRYPTION_KEY: &str = "integration-test-key-0123456789abcdef";

pub struct TestApp {
    pub data: DataStore,
    pub docker: Arc<MockDockerApi>,
    pub registry_helper: DockerRegistryHelper,
    pub image_cleanup: ImageCleanup,
}

pub async fn spawn_with(store: Arc<dyn KvStore>, docker: MockDockerApi, max_versions: usize) -> TestApp {
    let encryptor = Encryptor::new(ENCRYPTION_KEY).expect("Failed to build encryptor");
    let data = DataStore::from_store("captain", store, encryptor, max_versions)
        .await
        .expect("Failed to open data store");
    let docker = Arc::new(docker);

    TestApp {
        registry_helper: DockerRegistryHelper::new(data.registries(), docker.clone()),
        image_cleanup: ImageCleanup::new(data.apps(), docker.clone()),
        docker,
        data,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_with(Arc::new(MemoryStore::new()), MockDockerApi::new(), 50).await
}

pub async fn spawn_on_disk(dir: &Path) -> TestApp {
    let store = JsonFileStore::open(dir, "captain")
        .await
        .expect("Failed to open file store");
    spawn_with(Arc::new(store), MockDockerApi::new(), 50).await
}
