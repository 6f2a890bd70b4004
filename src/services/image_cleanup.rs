use crate::connectors::docker::DockerApi;
use crate::errors::{ApiError, Result};
use crate::services::AppsStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusedImage {
    pub id: String,
    pub tags: Vec<String>,
}

/// `registry:5000/img-captain-web:3` -> `registry:5000/img-captain-web`
fn repository_of(tag: &str) -> &str {
    match tag.rsplit_once(':') {
        Some((repository, suffix)) if !suffix.contains('/') => repository,
        _ => tag,
    }
}

/// Finds local images built for apps that no recent version refers to.
pub struct ImageCleanup {
    apps: Arc<AppsStore>,
    docker: Arc<dyn DockerApi>,
}

impl ImageCleanup {
    pub fn new(apps: Arc<AppsStore>, docker: Arc<dyn DockerApi>) -> Self {
        Self { apps, docker }
    }

    #[tracing::instrument(name = "Get unused images", skip(self))]
    pub async fn get_unused_images(&self, most_recent_limit: i64) -> Result<Vec<UnusedImage>> {
        let limit = usize::try_from(most_recent_limit).map_err(|_| {
            ApiError::illegal_parameter(format!("Invalid version limit: {}", most_recent_limit))
        })?;

        let apps = self.apps.get_app_definitions().await?;

        let mut kept: HashSet<String> = HashSet::new();
        for app in apps.values() {
            if let Some(image) = app.deployed().and_then(|v| v.deployed_image_name.clone()) {
                kept.insert(image);
            }

            let mut versions: Vec<_> = app.versions.iter().collect();
            versions.sort_by(|a, b| b.version.cmp(&a.version));
            kept.extend(
                versions
                    .into_iter()
                    .take(limit)
                    .filter_map(|v| v.deployed_image_name.clone()),
            );
        }

        let app_repositories: Vec<String> = apps.keys().map(|name| AppsStore::get_image_name(name)).collect();
        let belongs_to_app = |tag: &str| {
            let repository = repository_of(tag);
            app_repositories.iter().any(|app_repository| {
                repository == app_repository
                    || repository.ends_with(&format!("/{}", app_repository))
            })
        };

        let unused: Vec<UnusedImage> = self
            .docker
            .get_images()
            .await?
            .into_iter()
            .filter(|image| image.repo_tags.iter().any(|tag| belongs_to_app(tag)))
            .filter(|image| !image.repo_tags.iter().any(|tag| kept.contains(tag)))
            .map(|image| UnusedImage {
                id: image.id,
                tags: image.repo_tags,
            })
            .collect();

        tracing::info!("{} unused app images", unused.len());
        Ok(unused)
    }

    #[tracing::instrument(name = "Delete images", skip(self))]
    pub async fn delete_images(&self, image_ids: &[String]) -> Result<()> {
        self.docker.delete_images(image_ids).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::docker::mock::MockDockerApi;
    use crate::connectors::docker::DockerImage;
    use crate::db::MemoryStore;
    use crate::helpers::Encryptor;
    use crate::models::BuiltImage;

    fn image(id: &str, tags: &[&str]) -> DockerImage {
        DockerImage {
            id: id.to_string(),
            repo_tags: tags.iter().map(|t| t.to_string()).collect(),
            created: 0,
        }
    }

    async fn deploy(apps: &AppsStore, name: &str, image_name: &str) -> u64 {
        let version = apps.create_new_version(name).await.unwrap();
        apps.set_deployed_version_and_image(
            name,
            version,
            &BuiltImage {
                image_name: image_name.to_string(),
                git_hash: None,
            },
        )
        .await
        .unwrap();
        version
    }

    async fn setup(images: Vec<DockerImage>) -> (ImageCleanup, Arc<AppsStore>, Arc<MockDockerApi>) {
        let kv = Arc::new(MemoryStore::new());
        let encryptor = Arc::new(Encryptor::new("0123456789abcdef0123456789abcdef").unwrap());
        let apps = Arc::new(AppsStore::new(kv, encryptor, 50));
        let docker = Arc::new(MockDockerApi::with_images(images));
        (ImageCleanup::new(apps.clone(), docker.clone()), apps, docker)
    }

    #[test]
    fn test_repository_of_tag() {
        assert_eq!(repository_of("img-captain-web:3"), "img-captain-web");
        assert_eq!(repository_of("reg:5000/img-captain-web:3"), "reg:5000/img-captain-web");
        assert_eq!(repository_of("reg:5000/img-captain-web"), "reg:5000/img-captain-web");
    }

    #[tokio::test]
    async fn test_keeps_recent_and_deployed_images() {
        let (cleanup, apps, _) = setup(vec![
            image("sha-0", &["img-captain-web:0"]),
            image("sha-1", &["img-captain-web:1"]),
            image("sha-2", &["reg.example.com/img-captain-web:2"]),
            image("sha-nginx", &["nginx:latest"]),
            image("sha-other", &["img-captain-api:0"]),
        ])
        .await;
        apps.register_app_definition("web", false).await.unwrap();
        deploy(&apps, "web", "img-captain-web:0").await;
        deploy(&apps, "web", "img-captain-web:1").await;
        deploy(&apps, "web", "reg.example.com/img-captain-web:2").await;

        let unused = cleanup.get_unused_images(1).await.unwrap();
        let ids: Vec<&str> = unused.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["sha-0", "sha-1"]);

        let unused = cleanup.get_unused_images(0).await.unwrap();
        assert_eq!(unused.len(), 2);

        let unused = cleanup.get_unused_images(10).await.unwrap();
        assert!(unused.is_empty());
    }

    #[tokio::test]
    async fn test_negative_limit_rejected() {
        let (cleanup, _, _) = setup(vec![]).await;
        let err = cleanup.get_unused_images(-1).await.unwrap_err();
        assert!(matches!(err, ApiError::IllegalParameter(_)));
    }

    #[tokio::test]
    async fn test_delete_delegates_to_docker() {
        let (cleanup, _, docker) = setup(vec![image("sha-0", &["img-captain-web:0"])]).await;
        cleanup.delete_images(&["sha-0".to_string()]).await.unwrap();
        assert_eq!(docker.deleted.lock().unwrap().clone(), vec!["sha-0".to_string()]);
        assert!(docker.images.lock().unwrap().is_empty());
    }
}
