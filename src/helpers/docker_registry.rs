use crate::connectors::docker::{DockerApi, DockerAuthObj};
use crate::errors::{ApiError, Result};
use crate::forms::RegistryForm;
use crate::helpers::BuildLog;
use crate::models::{RegistryInfo, RegistryType};
use crate::services::RegistriesStore;
use std::sync::Arc;

fn auth_for(registry: &RegistryInfo) -> DockerAuthObj {
    DockerAuthObj {
        serveraddress: registry.registry_domain.clone(),
        username: registry.registry_user.clone(),
        password: registry.registry_password.clone(),
    }
}

/// Moves freshly built images into the default push registry and manages
/// registry credentials, checking them against the registry first.
pub struct DockerRegistryHelper {
    registries: Arc<RegistriesStore>,
    docker: Arc<dyn DockerApi>,
}

impl DockerRegistryHelper {
    pub fn new(registries: Arc<RegistriesStore>, docker: Arc<dyn DockerApi>) -> Self {
        Self { registries, docker }
    }

    /// Returns the image reference a deploy should use: the plain local
    /// `name:version` when no default push registry is set, otherwise the
    /// pushed `domain/prefix/name:version`.
    #[tracing::instrument(name = "Retag and push", skip(self, build_log))]
    pub async fn retag_and_push_if_default_push_exist(
        &self,
        image_name: &str,
        version: u64,
        build_log: &BuildLog,
    ) -> Result<String> {
        if image_name.contains('/') || image_name.contains(':') {
            return Err(ApiError::illegal_parameter(format!(
                "Image name must not contain a registry or a tag: {}",
                image_name
            )));
        }

        let local_image = format!("{}:{}", image_name, version);

        let Some(registry) = self.registries.get_default_push_registry().await? else {
            build_log.log("No default push registry, skipping the push");
            return Ok(local_image);
        };

        let remote_image = format!("{}/{}", registry.repository_root(), local_image);
        build_log.log(format!("Retagging {} as {}", local_image, remote_image));
        self.docker
            .retag(&local_image, &remote_image)
            .await
            .map_err(|err| ApiError::generic(format!("Retagging {} failed: {}", local_image, err)))?;

        build_log.log(format!("Pushing {}", remote_image));
        let auth = auth_for(&registry);
        if let Err(err) = self.docker.push_image(&remote_image, Some(&auth), build_log).await {
            build_log.log(format!("Push failed: {}", err));
            tracing::error!("Pushing {} failed: {}", remote_image, err);
            return Err(ApiError::generic(format!("Push failed: {}", err)));
        }

        build_log.log(format!("Pushed {}", remote_image));
        Ok(remote_image)
    }

    /// Credentials for the registry an image reference points at. The most
    /// specific `domain/prefix` wins over a bare domain match.
    pub async fn get_docker_auth_object_for_image_name(
        &self,
        image_name: &str,
    ) -> Result<Option<DockerAuthObj>> {
        let registries = self.registries.get_all_registries().await?;

        let best = registries
            .iter()
            .filter(|registry| {
                let root = registry.repository_root();
                image_name.starts_with(&format!("{}/", root))
            })
            .max_by_key(|registry| registry.repository_root().len());

        if best.is_none() {
            tracing::debug!("No registry credentials match {}", image_name);
        }
        Ok(best.map(auth_for))
    }

    pub async fn get_all_docker_auth_objects(&self) -> Result<Vec<DockerAuthObj>> {
        Ok(self
            .registries
            .get_all_registries()
            .await?
            .iter()
            .map(auth_for)
            .collect())
    }

    async fn verify(&self, form: &RegistryForm) -> Result<()> {
        if form.registry_type == RegistryType::LocalReg {
            return Ok(());
        }

        let auth = DockerAuthObj {
            serveraddress: form.registry_domain.clone(),
            username: form.registry_user.clone(),
            password: form.registry_password.clone(),
        };
        self.docker.check_registry_auth(&auth).await.map_err(|err| {
            tracing::info!("Registry {} rejected the credentials: {}", form.registry_domain, err);
            ApiError::authentication_failed(format!(
                "Authentication failed for {}: {}",
                form.registry_domain, err
            ))
        })
    }

    #[tracing::instrument(name = "Add registry with login check", skip(self, form))]
    pub async fn add_registry(&self, form: RegistryForm) -> Result<String> {
        self.verify(&form).await?;
        self.registries.add_registry(form).await
    }

    #[tracing::instrument(name = "Update registry with login check", skip(self, form))]
    pub async fn update_registry(&self, id: &str, form: RegistryForm) -> Result<()> {
        self.verify(&form).await?;
        self.registries.update_registry(id, form).await
    }

    pub async fn delete_registry(&self, id: &str, allow_local_delete: bool) -> Result<()> {
        self.registries.delete_registry(id, allow_local_delete).await
    }

    pub async fn set_default_push_registry(&self, id: &str) -> Result<()> {
        self.registries.set_default_push_registry_id(id).await
    }
}
