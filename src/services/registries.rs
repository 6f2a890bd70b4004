use crate::db::{self, KvStore, DEFAULT_PUSH_REGISTRY_ID, REGISTRIES};
use crate::errors::{ApiError, Result};
use crate::forms::RegistryForm;
use crate::helpers::Encryptor;
use crate::models::{RegistryInfo, RegistryInfoEncrypted, RegistryType};
use serde_valid::Validate;
use std::sync::Arc;
use uuid::Uuid;

/// Docker registry credentials plus the default push registry pointer.
///
/// The registry list is read and written as a whole; passwords are only
/// ever persisted encrypted.
pub struct RegistriesStore {
    store: Arc<dyn KvStore>,
    encryptor: Arc<Encryptor>,
}

impl RegistriesStore {
    pub fn new(store: Arc<dyn KvStore>, encryptor: Arc<Encryptor>) -> Self {
        Self { store, encryptor }
    }

    async fn read_all(&self) -> Result<Vec<RegistryInfoEncrypted>> {
        Ok(db::fetch::<Vec<RegistryInfoEncrypted>>(self.store.as_ref(), REGISTRIES)
            .await?
            .unwrap_or_default())
    }

    async fn write_all(&self, registries: &[RegistryInfoEncrypted]) -> Result<()> {
        db::save(self.store.as_ref(), REGISTRIES, &registries).await
    }

    fn decrypt(&self, registry: RegistryInfoEncrypted) -> Result<RegistryInfo> {
        Ok(RegistryInfo {
            registry_password: self.encryptor.decrypt(&registry.registry_password_encrypted)?,
            id: registry.id,
            registry_user: registry.registry_user,
            registry_domain: registry.registry_domain,
            registry_image_prefix: registry.registry_image_prefix,
            registry_type: registry.registry_type,
        })
    }

    fn seal(&self, id: String, form: &RegistryForm) -> Result<RegistryInfoEncrypted> {
        Ok(RegistryInfoEncrypted {
            id,
            registry_user: form.registry_user.clone(),
            registry_password_encrypted: self.encryptor.encrypt(&form.registry_password)?,
            registry_domain: form.registry_domain.clone(),
            registry_image_prefix: form.registry_image_prefix.clone(),
            registry_type: form.registry_type,
        })
    }

    fn validate_form(form: &RegistryForm) -> Result<()> {
        form.validate().map_err(|errors| {
            tracing::debug!("Invalid registry form {:?}", errors);
            ApiError::illegal_parameter(format!("Invalid registry parameters: {:?}", errors))
        })
    }

    #[tracing::instrument(name = "Get all registries", skip(self))]
    pub async fn get_all_registries(&self) -> Result<Vec<RegistryInfo>> {
        self.read_all()
            .await?
            .into_iter()
            .map(|registry| self.decrypt(registry))
            .collect()
    }

    pub async fn get_registry(&self, id: &str) -> Result<RegistryInfo> {
        self.get_all_registries()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiError::not_found(format!("Registry not found: {}", id)))
    }

    /// The first registry ever added becomes the default push registry.
    #[tracing::instrument(name = "Add registry", skip(self, form), fields(domain = %form.registry_domain))]
    pub async fn add_registry(&self, form: RegistryForm) -> Result<String> {
        Self::validate_form(&form)?;

        let mut registries = self.read_all().await?;
        let is_first = registries.is_empty();

        let mut id = Uuid::new_v4().to_string();
        while registries.iter().any(|r| r.id == id) {
            id = Uuid::new_v4().to_string();
        }

        registries.push(self.seal(id.clone(), &form)?);
        self.write_all(&registries).await?;
        tracing::info!("Registry {} added", id);

        if is_first {
            tracing::info!("First registry, making {} the default push registry", id);
            self.set_default_push_registry_id(&id).await?;
        }

        Ok(id)
    }

    #[tracing::instrument(name = "Update registry", skip(self, form))]
    pub async fn update_registry(&self, id: &str, form: RegistryForm) -> Result<()> {
        Self::validate_form(&form)?;

        let mut registries = self.read_all().await?;
        let index = registries
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ApiError::not_found(format!("Registry not found: {}", id)))?;

        if registries[index].registry_type == RegistryType::LocalReg {
            return Err(ApiError::illegal_operation(
                "Self-hosted registry cannot be edited",
            ));
        }
        if form.registry_type == RegistryType::LocalReg {
            return Err(ApiError::illegal_operation(
                "A remote registry cannot be turned into a self-hosted one",
            ));
        }

        registries[index] = self.seal(id.to_string(), &form)?;
        self.write_all(&registries).await
    }

    #[tracing::instrument(name = "Delete registry", skip(self))]
    pub async fn delete_registry(&self, id: &str, allow_local_delete: bool) -> Result<()> {
        if self.get_default_push_registry_id().await?.as_deref() == Some(id) {
            return Err(ApiError::illegal_parameter(
                "Cannot remove the default push registry, change the default first",
            ));
        }

        let mut registries = self.read_all().await?;
        let index = registries
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ApiError::not_found(format!("Registry not found: {}", id)))?;

        if registries[index].registry_type == RegistryType::LocalReg && !allow_local_delete {
            return Err(ApiError::illegal_operation(
                "Self-hosted registry can only be removed by disabling it",
            ));
        }

        registries.remove(index);
        self.write_all(&registries).await
    }

    pub async fn get_default_push_registry_id(&self) -> Result<Option<String>> {
        Ok(
            db::fetch::<String>(self.store.as_ref(), DEFAULT_PUSH_REGISTRY_ID)
                .await?
                .filter(|id| !id.is_empty()),
        )
    }

    pub async fn get_default_push_registry(&self) -> Result<Option<RegistryInfo>> {
        let Some(id) = self.get_default_push_registry_id().await? else {
            return Ok(None);
        };
        let registry = self.get_all_registries().await?.into_iter().find(|r| r.id == id);
        if registry.is_none() {
            tracing::warn!("Default push registry {} no longer exists", id);
        }
        Ok(registry)
    }

    /// An empty id disables pushing.
    #[tracing::instrument(name = "Set default push registry", skip(self))]
    pub async fn set_default_push_registry_id(&self, id: &str) -> Result<()> {
        if !id.is_empty() && !self.read_all().await?.iter().any(|r| r.id == id) {
            return Err(ApiError::not_found(format!("Registry not found: {}", id)));
        }
        db::save(self.store.as_ref(), DEFAULT_PUSH_REGISTRY_ID, &id).await
    }
}
