//! App definitions and their deploy history.
//!
//! Each app lives under `appDefinitions.<name>` and is always rewritten as a
//! whole record. Every write goes through [`AppsStore::save_app`], which
//! re-checks all record invariants and seals repository credentials, since the
//! underlying document has no schema of its own.
//!
//! Mutations of the same app are serialized by a per-name async lock, so two
//! concurrent read-modify-write cycles on one app cannot lose each other's
//! updates. Different apps never contend.

use crate::db::{self, KvStore, APP_DEFINITIONS, PROJECT_DEFINITIONS};
use crate::errors::{ApiError, Result};
use crate::forms::AppUpdateForm;
use crate::helpers::security::generate_token;
use crate::helpers::{naming, Encryptor};
use crate::models::{
    AppDefinition, AppDeployTokenConfig, AppPushWebhook, BuiltImage, CustomDomain, RepoInfo,
    Version,
};
use chrono::Utc;
use serde_valid::Validate;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

const SERVICE_NAME_PREFIX: &str = "srv-captain--";
const IMAGE_NAME_PREFIX: &str = "img-captain-";
const TOKEN_LENGTH: usize = 48;

#[derive(Default)]
struct AppLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AppLocks {
    async fn acquire(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.entry(name.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Forgets the lock of a name nobody holds or waits on.
    fn release(&self, name: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks.get(name).map_or(false, |lock| Arc::strong_count(lock) == 1) {
            locks.remove(name);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or_default()
    }
}

pub struct AppsStore {
    store: Arc<dyn KvStore>,
    encryptor: Arc<Encryptor>,
    max_versions_to_keep: usize,
    locks: AppLocks,
    // Domain ownership spans apps, so claiming one is serialized store-wide
    domain_claims: tokio::sync::Mutex<()>,
}

fn app_key(name: &str) -> String {
    db::child_key(APP_DEFINITIONS, name)
}

fn normalize_domain(domain: &str) -> Result<String> {
    let domain = domain.trim().to_lowercase();
    if domain.is_empty() || domain.contains(|c: char| c.is_whitespace() || c == '/' || c == ':') {
        return Err(ApiError::illegal_parameter(format!("Invalid domain: {:?}", domain)));
    }
    Ok(domain)
}

fn new_push_webhook_identity(hook: &mut AppPushWebhook) {
    hook.token_version = Uuid::new_v4().to_string();
    hook.push_webhook_token = generate_token(TOKEN_LENGTH);
}

impl AppsStore {
    pub fn new(store: Arc<dyn KvStore>, encryptor: Arc<Encryptor>, max_versions_to_keep: usize) -> Self {
        Self {
            store,
            encryptor,
            max_versions_to_keep: max_versions_to_keep.max(1),
            locks: AppLocks::default(),
            domain_claims: tokio::sync::Mutex::new(()),
        }
    }

    pub fn get_service_name(app_name: &str) -> String {
        format!("{}{}", SERVICE_NAME_PREFIX, app_name)
    }

    pub fn get_image_name(app_name: &str) -> String {
        format!("{}{}", IMAGE_NAME_PREFIX, app_name)
    }

    async fn read_all_stored(&self) -> Result<BTreeMap<String, AppDefinition>> {
        Ok(db::fetch(self.store.as_ref(), APP_DEFINITIONS)
            .await?
            .unwrap_or_default())
    }

    async fn read_stored(&self, name: &str) -> Result<Option<AppDefinition>> {
        db::fetch(self.store.as_ref(), &app_key(name)).await
    }

    /// Stored record, credentials still sealed.
    async fn load(&self, name: &str) -> Result<AppDefinition> {
        self.read_stored(name)
            .await?
            .ok_or_else(|| ApiError::generic(format!("App could not be found: {}", name)))
    }

    fn unseal(&self, mut app: AppDefinition) -> Result<AppDefinition> {
        if let Some(repo) = app.app_push_webhook.as_mut().map(|hook| &mut hook.repo_info) {
            if let Some(encrypted) = repo.password_encrypted.as_deref() {
                repo.password = Some(self.encryptor.decrypt(encrypted)?);
            }
            if let Some(encrypted) = repo.ssh_key_encrypted.as_deref() {
                repo.ssh_key = Some(self.encryptor.decrypt(encrypted)?);
            }
        }
        Ok(app)
    }

    /// Persisted representation of `app`: plaintext repository credentials
    /// become their encrypted siblings, incomplete webhooks are dropped and a
    /// disabled deploy token is cleared. The input is left untouched.
    pub fn seal(&self, app: &AppDefinition) -> Result<AppDefinition> {
        let mut sealed = app.clone();

        sealed.app_push_webhook = match app.app_push_webhook.as_ref() {
            Some(hook) if hook.is_complete() => {
                let mut repo = hook.repo_info.clone();
                if let Some(password) = repo.password.take() {
                    repo.password_encrypted = if password.is_empty() {
                        None
                    } else {
                        Some(self.encryptor.encrypt(&password)?)
                    };
                }
                if let Some(ssh_key) = repo.ssh_key.take() {
                    repo.ssh_key_encrypted = if ssh_key.is_empty() {
                        None
                    } else {
                        Some(self.encryptor.encrypt(&ssh_key)?)
                    };
                }
                Some(AppPushWebhook {
                    repo_info: repo,
                    ..hook.clone()
                })
            }
            Some(_) => {
                tracing::debug!("Dropping incomplete push webhook");
                None
            }
            None => None,
        };

        if let Some(config) = sealed.app_deploy_token_config.as_mut() {
            if !config.enabled {
                config.app_deploy_token = None;
            }
        }

        Ok(sealed)
    }

    /// Single write path for app records.
    #[tracing::instrument(name = "Save app definition", skip(self, app))]
    async fn save_app(&self, name: &str, app: &AppDefinition) -> Result<()> {
        app.validate()?;
        let sealed = self.seal(app)?;
        db::save(self.store.as_ref(), &app_key(name), &sealed).await
    }

    pub async fn get_app_definitions(&self) -> Result<BTreeMap<String, AppDefinition>> {
        self.read_all_stored()
            .await?
            .into_iter()
            .map(|(name, app)| Ok((name, self.unseal(app)?)))
            .collect()
    }

    /// Record with repository credentials decrypted.
    pub async fn get_app_definition(&self, name: &str) -> Result<AppDefinition> {
        let app = self.load(name).await?;
        self.unseal(app)
    }

    #[tracing::instrument(name = "Register app definition", skip(self))]
    pub async fn register_app_definition(&self, name: &str, has_persistent_data: bool) -> Result<()> {
        if !naming::is_name_allowed(name) {
            return Err(ApiError::bad_name(format!("App name is not allowed: {:?}", name)));
        }

        let _guard = self.locks.acquire(name).await;
        if self.read_stored(name).await?.is_some() {
            return Err(ApiError::already_exist(format!("App already exists: {}", name)));
        }

        self.save_app(name, &AppDefinition::new(has_persistent_data)).await?;
        tracing::info!("App {} registered", name);
        Ok(())
    }

    #[tracing::instrument(name = "Update app definition", skip(self, form))]
    pub async fn update_app_definition(&self, name: &str, form: AppUpdateForm) -> Result<()> {
        form.validate().map_err(|errors| {
            ApiError::illegal_parameter(format!("Invalid app parameters: {:?}", errors))
        })?;

        let _guard = self.locks.acquire(name).await;
        let mut app = self.load(name).await?;
        form.apply_to(&mut app);

        if let Some(project_id) = app.project_id.as_deref() {
            let key = db::child_key(PROJECT_DEFINITIONS, project_id);
            if self.store.get(&key).await?.is_none() {
                return Err(ApiError::not_found(format!("Project not found: {}", project_id)));
            }
        }

        if let Some(repo_info) = form.repo_info {
            app.app_push_webhook = Self::merge_repo_info(app.app_push_webhook.take(), repo_info);
        }

        if let Some(requested) = form.app_deploy_token_config {
            app.app_deploy_token_config = Some(Self::merge_deploy_token(
                app.app_deploy_token_config.take(),
                requested,
            ));
        }

        self.save_app(name, &app).await
    }

    /// Credentials not re-supplied in `repo_info` are carried over sealed.
    fn merge_repo_info(existing: Option<AppPushWebhook>, repo_info: RepoInfo) -> Option<AppPushWebhook> {
        if repo_info.repo.trim().is_empty() {
            return None;
        }

        let mut hook = existing.unwrap_or_default();
        let previous = std::mem::take(&mut hook.repo_info);

        hook.repo_info = RepoInfo {
            repo: repo_info.repo.trim().to_string(),
            user: repo_info.user.trim().to_string(),
            branch: repo_info.branch.trim().to_string(),
            password_encrypted: match repo_info.password {
                Some(_) => None,
                None => previous.password_encrypted,
            },
            ssh_key_encrypted: match repo_info.ssh_key {
                Some(_) => None,
                None => previous.ssh_key_encrypted,
            },
            password: repo_info.password,
            ssh_key: repo_info.ssh_key,
        };

        if hook.token_version.is_empty() || hook.push_webhook_token.is_empty() {
            new_push_webhook_identity(&mut hook);
        }
        Some(hook)
    }

    fn merge_deploy_token(
        existing: Option<AppDeployTokenConfig>,
        requested: AppDeployTokenConfig,
    ) -> AppDeployTokenConfig {
        if !requested.enabled {
            return AppDeployTokenConfig {
                enabled: false,
                app_deploy_token: None,
            };
        }

        let token = requested
            .app_deploy_token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| existing.and_then(|c| c.app_deploy_token))
            .unwrap_or_else(|| generate_token(TOKEN_LENGTH));

        AppDeployTokenConfig {
            enabled: true,
            app_deploy_token: Some(token),
        }
    }

    /// Next version is one above the highest ever kept, the history is then
    /// trimmed oldest-first so that it stays within the cap once appended.
    #[tracing::instrument(name = "Create new version", skip(self))]
    pub async fn create_new_version(&self, name: &str) -> Result<u64> {
        let _guard = self.locks.acquire(name).await;
        let mut app = self.load(name).await?;

        let next = app
            .versions
            .iter()
            .map(|v| v.version)
            .max()
            .map(|max| max + 1)
            .unwrap_or(app.versions.len() as u64);

        let keep = self.max_versions_to_keep - 1;
        if app.versions.len() > keep {
            let excess = app.versions.len() - keep;
            app.versions.drain(..excess);
        }

        app.versions.push(Version {
            version: next,
            time_stamp: Utc::now(),
            git_hash: None,
            deployed_image_name: None,
        });

        self.save_app(name, &app).await?;
        tracing::info!("App {} got version {}", name, next);
        Ok(next)
    }

    #[tracing::instrument(name = "Set git hash", skip(self))]
    pub async fn set_git_hash(&self, name: &str, version: u64, git_hash: &str) -> Result<()> {
        let _guard = self.locks.acquire(name).await;
        let mut app = self.load(name).await?;

        let entry = app
            .versions
            .iter_mut()
            .find(|v| v.version == version)
            .ok_or_else(|| ApiError::generic(format!("Version {} not found for {}", version, name)))?;
        entry.git_hash = Some(git_hash.to_string()).filter(|h| !h.is_empty());

        self.save_app(name, &app).await
    }

    /// Fails when the version was trimmed away while the image was building.
    #[tracing::instrument(name = "Set deployed version and image", skip(self))]
    pub async fn set_deployed_version_and_image(
        &self,
        name: &str,
        version: u64,
        built_image: &BuiltImage,
    ) -> Result<()> {
        let _guard = self.locks.acquire(name).await;
        let mut app = self.load(name).await?;

        let entry = app
            .versions
            .iter_mut()
            .find(|v| v.version == version)
            .ok_or_else(|| {
                ApiError::generic(format!(
                    "Version {} of {} does not exist, it may have been trimmed from the history",
                    version, name
                ))
            })?;

        entry.deployed_image_name = Some(built_image.image_name.clone());
        if let Some(git_hash) = built_image.git_hash.as_deref().filter(|h| !h.is_empty()) {
            entry.git_hash = Some(git_hash.to_string());
        }
        app.deployed_version = version;

        self.save_app(name, &app).await?;
        tracing::info!("App {} now runs version {} ({})", name, version, built_image.image_name);
        Ok(())
    }

    #[tracing::instrument(name = "Add custom domain", skip(self))]
    pub async fn add_custom_domain_for_app(&self, name: &str, domain: &str) -> Result<()> {
        let domain = normalize_domain(domain)?;

        let _guard = self.locks.acquire(name).await;
        let _claim = self.domain_claims.lock().await;
        let mut app = self.load(name).await?;
        if app.has_custom_domain(&domain) {
            return Err(ApiError::illegal_parameter(format!(
                "Domain {} is already attached to {}",
                domain, name
            )));
        }

        if let Some((owner, _)) = self
            .read_all_stored()
            .await?
            .iter()
            .find(|(other, def)| other.as_str() != name && def.has_custom_domain(&domain))
        {
            return Err(ApiError::already_exist(format!(
                "Domain {} is already used by {}",
                domain, owner
            )));
        }

        app.custom_domain.push(CustomDomain {
            public_domain: domain,
            has_ssl: false,
        });
        self.save_app(name, &app).await
    }

    #[tracing::instrument(name = "Enable custom domain SSL", skip(self))]
    pub async fn enable_custom_domain_ssl(&self, name: &str, domain: &str) -> Result<()> {
        let domain = normalize_domain(domain)?;

        let _guard = self.locks.acquire(name).await;
        let mut app = self.load(name).await?;
        let entry = app
            .custom_domain
            .iter_mut()
            .find(|d| d.public_domain == domain)
            .ok_or_else(|| {
                ApiError::illegal_parameter(format!("Domain {} is not attached to {}", domain, name))
            })?;
        entry.has_ssl = true;

        self.save_app(name, &app).await
    }

    /// Also clears the redirect domain, and force-SSL once no SSL domain remains.
    #[tracing::instrument(name = "Remove custom domain", skip(self))]
    pub async fn remove_custom_domain_for_app(&self, name: &str, domain: &str) -> Result<()> {
        let domain = normalize_domain(domain)?;

        let _guard = self.locks.acquire(name).await;
        let mut app = self.load(name).await?;
        let index = app
            .custom_domain
            .iter()
            .position(|d| d.public_domain == domain)
            .ok_or_else(|| {
                ApiError::illegal_parameter(format!("Domain {} is not attached to {}", domain, name))
            })?;
        app.custom_domain.remove(index);

        if app.redirect_domain == domain {
            app.redirect_domain.clear();
        }
        if app.force_ssl && !app.has_any_ssl() {
            tracing::info!("No SSL domain left on {}, disabling force SSL", name);
            app.force_ssl = false;
        }

        self.save_app(name, &app).await
    }

    pub async fn verify_custom_domain_belongs_to_app(&self, name: &str, domain: &str) -> Result<()> {
        let domain = normalize_domain(domain)?;
        let app = self.load(name).await?;
        if !app.has_custom_domain(&domain) {
            return Err(ApiError::illegal_parameter(format!(
                "Domain {} is not attached to {}",
                domain, name
            )));
        }
        Ok(())
    }

    #[tracing::instrument(name = "Set default sub-domain SSL", skip(self))]
    pub async fn set_ssl_for_default_sub_domain(&self, name: &str, enabled: bool) -> Result<()> {
        let _guard = self.locks.acquire(name).await;
        let mut app = self.load(name).await?;
        app.has_default_sub_domain_ssl = enabled;
        if app.force_ssl && !app.has_any_ssl() {
            app.force_ssl = false;
        }
        self.save_app(name, &app).await
    }

    /// Moves the record to a new key. Certificates and webhook tokens are
    /// bound to the old name, so default sub-domain SSL is turned off and the
    /// webhook gets a fresh token.
    #[tracing::instrument(name = "Rename app", skip(self))]
    pub async fn rename_app(&self, old_name: &str, new_name: &str) -> Result<()> {
        if !naming::is_name_allowed(new_name) {
            return Err(ApiError::bad_name(format!("App name is not allowed: {:?}", new_name)));
        }
        if old_name == new_name {
            return Err(ApiError::already_exist(format!("App already exists: {}", new_name)));
        }

        let (first, second) = if old_name < new_name {
            (old_name, new_name)
        } else {
            (new_name, old_name)
        };
        let first_guard = self.locks.acquire(first).await;
        let second_guard = self.locks.acquire(second).await;

        let mut app = self.load(old_name).await?;
        if self.read_stored(new_name).await?.is_some() {
            return Err(ApiError::already_exist(format!("App already exists: {}", new_name)));
        }

        app.has_default_sub_domain_ssl = false;
        if app.force_ssl && !app.has_any_ssl() {
            app.force_ssl = false;
        }
        if let Some(hook) = app.app_push_webhook.as_mut() {
            new_push_webhook_identity(hook);
        }

        self.save_app(new_name, &app).await?;
        self.store.delete(&app_key(old_name)).await?;
        drop(first_guard);
        drop(second_guard);
        self.locks.release(old_name);
        tracing::info!("App {} renamed to {}", old_name, new_name);
        Ok(())
    }

    /// Resolves once the deletion is durably committed.
    #[tracing::instrument(name = "Delete app definition", skip(self))]
    pub async fn delete_app_definition(&self, name: &str) -> Result<()> {
        if !naming::is_name_format_ok(name) {
            return Err(ApiError::bad_name(format!("App name is not valid: {:?}", name)));
        }

        let guard = self.locks.acquire(name).await;
        self.load(name).await?;
        self.store.delete(&app_key(name)).await?;
        drop(guard);
        self.locks.release(name);
        tracing::info!("App {} deleted", name);
        Ok(())
    }

    /// Best effort, one independent save per app. Already-disabled apps are
    /// skipped, so a retry after a partial failure picks up where it stopped.
    #[tracing::instrument(name = "Disable sub-domain SSL on all apps", skip(self))]
    pub async fn ensure_all_apps_sub_domain_ssl_disabled(&self) -> Result<()> {
        let names: Vec<String> = self.read_all_stored().await?.into_keys().collect();

        for name in names {
            let _guard = self.locks.acquire(&name).await;
            let Some(mut app) = self.read_stored(&name).await? else {
                continue;
            };
            if !app.has_default_sub_domain_ssl && !app.force_ssl {
                continue;
            }
            app.has_default_sub_domain_ssl = false;
            app.force_ssl = false;
            self.save_app(&name, &app).await?;
        }
        Ok(())
    }

    /// Schema v2 migration: tags every existing app as legacy-named.
    pub async fn mark_all_as_legacy_named(&self) -> Result<usize> {
        let names: Vec<String> = self.read_all_stored().await?.into_keys().collect();
        let count = names.len();

        for name in names {
            let _guard = self.locks.acquire(&name).await;
            if let Some(mut app) = self.read_stored(&name).await? {
                app.is_legacy_app_name = true;
                db::save(self.store.as_ref(), &app_key(&name), &app).await?;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn apps(max_versions: usize) -> (AppsStore, Arc<MemoryStore>) {
        let kv = Arc::new(MemoryStore::new());
        let encryptor = Arc::new(Encryptor::new("0123456789abcdef0123456789abcdef").unwrap());
        (AppsStore::new(kv.clone(), encryptor, max_versions), kv)
    }

    fn webhook_form(password: Option<&str>) -> AppUpdateForm {
        AppUpdateForm {
            repo_info: Some(RepoInfo {
                repo: "github.com/acme/web".into(),
                user: "deployer".into(),
                branch: "main".into(),
                password: password.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_rules() {
        let (store, _) = apps(10);
        store.register_app_definition("web", false).await.unwrap();

        let err = store.register_app_definition("web", true).await.unwrap_err();
        assert!(matches!(err, ApiError::AlreadyExist(_)));

        let err = store.register_app_definition("Web", true).await.unwrap_err();
        assert!(matches!(err, ApiError::BadName(_)));

        let err = store.register_app_definition("captain", true).await.unwrap_err();
        assert!(matches!(err, ApiError::BadName(_)));

        let app = store.get_app_definition("web").await.unwrap();
        assert_eq!(app.instance_count, 1);
        assert_eq!(app.deployed_version, 0);
        assert!(app.versions.is_empty());
    }

    #[tokio::test]
    async fn test_versions_are_monotonic_across_trimming() {
        let (store, _) = apps(3);
        store.register_app_definition("web", false).await.unwrap();

        let mut issued = vec![];
        for _ in 0..7 {
            issued.push(store.create_new_version("web").await.unwrap());
        }
        assert_eq!(issued, vec![0, 1, 2, 3, 4, 5, 6]);

        let app = store.get_app_definition("web").await.unwrap();
        let kept: Vec<u64> = app.versions.iter().map(|v| v.version).collect();
        assert_eq!(kept, vec![4, 5, 6]);
    }

    #[tokio::test]
    async fn test_cap_of_one_still_increases() {
        let (store, _) = apps(1);
        store.register_app_definition("web", false).await.unwrap();
        assert_eq!(store.create_new_version("web").await.unwrap(), 0);
        assert_eq!(store.create_new_version("web").await.unwrap(), 1);
        assert_eq!(store.create_new_version("web").await.unwrap(), 2);
        assert_eq!(store.get_app_definition("web").await.unwrap().versions.len(), 1);
    }

    #[tokio::test]
    async fn test_trimmed_version_cannot_be_deployed() {
        let (store, _) = apps(2);
        store.register_app_definition("web", false).await.unwrap();
        let slow_build = store.create_new_version("web").await.unwrap();
        store.create_new_version("web").await.unwrap();
        store.create_new_version("web").await.unwrap();

        let image = BuiltImage {
            image_name: "img-captain-web:0".into(),
            git_hash: None,
        };
        let err = store
            .set_deployed_version_and_image("web", slow_build, &image)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Generic(_)));
    }

    #[tokio::test]
    async fn test_webhook_credentials_sealed() {
        let (store, kv) = apps(10);
        store.register_app_definition("web", false).await.unwrap();
        store
            .update_app_definition("web", webhook_form(Some("repo-password")))
            .await
            .unwrap();

        let raw = kv.snapshot().await.to_string();
        assert!(!raw.contains("repo-password"));
        assert!(raw.contains("passwordEncrypted"));

        let app = store.get_app_definition("web").await.unwrap();
        let hook = app.app_push_webhook.unwrap();
        assert_eq!(hook.repo_info.password.as_deref(), Some("repo-password"));
        assert!(!hook.push_webhook_token.is_empty());
        assert!(!hook.token_version.is_empty());
    }

    #[tokio::test]
    async fn test_credentials_survive_unrelated_updates() {
        let (store, _) = apps(10);
        store.register_app_definition("web", false).await.unwrap();
        store
            .update_app_definition("web", webhook_form(Some("repo-password")))
            .await
            .unwrap();
        let token = store
            .get_app_definition("web")
            .await
            .unwrap()
            .app_push_webhook
            .unwrap()
            .push_webhook_token;

        store
            .update_app_definition(
                "web",
                AppUpdateForm {
                    instance_count: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store.update_app_definition("web", webhook_form(None)).await.unwrap();

        let app = store.get_app_definition("web").await.unwrap();
        let hook = app.app_push_webhook.unwrap();
        assert_eq!(hook.repo_info.password.as_deref(), Some("repo-password"));
        assert_eq!(hook.push_webhook_token, token);
        assert_eq!(app.instance_count, 2);
    }

    #[test]
    fn test_seal_is_pure_and_drops_incomplete_webhook() {
        let (store, _) = apps(10);
        let mut app = AppDefinition::new(false);
        app.app_push_webhook = Some(AppPushWebhook {
            token_version: "v1".into(),
            push_webhook_token: String::new(),
            repo_info: RepoInfo {
                repo: "github.com/acme/web".into(),
                branch: "main".into(),
                password: Some("pw".into()),
                ..Default::default()
            },
        });

        let sealed = store.seal(&app).unwrap();
        assert!(sealed.app_push_webhook.is_none());
        assert_eq!(
            app.app_push_webhook.as_ref().and_then(|h| h.repo_info.password.as_deref()),
            Some("pw")
        );
    }

    #[tokio::test]
    async fn test_deploy_token_lifecycle() {
        let (store, _) = apps(10);
        store.register_app_definition("web", false).await.unwrap();

        let enable = AppUpdateForm {
            app_deploy_token_config: Some(AppDeployTokenConfig {
                enabled: true,
                app_deploy_token: None,
            }),
            ..Default::default()
        };
        store.update_app_definition("web", enable.clone()).await.unwrap();
        let first = store
            .get_app_definition("web")
            .await
            .unwrap()
            .app_deploy_token_config
            .and_then(|c| c.app_deploy_token)
            .unwrap();

        store.update_app_definition("web", enable).await.unwrap();
        let second = store
            .get_app_definition("web")
            .await
            .unwrap()
            .app_deploy_token_config
            .and_then(|c| c.app_deploy_token)
            .unwrap();
        assert_eq!(first, second);

        store
            .update_app_definition(
                "web",
                AppUpdateForm {
                    app_deploy_token_config: Some(AppDeployTokenConfig {
                        enabled: false,
                        app_deploy_token: Some(first),
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let config = store
            .get_app_definition("web")
            .await
            .unwrap()
            .app_deploy_token_config
            .unwrap();
        assert!(!config.enabled);
        assert!(config.app_deploy_token.is_none());
    }

    #[tokio::test]
    async fn test_unknown_project_rejected() {
        let (store, _) = apps(10);
        store.register_app_definition("web", false).await.unwrap();
        let err = store
            .update_app_definition(
                "web",
                AppUpdateForm {
                    project_id: Some(Uuid::new_v4().to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_versions_are_not_lost() {
        let (store, _) = apps(100);
        let store = Arc::new(store);
        store.register_app_definition("web", false).await.unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create_new_version("web").await.unwrap() })
            })
            .collect();

        let mut issued = vec![];
        for handle in handles {
            issued.push(handle.await.unwrap());
        }
        issued.sort();
        assert_eq!(issued, (0..10).collect::<Vec<u64>>());
        assert_eq!(store.get_app_definition("web").await.unwrap().versions.len(), 10);
    }

    #[tokio::test]
    async fn test_locks_of_removed_names_are_dropped() {
        let (store, _) = apps(10);
        store.register_app_definition("web", false).await.unwrap();
        store.register_app_definition("api", false).await.unwrap();
        assert_eq!(store.locks.tracked(), 2);

        store.rename_app("web", "shop").await.unwrap();
        assert_eq!(store.locks.tracked(), 2);

        store.delete_app_definition("shop").await.unwrap();
        assert_eq!(store.locks.tracked(), 1);

        store.register_app_definition("web", false).await.unwrap();
        store.create_new_version("web").await.unwrap();
        assert_eq!(store.locks.tracked(), 2);
    }

    #[tokio::test]
    async fn test_same_domain_claimed_concurrently_by_two_apps() {
        let (store, _) = apps(10);
        store.register_app_definition("web", false).await.unwrap();
        store.register_app_definition("api", false).await.unwrap();

        let (first, second) = tokio::join!(
            store.add_custom_domain_for_app("web", "shop.example.com"),
            store.add_custom_domain_for_app("api", "shop.example.com"),
        );
        assert!(first.is_ok() ^ second.is_ok());

        let owners = store
            .get_app_definitions()
            .await
            .unwrap()
            .values()
            .filter(|app| app.has_custom_domain("shop.example.com"))
            .count();
        assert_eq!(owners, 1);
    }

    #[test]
    fn test_derived_names() {
        assert_eq!(AppsStore::get_service_name("web"), "srv-captain--web");
        assert_eq!(AppsStore::get_image_name("web"), "img-captain-web");
    }
}
