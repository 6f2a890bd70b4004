use crate::errors::{ApiError, Result};
use crate::helpers::naming;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTAINER_HTTP_PORT: u32 = 80;
pub const DEFAULT_CAPTAIN_DEFINITION_PATH: &str = "./captain-definition";

lazy_static! {
    static ref ABSOLUTE_PATH: Regex = Regex::new(r"^(/[^/\x00]+)+/?$").expect("valid regex");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDefinition {
    pub host_port: u32,
    pub container_port: u32,
}

/// A volume is either a named docker volume or a bind mount of a host path.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeDefinition {
    pub container_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<String>,
}

impl VolumeDefinition {
    pub fn is_named_volume(&self) -> bool {
        self.volume_name.as_deref().map_or(false, |n| !n.is_empty())
    }

    pub fn is_bind_mount(&self) -> bool {
        self.host_path.as_deref().map_or(false, |p| !p.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDomain {
    pub public_domain: String,
    #[serde(default)]
    pub has_ssl: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppTag {
    pub tag_name: String,
}

/// One numbered deploy attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub version: u64,
    pub time_stamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_image_name: Option<String>,
}

/// Git repository a push webhook builds from.
///
/// `password`/`ssh_key` only ever live in memory; the persisted form
/// carries the `*_encrypted` siblings instead.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoInfo {
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_encrypted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_encrypted: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPushWebhook {
    #[serde(default)]
    pub token_version: String,
    #[serde(default)]
    pub push_webhook_token: String,
    #[serde(default)]
    pub repo_info: RepoInfo,
}

impl AppPushWebhook {
    /// Webhooks missing any of these are dropped on save.
    pub fn is_complete(&self) -> bool {
        !self.token_version.is_empty()
            && !self.push_webhook_token.is_empty()
            && !self.repo_info.repo.is_empty()
            && !self.repo_info.branch.is_empty()
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDeployTokenConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_deploy_token: Option<String>,
}

/// Image produced by a build, recorded against the version it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltImage {
    pub image_name: String,
    #[serde(default)]
    pub git_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppDefinition {
    pub description: String,
    pub instance_count: u32,
    pub has_persistent_data: bool,
    pub is_legacy_app_name: bool,
    pub captain_definition_relative_file_path: String,
    pub networks: Vec<String>,
    pub ports: Vec<PortDefinition>,
    pub volumes: Vec<VolumeDefinition>,
    pub env_vars: Vec<EnvVar>,
    pub custom_domain: Vec<CustomDomain>,
    pub redirect_domain: String,
    pub has_default_sub_domain_ssl: bool,
    pub force_ssl: bool,
    pub websocket_support: bool,
    pub not_expose_as_web_app: bool,
    pub container_http_port: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_nginx_config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_deploy_function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_update_override: Option<String>,
    pub tags: Vec<AppTag>,
    pub versions: Vec<Version>,
    pub deployed_version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_push_webhook: Option<AppPushWebhook>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_deploy_token_config: Option<AppDeployTokenConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl Default for AppDefinition {
    fn default() -> Self {
        Self {
            description: String::new(),
            instance_count: 1,
            has_persistent_data: false,
            is_legacy_app_name: false,
            captain_definition_relative_file_path: DEFAULT_CAPTAIN_DEFINITION_PATH.to_string(),
            networks: vec![],
            ports: vec![],
            volumes: vec![],
            env_vars: vec![],
            custom_domain: vec![],
            redirect_domain: String::new(),
            has_default_sub_domain_ssl: false,
            force_ssl: false,
            websocket_support: false,
            not_expose_as_web_app: false,
            container_http_port: DEFAULT_CONTAINER_HTTP_PORT,
            node_id: None,
            custom_nginx_config: None,
            pre_deploy_function: None,
            service_update_override: None,
            tags: vec![],
            versions: vec![],
            deployed_version: 0,
            app_push_webhook: None,
            app_deploy_token_config: None,
            project_id: None,
        }
    }
}

fn is_valid_port(port: u32) -> bool {
    port > 0 && port < 65535
}

fn is_absolute_path(path: &str) -> bool {
    ABSOLUTE_PATH.is_match(path) && !path.split('/').any(|segment| segment == "..")
}

impl AppDefinition {
    pub fn new(has_persistent_data: bool) -> Self {
        Self {
            has_persistent_data,
            ..Self::default()
        }
    }

    pub fn has_any_ssl(&self) -> bool {
        self.has_default_sub_domain_ssl || self.custom_domain.iter().any(|d| d.has_ssl)
    }

    pub fn find_version(&self, version: u64) -> Option<&Version> {
        self.versions.iter().find(|v| v.version == version)
    }

    pub fn deployed(&self) -> Option<&Version> {
        self.find_version(self.deployed_version)
    }

    pub fn has_custom_domain(&self, domain: &str) -> bool {
        self.custom_domain.iter().any(|d| d.public_domain == domain)
    }

    /// Every invariant of a record, checked before each write.
    pub fn validate(&self) -> Result<()> {
        if self.force_ssl && !self.has_any_ssl() {
            return Err(ApiError::illegal_operation(
                "Cannot force SSL without any SSL-enabled domain",
            ));
        }

        for port in &self.ports {
            if !is_valid_port(port.host_port) || !is_valid_port(port.container_port) {
                return Err(ApiError::generic(format!(
                    "Invalid port mapping {}:{}, ports must be between 1 and 65534",
                    port.host_port, port.container_port
                )));
            }
        }

        if !is_valid_port(self.container_http_port) {
            return Err(ApiError::generic(format!(
                "Invalid container HTTP port {}",
                self.container_http_port
            )));
        }

        for volume in &self.volumes {
            if volume.is_named_volume() && volume.is_bind_mount() {
                return Err(ApiError::generic(format!(
                    "Volume {} cannot be both a named volume and a host path",
                    volume.container_path
                )));
            }
            if !volume.is_named_volume() && !volume.is_bind_mount() {
                return Err(ApiError::generic(format!(
                    "Volume {} needs either a volume name or a host path",
                    volume.container_path
                )));
            }
            if !is_absolute_path(&volume.container_path) {
                return Err(ApiError::generic(format!(
                    "Invalid container path for volume: {:?}",
                    volume.container_path
                )));
            }
            if let Some(host_path) = volume.host_path.as_deref().filter(|p| !p.is_empty()) {
                if !is_absolute_path(host_path) {
                    return Err(ApiError::generic(format!(
                        "Invalid host path for volume: {:?}",
                        host_path
                    )));
                }
            }
            if let Some(name) = volume.volume_name.as_deref().filter(|n| !n.is_empty()) {
                if !naming::is_name_format_ok(name) {
                    return Err(ApiError::generic(format!("Invalid volume name: {:?}", name)));
                }
            }
        }

        if self.env_vars.iter().any(|env| env.key.trim().is_empty()) {
            return Err(ApiError::generic("Environment variable key cannot be empty"));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(self.custom_domain.len());
        for domain in &self.custom_domain {
            if seen.contains(&domain.public_domain.as_str()) {
                return Err(ApiError::illegal_parameter(format!(
                    "Duplicate custom domain: {}",
                    domain.public_domain
                )));
            }
            seen.push(&domain.public_domain);
        }

        if !self.redirect_domain.is_empty() && !self.has_custom_domain(&self.redirect_domain) {
            return Err(ApiError::illegal_parameter(format!(
                "Redirect domain {} is not one of the app's custom domains",
                self.redirect_domain
            )));
        }

        if let Some(tag) = self.tags.iter().find(|t| !naming::is_name_format_ok(&t.tag_name)) {
            return Err(ApiError::illegal_parameter(format!("Invalid tag name: {:?}", tag.tag_name)));
        }

        Ok(())
    }
}
