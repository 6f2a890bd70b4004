use crate::helpers::BuildLog;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Credentials in the shape the Docker Engine expects for `X-Registry-Auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerAuthObj {
    pub serveraddress: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DockerImage {
    pub id: String,
    #[serde(default)]
    pub repo_tags: Vec<String>,
    #[serde(default)]
    pub created: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error("docker request failed: {0}")]
    Request(String),
    #[error("image not found: {0}")]
    NotFound(String),
    #[error("registry authentication failed: {0}")]
    Unauthorized(String),
}

/// The slice of the Docker Engine API the data layer depends on.
#[async_trait]
pub trait DockerApi: Send + Sync {
    async fn get_images(&self) -> Result<Vec<DockerImage>, DockerError>;

    async fn delete_images(&self, image_ids: &[String]) -> Result<(), DockerError>;

    async fn retag(&self, old_image_name: &str, new_image_name: &str) -> Result<(), DockerError>;

    async fn push_image(
        &self,
        image_name: &str,
        auth: Option<&DockerAuthObj>,
        build_log: &BuildLog,
    ) -> Result<(), DockerError>;

    async fn check_registry_auth(&self, auth: &DockerAuthObj) -> Result<(), DockerError>;
}

pub mod mock;
