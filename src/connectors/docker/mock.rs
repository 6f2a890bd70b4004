use super::{DockerApi, DockerAuthObj, DockerError, DockerImage};
use crate::helpers::BuildLog;
use async_trait::async_trait;
use std::sync::Mutex;

/// Recording Docker client for tests. Nothing talks to a daemon.
#[derive(Debug, Default)]
pub struct MockDockerApi {
    pub images: Mutex<Vec<DockerImage>>,
    pub retagged: Mutex<Vec<(String, String)>>,
    pub pushed: Mutex<Vec<(String, Option<DockerAuthObj>)>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_push: bool,
    pub reject_auth: bool,
}

impl MockDockerApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_push() -> Self {
        Self {
            fail_push: true,
            ..Self::default()
        }
    }

    pub fn rejecting_auth() -> Self {
        Self {
            reject_auth: true,
            ..Self::default()
        }
    }

    pub fn with_images(images: Vec<DockerImage>) -> Self {
        Self {
            images: Mutex::new(images),
            ..Self::default()
        }
    }

    pub fn pushed_names(&self) -> Vec<String> {
        self.pushed
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl DockerApi for MockDockerApi {
    async fn get_images(&self) -> Result<Vec<DockerImage>, DockerError> {
        Ok(self.images.lock().unwrap().clone())
    }

    async fn delete_images(&self, image_ids: &[String]) -> Result<(), DockerError> {
        let mut images = self.images.lock().unwrap();
        images.retain(|image| !image_ids.contains(&image.id));
        self.deleted.lock().unwrap().extend(image_ids.iter().cloned());
        Ok(())
    }

    async fn retag(&self, old_image_name: &str, new_image_name: &str) -> Result<(), DockerError> {
        self.retagged
            .lock()
            .unwrap()
            .push((old_image_name.to_string(), new_image_name.to_string()));
        Ok(())
    }

    async fn push_image(
        &self,
        image_name: &str,
        auth: Option<&DockerAuthObj>,
        build_log: &BuildLog,
    ) -> Result<(), DockerError> {
        if self.fail_push {
            build_log.log(format!("Push of {} refused", image_name));
            return Err(DockerError::Request("connection reset by peer".to_string()));
        }
        build_log.log(format!("Pushed {}", image_name));
        self.pushed
            .lock()
            .unwrap()
            .push((image_name.to_string(), auth.cloned()));
        Ok(())
    }

    async fn check_registry_auth(&self, auth: &DockerAuthObj) -> Result<(), DockerError> {
        if self.reject_auth {
            return Err(DockerError::Unauthorized(auth.serveraddress.clone()));
        }
        Ok(())
    }
}
