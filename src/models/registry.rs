use serde_derive::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistryType {
    /// Self-hosted registry running next to the control plane.
    LocalReg,
    RemoteReg,
}

impl fmt::Display for RegistryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalReg => write!(f, "LOCAL_REG"),
            Self::RemoteReg => write!(f, "REMOTE_REG"),
        }
    }
}

impl std::str::FromStr for RegistryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOCAL_REG" | "local" => Ok(Self::LocalReg),
            "REMOTE_REG" | "remote" => Ok(Self::RemoteReg),
            other => Err(format!("Unknown registry type: {}", other)),
        }
    }
}

/// Registry credentials as handed to callers, password in clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryInfo {
    pub id: String,
    pub registry_user: String,
    pub registry_password: String,
    pub registry_domain: String,
    #[serde(default)]
    pub registry_image_prefix: String,
    pub registry_type: RegistryType,
}

/// Registry credentials as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryInfoEncrypted {
    pub id: String,
    pub registry_user: String,
    pub registry_password_encrypted: String,
    pub registry_domain: String,
    #[serde(default)]
    pub registry_image_prefix: String,
    pub registry_type: RegistryType,
}

impl RegistryInfo {
    /// `domain/prefix`, or just `domain` when no prefix is configured.
    pub fn repository_root(&self) -> String {
        let domain = self.registry_domain.trim_end_matches('/');
        let prefix = self.registry_image_prefix.trim_matches('/');
        if prefix.is_empty() {
            domain.to_string()
        } else {
            format!("{}/{}", domain, prefix)
        }
    }
}

fn mask_string(s: &str) -> String {
    s.chars().take(2).collect::<String>() + "****"
}

impl fmt::Display for RegistryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}@{} password: {}",
            self.id,
            self.registry_type,
            self.registry_user,
            self.repository_root(),
            mask_string(&self.registry_password)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(prefix: &str) -> RegistryInfo {
        RegistryInfo {
            id: "id".into(),
            registry_user: "user".into(),
            registry_password: "secret-password".into(),
            registry_domain: "registry.example.com".into(),
            registry_image_prefix: prefix.into(),
            registry_type: RegistryType::RemoteReg,
        }
    }

    #[test]
    fn test_repository_root() {
        assert_eq!(registry("team").repository_root(), "registry.example.com/team");
        assert_eq!(registry("").repository_root(), "registry.example.com");
    }

    #[test]
    fn test_display_masks_password() {
        let shown = registry("team").to_string();
        assert!(!shown.contains("secret-password"));
        assert!(shown.contains("se****"));
    }

    #[test]
    fn test_registry_type_wire_format() {
        assert_eq!(serde_json::to_value(RegistryType::LocalReg).unwrap(), "LOCAL_REG");
        assert_eq!("REMOTE_REG".parse::<RegistryType>().unwrap(), RegistryType::RemoteReg);
        assert!("other".parse::<RegistryType>().is_err());
    }
}
