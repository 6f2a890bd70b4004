use crate::models::RegistryType;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegistryForm {
    #[validate(min_length = 1)]
    #[validate(max_length = 255)]
    pub registry_user: String,
    #[validate(min_length = 1)]
    pub registry_password: String,
    #[validate(min_length = 1)]
    #[validate(pattern = r"^[^\s:/]+(:[0-9]+)?$")]
    pub registry_domain: String,
    #[serde(default)]
    #[validate(pattern = r"^[^\s:]*$")]
    pub registry_image_prefix: String,
    pub registry_type: RegistryType,
}

impl RegistryForm {
    pub fn new(
        user: &str,
        password: &str,
        domain: &str,
        image_prefix: &str,
        registry_type: RegistryType,
    ) -> Self {
        Self {
            registry_user: user.trim().to_string(),
            registry_password: password.to_string(),
            registry_domain: domain.trim().trim_end_matches('/').to_string(),
            registry_image_prefix: image_prefix.trim().trim_matches('/').to_string(),
            registry_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields() {
        let form = RegistryForm::new("", "pw", "registry.example.com", "", RegistryType::RemoteReg);
        assert!(form.validate().is_err());

        let form = RegistryForm::new("user", "", "registry.example.com", "", RegistryType::RemoteReg);
        assert!(form.validate().is_err());

        let form = RegistryForm::new("user", "pw", "", "", RegistryType::RemoteReg);
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_domain_format() {
        let ok = RegistryForm::new("u", "p", "registry.example.com:5000/", "team/", RegistryType::RemoteReg);
        assert_eq!(ok.registry_domain, "registry.example.com:5000");
        assert_eq!(ok.registry_image_prefix, "team");
        assert!(ok.validate().is_ok());

        let bad = RegistryForm::new("u", "p", "https://registry.example.com", "", RegistryType::RemoteReg);
        assert!(bad.validate().is_err());
    }
}
