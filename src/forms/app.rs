use crate::models::{
    AppDefinition, AppDeployTokenConfig, AppTag, EnvVar, PortDefinition, RepoInfo,
    VolumeDefinition,
};
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

/// Partial update of an app definition. `None` keeps the stored value;
/// for `project_id` an empty string detaches the app from its project.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct AppUpdateForm {
    #[validate(max_length = 5000)]
    pub description: Option<String>,
    #[validate(maximum = 1000)]
    pub instance_count: Option<u32>,
    #[validate(max_length = 1000)]
    pub captain_definition_relative_file_path: Option<String>,
    pub not_expose_as_web_app: Option<bool>,
    pub force_ssl: Option<bool>,
    pub websocket_support: Option<bool>,
    pub container_http_port: Option<u32>,
    pub networks: Option<Vec<String>>,
    pub ports: Option<Vec<PortDefinition>>,
    pub volumes: Option<Vec<VolumeDefinition>>,
    pub env_vars: Option<Vec<EnvVar>>,
    pub node_id: Option<String>,
    pub custom_nginx_config: Option<String>,
    pub pre_deploy_function: Option<String>,
    pub service_update_override: Option<String>,
    pub redirect_domain: Option<String>,
    pub tags: Option<Vec<AppTag>>,
    pub repo_info: Option<RepoInfo>,
    pub app_deploy_token_config: Option<AppDeployTokenConfig>,
    #[validate(max_length = 64)]
    pub project_id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppUpdateForm {
    /// Copies the provided fields onto `app`. Webhook and deploy-token
    /// handling needs the store and is done by the caller.
    pub fn apply_to(&self, app: &mut AppDefinition) {
        let form = self.clone();

        if let Some(description) = form.description {
            app.description = description;
        }
        if let Some(count) = form.instance_count {
            app.instance_count = count;
        }
        if let Some(path) = non_empty(form.captain_definition_relative_file_path) {
            app.captain_definition_relative_file_path = path;
        }
        if let Some(flag) = form.not_expose_as_web_app {
            app.not_expose_as_web_app = flag;
        }
        if let Some(flag) = form.force_ssl {
            app.force_ssl = flag;
        }
        if let Some(flag) = form.websocket_support {
            app.websocket_support = flag;
        }
        if let Some(port) = form.container_http_port {
            app.container_http_port = port;
        }
        if let Some(networks) = form.networks {
            app.networks = networks;
        }
        if let Some(ports) = form.ports {
            app.ports = ports;
        }
        if let Some(volumes) = form.volumes {
            app.volumes = volumes;
        }
        if let Some(env_vars) = form.env_vars {
            app.env_vars = env_vars;
        }
        if form.node_id.is_some() {
            app.node_id = non_empty(form.node_id);
        }
        if form.custom_nginx_config.is_some() {
            app.custom_nginx_config = non_empty(form.custom_nginx_config);
        }
        if form.pre_deploy_function.is_some() {
            app.pre_deploy_function = non_empty(form.pre_deploy_function);
        }
        if form.service_update_override.is_some() {
            app.service_update_override = non_empty(form.service_update_override);
        }
        if let Some(redirect) = form.redirect_domain {
            app.redirect_domain = redirect.trim().to_lowercase();
        }
        if let Some(tags) = form.tags {
            app.tags = tags;
        }
        if form.project_id.is_some() {
            app.project_id = non_empty(form.project_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut app = AppDefinition::new(true);
        app.description = "keep me".into();
        app.instance_count = 3;

        let form: AppUpdateForm = serde_json::from_value(json!({
            "instanceCount": 0,
            "envVars": [{"key": "A", "value": "1"}],
            "nodeId": ""
        }))
        .unwrap();
        form.apply_to(&mut app);

        assert_eq!(app.description, "keep me");
        assert_eq!(app.instance_count, 0);
        assert_eq!(app.env_vars.len(), 1);
        assert_eq!(app.node_id, None);
        assert!(app.has_persistent_data);
    }

    #[test]
    fn test_empty_project_id_detaches() {
        let mut app = AppDefinition::new(false);
        app.project_id = Some("p".into());
        let form = AppUpdateForm {
            project_id: Some(String::new()),
            ..Default::default()
        };
        form.apply_to(&mut app);
        assert_eq!(app.project_id, None);
    }

    #[test]
    fn test_validation_limits() {
        let form = AppUpdateForm {
            instance_count: Some(5000),
            ..Default::default()
        };
        assert!(form.validate().is_err());
        assert!(AppUpdateForm::default().validate().is_ok());
    }
}
