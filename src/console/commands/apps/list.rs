use crate::configuration::Settings;
use crate::console::commands::{with_data_store, CallableTrait};
use std::collections::BTreeMap;

pub struct ListCommand {
    json: bool,
}

impl ListCommand {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl CallableTrait for ListCommand {
    fn call(&self, settings: &Settings) -> anyhow::Result<()> {
        with_data_store(settings, |data_store| async move {
            let apps = data_store.apps().get_app_definitions().await?;

            if self.json {
                // Repository credentials stay out of the output
                let sealed = apps
                    .iter()
                    .map(|(name, app)| Ok((name.clone(), data_store.apps().seal(app)?)))
                    .collect::<crate::errors::Result<BTreeMap<_, _>>>()?;
                println!("{}", serde_json::to_string_pretty(&sealed)?);
                return Ok(());
            }

            for (name, app) in &apps {
                let deployed = app
                    .deployed()
                    .and_then(|v| v.deployed_image_name.as_deref())
                    .unwrap_or("-");
                println!(
                    "{:<30} instances={} version={} image={}",
                    name, app.instance_count, app.deployed_version, deployed
                );
            }
            Ok(())
        })
    }
}
