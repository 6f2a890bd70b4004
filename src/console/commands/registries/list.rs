use crate::configuration::Settings;
use crate::console::commands::{with_data_store, CallableTrait};

pub struct ListCommand;

impl CallableTrait for ListCommand {
    fn call(&self, settings: &Settings) -> anyhow::Result<()> {
        with_data_store(settings, |data_store| async move {
            let registries = data_store.registries();
            let default_id = registries.get_default_push_registry_id().await?;

            for registry in registries.get_all_registries().await? {
                let marker = if default_id.as_deref() == Some(registry.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{} {}", marker, registry);
            }
            Ok(())
        })
    }
}
