use crate::configuration::Settings;
use crate::console::commands::{with_data_store, CallableTrait};

/// An empty id turns pushing off.
pub struct SetDefaultCommand {
    id: String,
}

impl SetDefaultCommand {
    pub fn new(id: String) -> Self {
        Self { id }
    }
}

impl CallableTrait for SetDefaultCommand {
    fn call(&self, settings: &Settings) -> anyhow::Result<()> {
        with_data_store(settings, |data_store| async move {
            data_store
                .registries()
                .set_default_push_registry_id(&self.id)
                .await?;
            println!("Default push registry set to {:?}", self.id);
            Ok(())
        })
    }
}
