use crate::configuration::Settings;
use crate::console::commands::{with_data_store, CallableTrait};

pub struct RegisterCommand {
    name: String,
    persistent: bool,
}

impl RegisterCommand {
    pub fn new(name: String, persistent: bool) -> Self {
        Self { name, persistent }
    }
}

impl CallableTrait for RegisterCommand {
    fn call(&self, settings: &Settings) -> anyhow::Result<()> {
        with_data_store(settings, |data_store| async move {
            data_store
                .apps()
                .register_app_definition(&self.name, self.persistent)
                .await?;
            println!("Registered {}", self.name);
            Ok(())
        })
    }
}
