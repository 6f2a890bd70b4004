use crate::configuration::Settings;
use crate::console::commands::{with_data_store, CallableTrait};

pub struct DeleteCommand {
    name: String,
}

impl DeleteCommand {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

impl CallableTrait for DeleteCommand {
    fn call(&self, settings: &Settings) -> anyhow::Result<()> {
        with_data_store(settings, |data_store| async move {
            data_store.apps().delete_app_definition(&self.name).await?;
            println!("Deleted {}", self.name);
            Ok(())
        })
    }
}
