use crate::configuration::Settings;
use crate::console::commands::{with_data_store, CallableTrait};

pub struct RenameCommand {
    old_name: String,
    new_name: String,
}

impl RenameCommand {
    pub fn new(old_name: String, new_name: String) -> Self {
        Self { old_name, new_name }
    }
}

impl CallableTrait for RenameCommand {
    fn call(&self, settings: &Settings) -> anyhow::Result<()> {
        with_data_store(settings, |data_store| async move {
            data_store.apps().rename_app(&self.old_name, &self.new_name).await?;
            println!("Renamed {} to {}", self.old_name, self.new_name);
            Ok(())
        })
    }
}
