use crate::configuration::Settings;
use crate::console::commands::{with_data_store, CallableTrait};

pub struct DeleteCommand {
    id: String,
    allow_local: bool,
}

impl DeleteCommand {
    pub fn new(id: String, allow_local: bool) -> Self {
        Self { id, allow_local }
    }
}

impl CallableTrait for DeleteCommand {
    fn call(&self, settings: &Settings) -> anyhow::Result<()> {
        with_data_store(settings, |data_store| async move {
            data_store
                .registries()
                .delete_registry(&self.id, self.allow_local)
                .await?;
            println!("Deleted registry {}", self.id);
            Ok(())
        })
    }
}
