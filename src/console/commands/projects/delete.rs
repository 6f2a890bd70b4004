use crate::configuration::Settings;
use crate::console::commands::{with_data_store, CallableTrait};

pub struct DeleteCommand {
    ids: Vec<String>,
}

impl DeleteCommand {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }
}

impl CallableTrait for DeleteCommand {
    fn call(&self, settings: &Settings) -> anyhow::Result<()> {
        with_data_store(settings, |data_store| async move {
            data_store.projects().delete_projects(&self.ids).await?;
            println!("Deleted {} project(s)", self.ids.len());
            Ok(())
        })
    }
}
