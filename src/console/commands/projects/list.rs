use crate::configuration::Settings;
use crate::console::commands::{with_data_store, CallableTrait};

pub struct ListCommand;

impl CallableTrait for ListCommand {
    fn call(&self, settings: &Settings) -> anyhow::Result<()> {
        with_data_store(settings, |data_store| async move {
            let projects = data_store.projects().get_all_projects().await?;
            println!("{}", serde_json::to_string_pretty(&projects)?);
            Ok(())
        })
    }
}
