use crate::configuration::Settings;
use crate::console::commands::{with_data_store, CallableTrait};

pub struct AddCommand {
    name: String,
    parent: Option<String>,
    description: String,
}

impl AddCommand {
    pub fn new(name: String, parent: Option<String>, description: Option<String>) -> Self {
        Self {
            name,
            parent,
            description: description.unwrap_or_default(),
        }
    }
}

impl CallableTrait for AddCommand {
    fn call(&self, settings: &Settings) -> anyhow::Result<()> {
        with_data_store(settings, |data_store| async move {
            let project = data_store
                .projects()
                .add_project(&self.name, self.parent.as_deref(), &self.description)
                .await?;
            println!("{}", project.id);
            Ok(())
        })
    }
}
