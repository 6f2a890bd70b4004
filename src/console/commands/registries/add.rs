use crate::configuration::Settings;
use crate::console::commands::{with_data_store, CallableTrait};
use crate::forms::RegistryForm;

pub struct AddCommand {
    form: RegistryForm,
}

impl AddCommand {
    pub fn new(form: RegistryForm) -> Self {
        Self { form }
    }
}

impl CallableTrait for AddCommand {
    fn call(&self, settings: &Settings) -> anyhow::Result<()> {
        with_data_store(settings, |data_store| async move {
            let id = data_store.registries().add_registry(self.form.clone()).await?;
            println!("{}", id);
            Ok(())
        })
    }
}
