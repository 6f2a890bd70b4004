use crate::configuration::Settings;
use crate::console::commands::{with_data_store, CallableTrait};

/// Used after the root domain changed and the old certificates are void.
pub struct DisableSslCommand;

impl CallableTrait for DisableSslCommand {
    fn call(&self, settings: &Settings) -> anyhow::Result<()> {
        with_data_store(settings, |data_store| async move {
            data_store.apps().ensure_all_apps_sub_domain_ssl_disabled().await?;
            println!("Default sub-domain SSL and force SSL disabled on all apps");
            Ok(())
        })
    }
}
