use crate::configuration::Settings;
use crate::services::DataStore;
use std::future::Future;

pub trait CallableTrait {
    fn call(&self, settings: &Settings) -> anyhow::Result<()>;
}

/// Runs one command body on a fresh runtime, against the configured namespace.
pub(crate) fn with_data_store<F, Fut>(settings: &Settings, body: F) -> anyhow::Result<()>
where
    F: FnOnce(DataStore) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let data_store = DataStore::open(settings).await?;
        body(data_store).await
    })
}
