mod build_log;
pub mod docker_registry;
pub mod naming;
pub mod security;

pub use build_log::BuildLog;
pub use docker_registry::DockerRegistryHelper;
pub use security::Encryptor;
