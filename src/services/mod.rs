mod apps;
mod data_store;
mod image_cleanup;
mod projects;
mod registries;

pub use apps::AppsStore;
pub use data_store::{DataStore, CURRENT_SCHEMA_VERSION};
pub use image_cleanup::{ImageCleanup, UnusedImage};
pub use projects::{is_valid_project_id, ProjectsStore};
pub use registries::RegistriesStore;
