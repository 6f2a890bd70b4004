pub mod apps;
mod callable;
pub mod projects;
pub mod registries;

pub use callable::*;
