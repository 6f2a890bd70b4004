mod app;
mod project;
mod registry;

pub use app::*;
pub use project::*;
pub use registry::*;
