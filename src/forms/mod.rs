mod app;
mod registry;

pub use app::*;
pub use registry::*;
