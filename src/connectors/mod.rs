//! Adapters for external services. The data layer only sees traits, a mock
//! implementation sits next to each one for tests.

pub mod docker;

pub use docker::{DockerApi, DockerAuthObj, DockerError, DockerImage};
