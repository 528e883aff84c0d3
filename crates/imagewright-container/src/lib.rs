//! imagewright Docker integration
//!
//! [`DockerMaterializer`] implements the engine's image registry on top of
//! the Docker Engine API.

pub mod context;
pub mod docker;
pub mod error;

pub use context::create_context;
pub use docker::{DockerMaterializer, connect};
pub use error::{ContainerError, Result};
