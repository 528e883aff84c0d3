//! imagewright build tool integration
//!
//! This crate resolves the build tool of a project directory and drives it
//! to produce either a ready image (buildpack path) or a packaged artifact
//! plus a rendered Dockerfile (manual path).

pub mod command;
pub mod descriptor;
pub mod detect;
pub mod error;
pub mod gradle;
pub mod maven;
pub mod output;

pub use command::{CommandOutput, ToolCommand};
pub use descriptor::{DEFAULT_TEMPLATE, DockerfileRenderer};
pub use detect::{BuildToolKind, connect, detect};
pub use error::{BuildToolError, Result};
pub use gradle::GradleAdapter;
pub use maven::MavenAdapter;
