//! Declarative management of JFrog Artifactory configuration.
//!
//! Each supported object (repositories, replications, webhooks, backups) is a
//! [`resource::Resource`]: a schema of arguments plus create/read/update/delete
//! functions that translate between [`state::ResourceData`] and the
//! Artifactory REST API.

pub mod artifactory;
pub mod config;
pub mod error;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod state;

/// Version injected at compile time via ARTIFACTORY_PROVIDER_VERSION (set by
/// CI), or "dev" for local builds.
pub const VERSION: &str = match option_env!("ARTIFACTORY_PROVIDER_VERSION") {
    Some(v) => v,
    None => "dev",
};

pub use artifactory::{ArtifactoryClient, Credentials};
pub use config::ProviderConfig;
pub use error::{Diagnostic, ProviderError, Result, Severity};
pub use resource::{Resource, ResourceRegistry};
pub use state::{ResourceData, StateFile};
