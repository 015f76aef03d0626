//! Resource abstraction layer
//!
//! Every Artifactory object is exposed as a [`Resource`]: a schema plus the
//! four lifecycle functions. Implementations live in [`crate::resources`];
//! this module holds the contract and the machinery around it.
//!
//! # Architecture
//!
//! - [`registry`] - maps resource type names to implementations
//! - [`dispatch`] - runs one lifecycle operation by type name
//! - [`lifecycle`] - plans and applies configurations (create/update/replace),
//!   refreshes, imports and destroys
//!
//! # Example
//!
//! ```ignore
//! use artifactory_provider::resource::{lifecycle, ResourceRegistry};
//!
//! async fn apply(client: &ArtifactoryClient, config: serde_json::Map<String, Value>) -> Result<()> {
//!     let registry = ResourceRegistry::new();
//!     let backup = registry.require("artifactory_backup")?;
//!     let state = lifecycle::apply(backup, client, None, config).await?;
//!     println!("{}", state.id());
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod lifecycle;
mod registry;

use crate::artifactory::ArtifactoryClient;
use crate::error::Result;
use crate::schema::Schema;
use crate::state::ResourceData;
use async_trait::async_trait;

pub use dispatch::{execute, Operation};
pub use lifecycle::Plan;
pub use registry::ResourceRegistry;

/// Contract every resource type implements.
///
/// `create` and `update` finish by reading the object back, so `data` holds
/// the remote view afterwards. `read` clears the id when the object no longer
/// exists instead of failing.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name, e.g. `artifactory_local_rpm_repository`
    fn type_name(&self) -> &str;

    fn schema(&self) -> &Schema;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Set when the resource type is kept only for compatibility
    fn deprecation_message(&self) -> Option<&str> {
        None
    }

    /// Rewrite configured values into the form the API echoes back
    fn normalize(&self, _data: &mut ResourceData) {}

    /// Path whose GET answers whether the object `id` exists
    fn existence_path(&self, _id: &str) -> Option<String> {
        None
    }

    /// Checks that need more than one argument. Runs before any request.
    fn validate(&self, _data: &ResourceData) -> Result<()> {
        Ok(())
    }

    async fn create(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()>;

    async fn read(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()>;

    async fn update(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()>;

    async fn delete(&self, client: &ArtifactoryClient, data: &ResourceData) -> Result<()>;
}
