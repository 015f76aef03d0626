//! Resource Dispatch
//!
//! Maps a resource type name and an operation to the matching lifecycle
//! function.

use super::ResourceRegistry;
use crate::artifactory::ArtifactoryClient;
use crate::error::Result;
use crate::state::ResourceData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// Execute one operation on a resource
pub async fn execute(
    registry: &ResourceRegistry,
    client: &ArtifactoryClient,
    operation: Operation,
    type_name: &str,
    data: &mut ResourceData,
) -> Result<()> {
    let resource = registry.require(type_name)?;

    tracing::info!(
        "execute: resource={}, operation={}, id={}",
        type_name,
        operation.as_str(),
        data.id()
    );

    match operation {
        Operation::Create => resource.create(client, data).await,
        Operation::Read => resource.read(client, data).await,
        Operation::Update => resource.update(client, data).await,
        Operation::Delete => resource.delete(client, data).await,
    }
}
