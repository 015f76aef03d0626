//! Resource lifecycle
//!
//! Drives a [`Resource`] from a declarative configuration: defaults and
//! validation first, then create, update or replace depending on the prior
//! state.

use super::Resource;
use crate::artifactory::ArtifactoryClient;
use crate::error::{Diagnostic, Result};
use crate::state::ResourceData;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Create,
    Update,
    /// A force-new argument changed: delete, then create
    Replace,
    NoChange,
}

/// Apply schema defaults and run every validation. No request is made.
pub fn prepare(resource: &dyn Resource, config: Map<String, Value>) -> Result<ResourceData> {
    let mut data = ResourceData::new(config);
    let schema = resource.schema();
    schema.apply_defaults(data.attributes_mut());
    schema.validate(data.attributes())?;
    resource.normalize(&mut data);
    resource.validate(&data)?;
    Ok(data)
}

/// Decide what applying `config` over `prior` requires
pub fn plan(resource: &dyn Resource, prior: Option<&ResourceData>, config: &ResourceData) -> Plan {
    let Some(prior) = prior.filter(|p| !p.is_absent()) else {
        return Plan::Create;
    };

    let changes = resource.schema().changes(config.attributes(), prior.attributes());
    if changes.is_empty() {
        return Plan::NoChange;
    }

    tracing::debug!(
        "{} {}: changed arguments {:?}",
        resource.type_name(),
        prior.id(),
        changes.iter().map(|c| c.path.as_str()).collect::<Vec<_>>()
    );

    if changes.iter().any(|c| c.force_new) {
        Plan::Replace
    } else {
        Plan::Update
    }
}

/// Existence check through a single unretried GET. Resources without an
/// existence path report `true` and leave the decision to their read.
pub async fn exists(resource: &dyn Resource, client: &ArtifactoryClient, id: &str) -> Result<bool> {
    match resource.existence_path(id) {
        Some(path) => client.probe(&path).await,
        None => Ok(true),
    }
}

/// Warnings to show whenever the resource is used
pub fn diagnostics(resource: &dyn Resource) -> Vec<Diagnostic> {
    resource
        .deprecation_message()
        .map(|msg| {
            vec![Diagnostic::warning(
                format!("{} is deprecated", resource.type_name()),
                msg,
            )]
        })
        .unwrap_or_default()
}

/// Bring the remote object in line with `config`, returning the new state
pub async fn apply(
    resource: &dyn Resource,
    client: &ArtifactoryClient,
    prior: Option<&ResourceData>,
    config: Map<String, Value>,
) -> Result<ResourceData> {
    let mut data = prepare(resource, config)?;
    let planned = plan(resource, prior, &data);

    tracing::info!("{}: plan {:?}", resource.type_name(), planned);

    match (planned, prior) {
        (Plan::Update, Some(prior)) => {
            data.set_id(prior.id());
            resource.update(client, &mut data).await?;
        }
        (Plan::Replace, Some(prior)) => {
            resource.delete(client, prior).await?;
            resource.create(client, &mut data).await?;
        }
        (Plan::NoChange, Some(prior)) => {
            let mut current = prior.clone();
            if exists(resource, client, prior.id()).await? {
                resource.read(client, &mut current).await?;
            } else {
                current.clear_id();
            }
            if current.is_absent() {
                tracing::info!("{} {} vanished, recreating", resource.type_name(), prior.id());
                resource.create(client, &mut data).await?;
            } else {
                data = current;
            }
        }
        _ => resource.create(client, &mut data).await?,
    }

    Ok(data)
}

/// Re-read a resource. `None` means it no longer exists remotely.
pub async fn refresh(
    resource: &dyn Resource,
    client: &ArtifactoryClient,
    state: &ResourceData,
) -> Result<Option<ResourceData>> {
    let mut data = state.clone();
    resource.read(client, &mut data).await?;
    Ok(Some(data).filter(|d| !d.is_absent()))
}

/// Adopt an existing remote object by id
pub async fn import(
    resource: &dyn Resource,
    client: &ArtifactoryClient,
    id: &str,
) -> Result<Option<ResourceData>> {
    if !exists(resource, client, id).await? {
        tracing::info!("{}: {} does not exist", resource.type_name(), id);
        return Ok(None);
    }
    refresh(resource, client, &ResourceData::with_id(id)).await
}

pub async fn destroy(
    resource: &dyn Resource,
    client: &ArtifactoryClient,
    state: &ResourceData,
) -> Result<()> {
    tracing::info!("{}: destroying {}", resource.type_name(), state.id());
    resource.delete(client, state).await
}
