//! `artifactory_single_replication_config`

use super::{common_schema, fetch, pack_pull, pack_push, target_schema, unpack_target, ReplicationResponse};
use crate::artifactory::client::replication_path;
use crate::artifactory::ArtifactoryClient;
use crate::error::{ProviderError, Result};
use crate::resource::Resource;
use crate::schema::Schema;
use crate::state::ResourceData;
use async_trait::async_trait;

pub const MULTIPLE_CONFIG_ERROR: &str = "resource_single_replication_config does not support multiple replication config on a repo. Use resource_artifactory_replication_config instead";

pub struct SingleReplicationConfig {
    schema: Schema,
}

impl SingleReplicationConfig {
    pub fn new() -> Self {
        Self {
            schema: common_schema().merge(target_schema()),
        }
    }

    fn unpack(data: &ResourceData) -> super::UpdateReplicationBody {
        unpack_target(
            data,
            &data.get_string("repo_key"),
            &data.get_string("cron_exp"),
            data.get_bool("enable_event_replication"),
        )
    }
}

impl Default for SingleReplicationConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resource for SingleReplicationConfig {
    fn type_name(&self) -> &str {
        "artifactory_single_replication_config"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn existence_path(&self, id: &str) -> Option<String> {
        Some(replication_path(id))
    }

    fn description(&self) -> Option<&str> {
        Some("Used for configuring replications on repos. However, the TCL only makes good sense for local repo replication (PUSH) and not remote (PULL).")
    }

    fn deprecation_message(&self) -> Option<&str> {
        Some("This resource has been deprecated in favour of the more explicitly named artifactory_pull_replication resource.")
    }

    async fn create(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        let body = Self::unpack(data);
        client.put_json(&replication_path(&body.repo_key), &body).await?;

        data.set_id(body.repo_key);
        self.read(client, data).await
    }

    async fn read(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        match fetch(client, data.id()).await? {
            Some(ReplicationResponse::Push(list)) => match list.as_slice() {
                [] => data.clear_id(),
                [body] => pack_push(body, data),
                _ => return Err(ProviderError::validation(MULTIPLE_CONFIG_ERROR)),
            },
            Some(ReplicationResponse::Pull(body)) => pack_pull(&body, data),
            None => {
                tracing::warn!("Replication for {} not found, removing from state", data.id());
                data.clear_id();
            }
        }
        Ok(())
    }

    async fn update(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        let body = Self::unpack(data);
        client.post_json(&replication_path(&body.repo_key), &body).await?;

        data.set_id(body.repo_key);
        self.read(client, data).await
    }

    async fn delete(&self, client: &ArtifactoryClient, data: &ResourceData) -> Result<()> {
        super::delete(client, data).await
    }
}
