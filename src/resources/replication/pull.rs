//! `artifactory_pull_replication`

use super::{common_schema, fetch, pack_pull, PullReplication, ReplicationResponse};
use crate::artifactory::client::replication_path;
use crate::artifactory::ArtifactoryClient;
use crate::error::{ProviderError, Result};
use crate::resource::Resource;
use crate::schema::{FieldSchema, Schema};
use crate::state::ResourceData;
use async_trait::async_trait;

pub struct PullReplicationResource {
    schema: Schema,
}

impl PullReplicationResource {
    pub fn new() -> Self {
        Self {
            schema: common_schema().merge(
                Schema::new()
                    .field("enabled", FieldSchema::bool().computed())
                    .field("sync_deletes", FieldSchema::bool().computed())
                    .field("sync_properties", FieldSchema::bool().computed())
                    .field("path_prefix", FieldSchema::string())
                    .field(
                        "check_binary_existence_in_filestore",
                        FieldSchema::bool().computed().description(
                            "Check the filestore for the binary before fetching it from the remote.",
                        ),
                    ),
            ),
        }
    }

    pub fn unpack(data: &ResourceData) -> PullReplication {
        PullReplication {
            enabled: data.get_bool("enabled"),
            cron_exp: data.get_string("cron_exp"),
            sync_deletes: data.get_bool("sync_deletes"),
            sync_properties: data.get_bool("sync_properties"),
            path_prefix: data.get_string("path_prefix"),
            repo_key: data.get_string("repo_key"),
            enable_event_replication: data.get_bool("enable_event_replication"),
            check_binary_existence_in_filestore: data
                .get_bool("check_binary_existence_in_filestore"),
        }
    }

    pub fn pack(body: &PullReplication, data: &mut ResourceData) {
        pack_pull(body, data);
        data.set(
            "check_binary_existence_in_filestore",
            body.check_binary_existence_in_filestore,
        );
    }
}

impl Default for PullReplicationResource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resource for PullReplicationResource {
    fn type_name(&self) -> &str {
        "artifactory_pull_replication"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn existence_path(&self, id: &str) -> Option<String> {
        Some(replication_path(id))
    }

    fn description(&self) -> Option<&str> {
        Some("Replication of a remote repository from its upstream.")
    }

    async fn create(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        let body = Self::unpack(data);
        client.put_json(&replication_path(&body.repo_key), &body).await?;

        data.set_id(body.repo_key);
        self.read(client, data).await
    }

    async fn read(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        match fetch(client, data.id()).await? {
            Some(ReplicationResponse::Pull(body)) => Self::pack(&body, data),
            Some(ReplicationResponse::Push(_)) => {
                return Err(ProviderError::decode(
                    format!("pull replication of {}", data.id()),
                    "got a push replication list, use artifactory_push_replication for local repositories",
                ));
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unpack() {
        let data = ResourceData::from_value(json!({
            "repo_key": "npm-remote",
            "cron_exp": "0 0 12 * * ?",
            "enabled": true,
            "check_binary_existence_in_filestore": true
        }))
        .unwrap();

        let body = serde_json::to_value(PullReplicationResource::unpack(&data)).unwrap();
        assert_eq!(body["repoKey"], "npm-remote");
        assert_eq!(body["checkBinaryExistenceInFilestore"], true);
        assert_eq!(body["syncDeletes"], false);
    }

    #[test]
    fn test_schema_has_no_target_arguments() {
        let resource = PullReplicationResource::new();
        assert!(!resource.schema().contains("url"));
        assert!(!resource.schema().contains("password"));
        assert!(resource.schema().get("cron_exp").unwrap().required);
    }
}
