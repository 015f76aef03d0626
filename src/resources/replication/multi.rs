//! Push replication to one or more targets
//!
//! Serves both `artifactory_push_replication` and the deprecated
//! `artifactory_replication_config`, which share arguments and endpoints.

use super::{common_schema, fetch, password_digest, target_schema, unpack_target, ReplicationBody, ReplicationResponse, UpdateReplicationBody};
use crate::artifactory::client::{multi_replication_path, replication_path};
use crate::artifactory::ArtifactoryClient;
use crate::error::{ProviderError, Result};
use crate::resource::Resource;
use crate::schema::{FieldSchema, Schema};
use crate::state::ResourceData;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReplicationConfig {
    #[serde(skip)]
    pub repo_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cron_exp: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub enable_event_replication: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replications: Vec<UpdateReplicationBody>,
}

pub struct MultiReplicationConfig {
    type_name: &'static str,
    deprecation: Option<&'static str>,
    schema: Schema,
}

impl MultiReplicationConfig {
    fn with_name(type_name: &'static str, deprecation: Option<&'static str>) -> Self {
        Self {
            type_name,
            deprecation,
            schema: common_schema().field(
                "replications",
                FieldSchema::block(target_schema(), None),
            ),
        }
    }

    pub fn push_replication() -> Self {
        Self::with_name("artifactory_push_replication", None)
    }

    pub fn replication_config() -> Self {
        Self::with_name(
            "artifactory_replication_config",
            Some("This resource has been deprecated in favour of the more explicitly named artifactory_push_replication resource."),
        )
    }

    pub fn unpack(data: &ResourceData) -> UpdateReplicationConfig {
        let repo_key = data.get_string("repo_key");
        let cron_exp = data.get_string("cron_exp");
        let enable_event_replication = data.get_bool("enable_event_replication");

        let replications: Vec<UpdateReplicationBody> = data
            .get_blocks("replications")
            .iter()
            .map(|target| unpack_target(target, &repo_key, &cron_exp, enable_event_replication))
            .collect();

        UpdateReplicationConfig {
            repo_key,
            cron_exp,
            enable_event_replication,
            replications,
        }
    }

    /// The repository settings come from the first target
    pub fn pack(repo_key: &str, list: &[ReplicationBody], data: &mut ResourceData) {
        data.set("repo_key", repo_key);
        if let Some(first) = list.first() {
            data.set("cron_exp", first.cron_exp.as_str());
            data.set("enable_event_replication", first.enable_event_replication);
        }

        let targets = list
            .iter()
            .map(|body| {
                let mut target = ResourceData::default();
                super::pack_target(body, &mut target);
                target.set("password", password_digest(&body.password));
                target
            })
            .collect();
        data.set_blocks("replications", targets);
    }
}

#[async_trait]
impl Resource for MultiReplicationConfig {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn existence_path(&self, id: &str) -> Option<String> {
        Some(replication_path(id))
    }

    fn deprecation_message(&self) -> Option<&str> {
        self.deprecation
    }

    async fn create(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        let config = Self::unpack(data);
        client
            .put_json(&multi_replication_path(&config.repo_key), &config)
            .await?;

        data.set_id(config.repo_key);
        self.read(client, data).await
    }

    async fn read(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        let repo_key = data.id().to_string();
        match fetch(client, &repo_key).await? {
            Some(ReplicationResponse::Push(list)) if !list.is_empty() => {
                Self::pack(&repo_key, &list, data);
            }
            Some(ReplicationResponse::Pull(_)) => {
                return Err(ProviderError::decode(
                    format!("push replication of {}", repo_key),
                    "got a pull replication, use artifactory_pull_replication for remote repositories",
                ));
            }
            _ => {
                tracing::warn!("Replication for {} not found, removing from state", repo_key);
                data.clear_id();
            }
        }
        Ok(())
    }

    async fn update(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        let config = Self::unpack(data);
        client
            .post_json(&multi_replication_path(&config.repo_key), &config)
            .await?;

        data.set_id(config.repo_key);
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

    fn config() -> ResourceData {
        ResourceData::from_value(json!({
            "repo_key": "libs-release-local",
            "cron_exp": "0 0 * * * ?",
            "enable_event_replication": true,
            "replications": [
                {"url": "https://a.example/artifactory/libs", "username": "a", "password": "pa"},
                {"url": "https://b.example/artifactory/libs", "username": "b", "proxy": "corp"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_unpack_copies_repository_settings_into_targets() {
        let config = MultiReplicationConfig::unpack(&config());
        let body = serde_json::to_value(&config).unwrap();

        assert!(body.get("repoKey").is_none());
        assert_eq!(body["cronExp"], "0 0 * * * ?");
        assert_eq!(body["replications"][0]["repoKey"], "libs-release-local");
        assert_eq!(body["replications"][1]["cronExp"], "0 0 * * * ?");
        assert_eq!(body["replications"][1]["proxy"], "corp");
        assert_eq!(body["replications"][1]["enableEventReplication"], true);
    }

    #[test]
    fn test_pack_hashes_passwords() {
        let list = vec![
            ReplicationBody {
                cron_exp: "0 0 1 * * ?".into(),
                enable_event_replication: true,
                url: "https://a.example".into(),
                password: "scrambled".into(),
                proxy_ref: "corp".into(),
                ..Default::default()
            },
            ReplicationBody {
                cron_exp: "ignored".into(),
                url: "https://b.example".into(),
                ..Default::default()
            },
        ];

        let mut data = ResourceData::with_id("libs");
        MultiReplicationConfig::pack("libs", &list, &mut data);

        assert_eq!(data.get_string("cron_exp"), "0 0 1 * * ?");
        assert!(data.get_bool("enable_event_replication"));

        let targets = data.get_blocks("replications");
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].get_string("password"), password_digest("scrambled"));
        assert_eq!(targets[0].get_string("proxy"), "corp");
        assert_eq!(targets[1].get_string("url"), "https://b.example");
    }

    #[test]
    fn test_deprecated_name() {
        let legacy = MultiReplicationConfig::replication_config();
        assert!(legacy.deprecation_message().is_some());
        assert!(MultiReplicationConfig::push_replication()
            .deprecation_message()
            .is_none());
    }
}
