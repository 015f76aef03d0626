//! Replication resources
//!
//! `artifactory/api/replications/{key}` answers with a list of targets for a
//! push (local repository) replication and with a single object for a pull
//! (remote repository) replication. [`ReplicationResponse::decode`] turns
//! that into an explicit enum so each resource can match on the shape it
//! expects.

pub mod multi;
pub mod pull;
pub mod single;

use crate::artifactory::client::replication_path;
use crate::artifactory::ArtifactoryClient;
use crate::error::{ProviderError, Result};
use crate::resource::ResourceRegistry;
use crate::schema::{FieldSchema, Schema, Validation};
use crate::state::ResourceData;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One replication target as returned by GET
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplicationBody {
    pub username: String,
    pub password: String,
    pub url: String,
    pub socket_timeout_millis: i64,
    pub sync_statistics: bool,
    pub enabled: bool,
    pub cron_exp: String,
    pub sync_deletes: bool,
    pub sync_properties: bool,
    pub path_prefix: String,
    pub repo_key: String,
    pub enable_event_replication: bool,
    pub proxy_ref: String,
    pub check_binary_existence_in_filestore: bool,
}

/// One replication target as sent on create/update. The proxy goes out as
/// `proxy` but comes back as `proxyRef`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReplicationBody {
    pub username: String,
    pub password: String,
    pub url: String,
    pub socket_timeout_millis: i64,
    pub sync_statistics: bool,
    pub enabled: bool,
    pub cron_exp: String,
    pub sync_deletes: bool,
    pub sync_properties: bool,
    pub path_prefix: String,
    pub repo_key: String,
    pub enable_event_replication: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub proxy: String,
}

/// Replication of a remote repository from its upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PullReplication {
    pub enabled: bool,
    pub cron_exp: String,
    pub sync_deletes: bool,
    pub sync_properties: bool,
    pub path_prefix: String,
    pub repo_key: String,
    pub enable_event_replication: bool,
    pub check_binary_existence_in_filestore: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplicationResponse {
    Push(Vec<ReplicationBody>),
    Pull(PullReplication),
}

impl ReplicationResponse {
    pub fn decode(value: Value) -> Result<Self> {
        match value {
            Value::Array(_) => serde_json::from_value(value)
                .map(ReplicationResponse::Push)
                .map_err(|e| ProviderError::decode("push replication list", e)),
            Value::Object(_) => serde_json::from_value(value)
                .map(ReplicationResponse::Pull)
                .map_err(|e| ProviderError::decode("pull replication", e)),
            other => Err(ProviderError::decode(
                "replication",
                format!("expected a list or an object, got {}", other),
            )),
        }
    }
}

/// GET the replication of `repo_key`. `None` when the repository has none.
pub(crate) async fn fetch(client: &ArtifactoryClient, repo_key: &str) -> Result<Option<ReplicationResponse>> {
    match client.get_value(&replication_path(repo_key)).await {
        Ok(value) => ReplicationResponse::decode(value).map(Some),
        Err(err) if err.is_missing_replication() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Shared by every replication resource
pub(crate) async fn delete(client: &ArtifactoryClient, data: &ResourceData) -> Result<()> {
    match client.delete(&replication_path(data.id())).await {
        Err(err) if err.is_missing_replication() => Ok(()),
        other => other,
    }
}

/// The replication password comes back scrambled. State keeps a digest of
/// the scrambled value so a server-side change is still noticed.
pub fn password_digest(scrambled: &str) -> String {
    format!("{:x}", Md5::digest(scrambled.as_bytes()))
}

pub(crate) fn common_schema() -> Schema {
    Schema::new()
        .field(
            "repo_key",
            FieldSchema::string()
                .required()
                .force_new()
                .validate(Validation::NotEmpty),
        )
        .field(
            "cron_exp",
            FieldSchema::string()
                .required()
                .validate(Validation::Cron)
                .description("Quartz cron expression, seconds first."),
        )
        .field("enable_event_replication", FieldSchema::bool().computed())
}

/// Arguments of one push target
pub(crate) fn target_schema() -> Schema {
    Schema::new()
        .field(
            "url",
            FieldSchema::string()
                .force_new()
                .validate(Validation::HttpUrl),
        )
        .field(
            "socket_timeout_millis",
            FieldSchema::int()
                .computed()
                .validate(Validation::IntAtLeast(0)),
        )
        .field("username", FieldSchema::string())
        .field("password", FieldSchema::string().sensitive())
        .field("enabled", FieldSchema::bool().computed())
        .field("sync_deletes", FieldSchema::bool().computed())
        .field("sync_properties", FieldSchema::bool().computed())
        .field("sync_statistics", FieldSchema::bool().computed())
        .field("path_prefix", FieldSchema::string())
        .field(
            "proxy",
            FieldSchema::string().description("Proxy key from Artifactory Proxies setting"),
        )
}

/// Build one push target from a target block (or a flat single config)
pub(crate) fn unpack_target(
    target: &ResourceData,
    repo_key: &str,
    cron_exp: &str,
    enable_event_replication: bool,
) -> UpdateReplicationBody {
    UpdateReplicationBody {
        username: target.get_string("username"),
        password: target.get_string("password"),
        url: target.get_string("url"),
        socket_timeout_millis: target.get_int("socket_timeout_millis"),
        sync_statistics: target.get_bool("sync_statistics"),
        enabled: target.get_bool("enabled"),
        cron_exp: cron_exp.to_string(),
        sync_deletes: target.get_bool("sync_deletes"),
        sync_properties: target.get_bool("sync_properties"),
        path_prefix: target.get_string("path_prefix"),
        repo_key: repo_key.to_string(),
        enable_event_replication,
        proxy: target.get_string("proxy"),
    }
}

/// Write the target arguments of `body`. The password is left alone.
pub(crate) fn pack_target(body: &ReplicationBody, data: &mut ResourceData) {
    data.set("url", body.url.as_str());
    data.set("socket_timeout_millis", body.socket_timeout_millis);
    data.set("username", body.username.as_str());
    data.set("enabled", body.enabled);
    data.set("sync_deletes", body.sync_deletes);
    data.set("sync_properties", body.sync_properties);
    data.set("sync_statistics", body.sync_statistics);
    data.set("path_prefix", body.path_prefix.as_str());
    data.set("proxy", body.proxy_ref.as_str());
}

pub(crate) fn pack_push(body: &ReplicationBody, data: &mut ResourceData) {
    data.set("repo_key", body.repo_key.as_str());
    data.set("cron_exp", body.cron_exp.as_str());
    data.set("enable_event_replication", body.enable_event_replication);
    pack_target(body, data);
}

pub(crate) fn pack_pull(body: &PullReplication, data: &mut ResourceData) {
    data.set("repo_key", body.repo_key.as_str());
    data.set("cron_exp", body.cron_exp.as_str());
    data.set("enable_event_replication", body.enable_event_replication);
    data.set("enabled", body.enabled);
    data.set("sync_deletes", body.sync_deletes);
    data.set("sync_properties", body.sync_properties);
    data.set("path_prefix", body.path_prefix.as_str());
}

pub(crate) fn register(registry: &mut ResourceRegistry) {
    registry.register(single::SingleReplicationConfig::new());
    registry.register(multi::MultiReplicationConfig::replication_config());
    registry.register(multi::MultiReplicationConfig::push_replication());
    registry.register(pull::PullReplicationResource::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_array_is_push() {
        let decoded = ReplicationResponse::decode(json!([
            {"repoKey": "libs", "url": "https://target/artifactory/libs", "cronExp": "0 0 * * * ?", "proxyRef": "corp"}
        ]))
        .unwrap();

        match decoded {
            ReplicationResponse::Push(list) => {
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].proxy_ref, "corp");
                assert_eq!(list[0].socket_timeout_millis, 0);
            }
            other => panic!("expected push, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_object_is_pull() {
        let decoded = ReplicationResponse::decode(json!({
            "repoKey": "npm-remote",
            "cronExp": "0 0 12 * * ?",
            "enabled": true,
            "checkBinaryExistenceInFilestore": true
        }))
        .unwrap();

        assert_eq!(
            decoded,
            ReplicationResponse::Pull(PullReplication {
                repo_key: "npm-remote".into(),
                cron_exp: "0 0 12 * * ?".into(),
                enabled: true,
                check_binary_existence_in_filestore: true,
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_decode_rejects_scalars() {
        let err = ReplicationResponse::decode(json!("nope")).unwrap_err();
        assert!(matches!(err, ProviderError::Decode { .. }));
        assert!(ReplicationResponse::decode(json!([1, 2])).is_err());
    }

    #[test]
    fn test_update_body_sends_proxy_key() {
        let target = ResourceData::from_value(json!({
            "url": "https://target",
            "proxy": "corp",
            "password": "secret"
        }))
        .unwrap();

        let body = serde_json::to_value(unpack_target(&target, "libs", "0 0 * * * ?", true)).unwrap();
        assert_eq!(body["proxy"], "corp");
        assert_eq!(body["repoKey"], "libs");
        assert_eq!(body["password"], "secret");
        assert_eq!(body["enableEventReplication"], true);
        assert!(body.get("proxyRef").is_none());
    }

    #[test]
    fn test_password_digest() {
        assert_eq!(password_digest(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(password_digest("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }
}
