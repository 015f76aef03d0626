//! `artifactory_backup`
//!
//! Backups live in the system configuration. GET returns the whole
//! configuration as XML, with backups under `backups > backup[]`. Changes go
//! out as a YAML PATCH keyed by backup name: `backups: {<key>: {...}}`.

use crate::artifactory::client::SYSTEM_CONFIGURATION_PATH;
use crate::artifactory::ArtifactoryClient;
use crate::error::{ProviderError, Result};
use crate::resource::{Resource, ResourceRegistry};
use crate::schema::{FieldSchema, Schema, Validation};
use crate::state::ResourceData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Clears every backup; siblings are restored by a second patch
pub const CLEAR_BACKUPS_PATCH: &str = "backups: ~\n";

/// One backup, in the shape the YAML patch expects
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub key: String,
    pub cron_exp: String,
    pub enabled: bool,
    pub retention_period_hours: i64,
    pub excluded_repositories: Vec<String>,
    pub create_archive: bool,
    pub exclude_new_repositories: bool,
    pub send_mail_on_error: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BackupXml {
    key: String,
    cron_exp: String,
    enabled: bool,
    retention_period_hours: i64,
    excluded_repositories: ExcludedRepositoriesXml,
    create_archive: bool,
    exclude_new_repositories: bool,
    send_mail_on_error: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ExcludedRepositoriesXml {
    #[serde(rename = "repositoryRef", default)]
    repository_ref: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BackupsXml {
    #[serde(default)]
    backup: Vec<BackupXml>,
}

#[derive(Debug, Default, Deserialize)]
struct SystemConfigXml {
    #[serde(default)]
    backups: BackupsXml,
}

impl From<BackupXml> for Backup {
    fn from(xml: BackupXml) -> Self {
        Self {
            key: xml.key,
            cron_exp: xml.cron_exp,
            enabled: xml.enabled,
            retention_period_hours: xml.retention_period_hours,
            excluded_repositories: xml.excluded_repositories.repository_ref,
            create_archive: xml.create_archive,
            exclude_new_repositories: xml.exclude_new_repositories,
            send_mail_on_error: xml.send_mail_on_error,
        }
    }
}

/// Every backup in a system configuration document
pub fn decode_backups(xml: &str) -> Result<Vec<Backup>> {
    let config: SystemConfigXml = quick_xml::de::from_str(xml)
        .map_err(|e| ProviderError::decode("system configuration backups", e))?;
    Ok(config.backups.backup.into_iter().map(Backup::from).collect())
}

/// `backups: {<key>: <backup>...}`
pub fn backups_patch<'a>(backups: impl IntoIterator<Item = &'a Backup>) -> Result<String> {
    let by_key: BTreeMap<&str, &Backup> = backups.into_iter().map(|b| (b.key.as_str(), b)).collect();
    let mut doc = BTreeMap::new();
    doc.insert("backups", by_key);
    serde_yaml::to_string(&doc).map_err(|e| ProviderError::encode("backup patch", e))
}

pub fn backup_schema() -> Schema {
    Schema::new()
        .field(
            "key",
            FieldSchema::string()
                .required()
                .force_new()
                .validate(Validation::NotEmpty)
                .description("Backup config name."),
        )
        .field(
            "enabled",
            FieldSchema::bool()
                .default_value(true)
                .description("Flag to enable or disable the backup config."),
        )
        .field(
            "cron_exp",
            FieldSchema::string()
                .required()
                .validate(Validation::Cron)
                .description("Cron expression to control the backup frequency."),
        )
        .field(
            "retention_period_hours",
            FieldSchema::int()
                .default_value(168)
                .validate(Validation::IntAtLeast(0))
                .description("The number of hours to keep a backup before Artifactory will clean it up. Applicable only to non-incremental backups."),
        )
        .field("excluded_repositories", FieldSchema::string_list())
        .field(
            "create_archive",
            FieldSchema::bool()
                .default_value(false)
                .description("Create backups within a Zip archive (slow and CPU intensive)."),
        )
        .field("exclude_new_repositories", FieldSchema::bool().default_value(false))
        .field(
            "send_mail_on_error",
            FieldSchema::bool()
                .default_value(true)
                .description("Notify all Artifactory administrators by email if a backup fails."),
        )
}

pub struct BackupResource {
    schema: Schema,
}

impl BackupResource {
    pub fn new() -> Self {
        Self {
            schema: backup_schema(),
        }
    }

    pub fn unpack(data: &ResourceData) -> Backup {
        Backup {
            key: data.get_string("key"),
            cron_exp: data.get_string("cron_exp"),
            enabled: data.get_bool("enabled"),
            retention_period_hours: data.get_int("retention_period_hours"),
            excluded_repositories: data.get_string_list("excluded_repositories"),
            create_archive: data.get_bool("create_archive"),
            exclude_new_repositories: data.get_bool("exclude_new_repositories"),
            send_mail_on_error: data.get_bool("send_mail_on_error"),
        }
    }

    pub fn pack(backup: &Backup, data: &mut ResourceData) {
        data.set("key", backup.key.as_str());
        data.set("cron_exp", backup.cron_exp.as_str());
        data.set("enabled", backup.enabled);
        data.set("retention_period_hours", backup.retention_period_hours);
        data.set("excluded_repositories", backup.excluded_repositories.clone());
        data.set("create_archive", backup.create_archive);
        data.set("exclude_new_repositories", backup.exclude_new_repositories);
        data.set("send_mail_on_error", backup.send_mail_on_error);
    }

    async fn fetch_all(client: &ArtifactoryClient) -> Result<Vec<Backup>> {
        let xml = client.get_xml(SYSTEM_CONFIGURATION_PATH).await?;
        decode_backups(&xml)
    }

    /// Create and update are the same patch
    async fn upsert(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        let backup = Self::unpack(data);
        let patch = backups_patch([&backup])?;
        client.patch_yaml(SYSTEM_CONFIGURATION_PATH, &patch).await?;

        data.set_id(backup.key);
        self.read(client, data).await
    }
}

impl Default for BackupResource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resource for BackupResource {
    fn type_name(&self) -> &str {
        "artifactory_backup"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn description(&self) -> Option<&str> {
        Some("Backup config block of the system configuration. Manages the automatic and periodic backups of the entire Artifactory instance.")
    }

    async fn create(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        self.upsert(client, data).await
    }

    async fn read(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        let backups = Self::fetch_all(client).await?;
        match backups.iter().find(|b| b.key == data.id()) {
            Some(backup) => Self::pack(backup, data),
            None => {
                tracing::warn!("Backup {} not found, removing from state", data.id());
                data.clear_id();
            }
        }
        Ok(())
    }

    async fn update(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        self.upsert(client, data).await
    }

    /// Clear all backups, then put the others back unchanged
    async fn delete(&self, client: &ArtifactoryClient, data: &ResourceData) -> Result<()> {
        let backups = Self::fetch_all(client).await?;
        let siblings: Vec<&Backup> = backups.iter().filter(|b| b.key != data.id()).collect();

        client
            .patch_yaml(SYSTEM_CONFIGURATION_PATH, CLEAR_BACKUPS_PATCH)
            .await?;

        if siblings.is_empty() {
            return Ok(());
        }

        tracing::debug!("Restoring {} other backup(s)", siblings.len());
        let restore = backups_patch(siblings)?;
        client.patch_yaml(SYSTEM_CONFIGURATION_PATH, &restore).await
    }
}

pub(crate) fn register(registry: &mut ResourceRegistry) {
    registry.register(BackupResource::new());
}
