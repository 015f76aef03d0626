//! Webhook resources
//!
//! One resource type per event domain (`artifactory_<domain>_webhook`), all
//! backed by the Event API subscription endpoint. The domain decides which
//! event types are accepted and which criteria block applies.

use crate::artifactory::client::{webhook_path, WEBHOOKS_PATH};
use crate::artifactory::ArtifactoryClient;
use crate::error::{ProviderError, Result};
use crate::resource::{Resource, ResourceRegistry};
use crate::schema::{FieldSchema, Schema, Validation};
use crate::state::{string_set, ResourceData};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookDomain {
    Artifact,
    ArtifactProperty,
    Docker,
    Build,
    ReleaseBundle,
    Distribution,
    ArtifactoryReleaseBundle,
}

/// Which criteria block a domain filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaKind {
    Repository,
    Build,
    ReleaseBundle,
}

impl WebhookDomain {
    pub const ALL: [WebhookDomain; 7] = [
        WebhookDomain::Artifact,
        WebhookDomain::ArtifactProperty,
        WebhookDomain::Docker,
        WebhookDomain::Build,
        WebhookDomain::ReleaseBundle,
        WebhookDomain::Distribution,
        WebhookDomain::ArtifactoryReleaseBundle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookDomain::Artifact => "artifact",
            WebhookDomain::ArtifactProperty => "artifact_property",
            WebhookDomain::Docker => "docker",
            WebhookDomain::Build => "build",
            WebhookDomain::ReleaseBundle => "release_bundle",
            WebhookDomain::Distribution => "distribution",
            WebhookDomain::ArtifactoryReleaseBundle => "artifactory_release_bundle",
        }
    }

    pub fn event_types(&self) -> &'static [&'static str] {
        match self {
            WebhookDomain::Artifact => &["deployed", "deleted", "moved", "copied", "cached"],
            WebhookDomain::ArtifactProperty => &["added", "deleted"],
            WebhookDomain::Docker => &["pushed", "deleted", "promoted"],
            WebhookDomain::Build => &["uploaded", "deleted", "promoted"],
            WebhookDomain::ReleaseBundle => &["created", "signed", "deleted"],
            WebhookDomain::Distribution => &[
                "distribute_started",
                "distribute_completed",
                "distribute_aborted",
                "distribute_failed",
                "delete_started",
                "delete_completed",
                "delete_failed",
            ],
            WebhookDomain::ArtifactoryReleaseBundle => &[
                "received",
                "delete_started",
                "delete_completed",
                "delete_failed",
            ],
        }
    }

    pub fn criteria_kind(&self) -> CriteriaKind {
        match self {
            WebhookDomain::Artifact | WebhookDomain::ArtifactProperty | WebhookDomain::Docker => {
                CriteriaKind::Repository
            }
            WebhookDomain::Build => CriteriaKind::Build,
            WebhookDomain::ReleaseBundle
            | WebhookDomain::Distribution
            | WebhookDomain::ArtifactoryReleaseBundle => CriteriaKind::ReleaseBundle,
        }
    }

    pub fn type_name(&self) -> String {
        format!("artifactory_{}_webhook", self.as_str())
    }
}

impl fmt::Display for WebhookDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// API body
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryCriteria {
    pub any_local: bool,
    pub any_remote: bool,
    pub repo_keys: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildCriteria {
    pub any_build: bool,
    pub selected_builds: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReleaseBundleCriteria {
    pub any_release_bundle: bool,
    #[serde(rename = "registeredReleaseBundlesNames")]
    pub registered_release_bundle_names: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WebhookCriteria {
    Repository(RepositoryCriteria),
    Build(BuildCriteria),
    ReleaseBundle(ReleaseBundleCriteria),
}

impl WebhookCriteria {
    /// The criteria JSON carries no tag; the domain decides its shape
    pub fn from_value(kind: CriteriaKind, value: Value) -> serde_json::Result<Self> {
        let value = if value.is_null() { Value::Object(Default::default()) } else { value };
        Ok(match kind {
            CriteriaKind::Repository => WebhookCriteria::Repository(serde_json::from_value(value)?),
            CriteriaKind::Build => WebhookCriteria::Build(serde_json::from_value(value)?),
            CriteriaKind::ReleaseBundle => {
                WebhookCriteria::ReleaseBundle(serde_json::from_value(value)?)
            }
        })
    }

    fn unpack(kind: CriteriaKind, block: &ResourceData) -> Self {
        let include_patterns = block.get_string_list("include_patterns");
        let exclude_patterns = block.get_string_list("exclude_patterns");
        match kind {
            CriteriaKind::Repository => WebhookCriteria::Repository(RepositoryCriteria {
                any_local: block.get_bool("any_local"),
                any_remote: block.get_bool("any_remote"),
                repo_keys: block.get_string_set("repo_keys"),
                include_patterns,
                exclude_patterns,
            }),
            CriteriaKind::Build => WebhookCriteria::Build(BuildCriteria {
                any_build: block.get_bool("any_build"),
                selected_builds: block.get_string_set("selected_builds"),
                include_patterns,
                exclude_patterns,
            }),
            CriteriaKind::ReleaseBundle => WebhookCriteria::ReleaseBundle(ReleaseBundleCriteria {
                any_release_bundle: block.get_bool("any_release_bundle"),
                registered_release_bundle_names: block
                    .get_string_set("registered_release_bundle_names"),
                include_patterns,
                exclude_patterns,
            }),
        }
    }

    fn pack(&self) -> ResourceData {
        let mut block = ResourceData::default();
        let (include, exclude) = match self {
            WebhookCriteria::Repository(c) => {
                block.set("any_local", c.any_local);
                block.set("any_remote", c.any_remote);
                block.set("repo_keys", string_set(&c.repo_keys));
                (&c.include_patterns, &c.exclude_patterns)
            }
            WebhookCriteria::Build(c) => {
                block.set("any_build", c.any_build);
                block.set("selected_builds", string_set(&c.selected_builds));
                (&c.include_patterns, &c.exclude_patterns)
            }
            WebhookCriteria::ReleaseBundle(c) => {
                block.set("any_release_bundle", c.any_release_bundle);
                block.set(
                    "registered_release_bundle_names",
                    string_set(&c.registered_release_bundle_names),
                );
                (&c.include_patterns, &c.exclude_patterns)
            }
        };
        block.set("include_patterns", include.clone());
        block.set("exclude_patterns", exclude.clone());
        block
    }

    /// Error message when the criteria would match nothing
    pub fn check(&self) -> std::result::Result<(), &'static str> {
        match self {
            WebhookCriteria::Repository(c) if !c.any_local && !c.any_remote && c.repo_keys.is_empty() => {
                Err("repo_keys cannot be empty when both any_local and any_remote are false")
            }
            WebhookCriteria::Build(c) if !c.any_build && c.selected_builds.is_empty() => {
                Err("selected_builds cannot be empty when any_build is false")
            }
            WebhookCriteria::ReleaseBundle(c)
                if !c.any_release_bundle && c.registered_release_bundle_names.is_empty() =>
            {
                Err("registered_release_bundle_names cannot be empty when any_release_bundle is false")
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventFilter {
    pub domain: WebhookDomain,
    pub event_types: Vec<String>,
    pub criteria: WebhookCriteria,
}

impl<'de> Deserialize<'de> for EventFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            domain: WebhookDomain,
            #[serde(default)]
            event_types: Vec<String>,
            #[serde(default)]
            criteria: Value,
        }

        let raw = Raw::deserialize(deserializer)?;
        let criteria = WebhookCriteria::from_value(raw.domain.criteria_kind(), raw.criteria)
            .map_err(serde::de::Error::custom)?;
        Ok(EventFilter {
            domain: raw.domain,
            event_types: raw.event_types,
            criteria,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomHttpHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Handler {
    pub handler_type: String,
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub secret: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub proxy: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_http_headers: Vec<CustomHttpHeader>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookBody {
    pub key: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    pub event_filter: EventFilter,
    #[serde(default)]
    pub handlers: Vec<Handler>,
}

// =============================================================================
// Resource
// =============================================================================

fn criteria_schema(kind: CriteriaKind) -> Schema {
    let patterns = Schema::new()
        .field(
            "include_patterns",
            FieldSchema::string_list().description(
                "Simple comma separated wildcard patterns for repository artifact paths (with no leading slash).",
            ),
        )
        .field("exclude_patterns", FieldSchema::string_list());

    let specific = match kind {
        CriteriaKind::Repository => Schema::new()
            .field("any_local", FieldSchema::bool().required())
            .field("any_remote", FieldSchema::bool().required())
            .field("repo_keys", FieldSchema::string_set()),
        CriteriaKind::Build => Schema::new()
            .field("any_build", FieldSchema::bool().required())
            .field("selected_builds", FieldSchema::string_set()),
        CriteriaKind::ReleaseBundle => Schema::new()
            .field("any_release_bundle", FieldSchema::bool().required())
            .field("registered_release_bundle_names", FieldSchema::string_set()),
    };

    patterns.merge(specific)
}

pub fn webhook_schema(domain: WebhookDomain) -> Schema {
    Schema::new()
        .field(
            "key",
            FieldSchema::string()
                .required()
                .force_new()
                .validate(Validation::NotEmpty),
        )
        .field("description", FieldSchema::string())
        .field("enabled", FieldSchema::bool().default_value(true))
        .field(
            "event_types",
            FieldSchema::string_set()
                .required()
                .description(&format!(
                    "List of events that trigger the webhook. Allowed values: {}",
                    domain.event_types().join(", ")
                )),
        )
        .field(
            "criteria",
            FieldSchema::block(criteria_schema(domain.criteria_kind()), Some(1)).required(),
        )
        .field(
            "url",
            FieldSchema::string()
                .required()
                .validate(Validation::HttpUrl),
        )
        .field("secret", FieldSchema::string().sensitive())
        .field("proxy", FieldSchema::string())
        .field("custom_http_headers", FieldSchema::string_map())
}

pub struct WebhookResource {
    domain: WebhookDomain,
    type_name: String,
    schema: Schema,
}

impl WebhookResource {
    pub fn new(domain: WebhookDomain) -> Self {
        Self {
            domain,
            type_name: domain.type_name(),
            schema: webhook_schema(domain),
        }
    }

    pub fn unpack(&self, data: &ResourceData) -> WebhookBody {
        let kind = self.domain.criteria_kind();
        let criteria = data
            .get_block("criteria")
            .map(|block| WebhookCriteria::unpack(kind, &block))
            .unwrap_or_else(|| WebhookCriteria::unpack(kind, &ResourceData::default()));

        let custom_http_headers = data
            .get_string_map("custom_http_headers")
            .into_iter()
            .map(|(name, value)| CustomHttpHeader { name, value })
            .collect();

        WebhookBody {
            key: data.get_string("key"),
            description: data.get_string("description"),
            enabled: data.get_bool("enabled"),
            event_filter: EventFilter {
                domain: self.domain,
                event_types: data.get_string_set("event_types"),
                criteria,
            },
            handlers: vec![Handler {
                handler_type: "webhook".to_string(),
                url: data.get_string("url"),
                secret: data.get_string("secret"),
                proxy: data.get_string("proxy"),
                custom_http_headers,
            }],
        }
    }

    /// The secret is write-only and stays as configured
    pub fn pack(body: &WebhookBody, data: &mut ResourceData) {
        data.set("key", body.key.as_str());
        data.set("description", body.description.as_str());
        data.set("enabled", body.enabled);
        data.set("event_types", string_set(&body.event_filter.event_types));
        data.set_blocks("criteria", vec![body.event_filter.criteria.pack()]);

        if let Some(handler) = body.handlers.first() {
            data.set("url", handler.url.as_str());
            data.set("proxy", handler.proxy.as_str());
            let headers: serde_json::Map<String, Value> = handler
                .custom_http_headers
                .iter()
                .map(|h| (h.name.clone(), Value::String(h.value.clone())))
                .collect();
            data.set("custom_http_headers", Value::Object(headers));
        }
    }
}

#[async_trait]
impl Resource for WebhookResource {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn existence_path(&self, id: &str) -> Option<String> {
        Some(webhook_path(id))
    }

    fn validate(&self, data: &ResourceData) -> Result<()> {
        let allowed = self.domain.event_types();
        if let Some(unknown) = data
            .get_string_set("event_types")
            .into_iter()
            .find(|t| !allowed.contains(&t.as_str()))
        {
            return Err(ProviderError::validation(format!(
                "event_type {} not supported for domain {}",
                unknown, self.domain
            )));
        }

        self.unpack(data)
            .event_filter
            .criteria
            .check()
            .map_err(ProviderError::validation)
    }

    async fn create(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        let body = self.unpack(data);
        client.post_json(WEBHOOKS_PATH, &body).await?;

        data.set_id(body.key);
        self.read(client, data).await
    }

    async fn read(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        match client.get_json::<WebhookBody>(&webhook_path(data.id())).await {
            Ok(body) => {
                Self::pack(&body, data);
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                tracing::warn!("Webhook {} not found, removing from state", data.id());
                data.clear_id();
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn update(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        let body = self.unpack(data);
        client.put_json(&webhook_path(data.id()), &body).await?;
        self.read(client, data).await
    }

    async fn delete(&self, client: &ArtifactoryClient, data: &ResourceData) -> Result<()> {
        match client.delete(&webhook_path(data.id())).await {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        }
    }
}

pub(crate) fn register(registry: &mut ResourceRegistry) {
    for domain in WebhookDomain::ALL {
        registry.register(WebhookResource::new(domain));
    }
}
