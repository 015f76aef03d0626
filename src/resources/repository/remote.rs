//! Remote repositories
//!
//! Remote repositories proxy an upstream URL. The API never echoes the
//! password back, so it is sent on create/update and left untouched in state
//! on read.

use super::{base_repository_schema, default_repo_layout, Rclass, RepositoryParams, RepositoryResource};
use crate::resource::ResourceRegistry;
use crate::schema::{FieldSchema, Schema, Validation};
use crate::state::{string_set, ResourceData};
use serde::{Deserialize, Serialize};

pub const BASIC_PACKAGE_TYPES: &[&str] =
    &["bower", "composer", "cran", "gems", "generic", "go", "helm", "pypi"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteRepositoryBaseParams {
    pub key: String,
    pub rclass: String,
    pub package_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub includes_pattern: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub excludes_pattern: String,
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub proxy: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub local_address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_tls_certificate: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub repo_layout_ref: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remote_repo_layout_ref: String,
    pub hard_fail: bool,
    pub offline: bool,
    pub blacked_out: bool,
    pub xray_index: bool,
    pub store_artifacts_locally: bool,
    pub socket_timeout_millis: i64,
    pub retrieval_cache_period_secs: i64,
    pub missed_retrieval_cache_period_secs: i64,
    #[serde(skip_serializing_if = "super::is_zero")]
    pub unused_artifacts_cleanup_period_hours: i64,
    pub assumed_offline_period_secs: i64,
    pub share_configuration: bool,
    pub synchronize_properties: bool,
    pub block_mismatching_mime_types: bool,
    pub property_sets: Vec<String>,
    pub allow_any_host_auth: bool,
    pub enable_cookie_management: bool,
    pub bypass_head_requests: bool,
    pub list_remote_folder_items: bool,
}

pub fn base_remote_schema(package_type: &str) -> Schema {
    base_repository_schema(package_type).merge(
        Schema::new()
            .field(
                "url",
                FieldSchema::string()
                    .required()
                    .validate(Validation::HttpUrl)
                    .description("The remote repo URL."),
            )
            .field("username", FieldSchema::string())
            .field(
                "password",
                FieldSchema::string()
                    .sensitive()
                    .description("Never read back; changing it outside of the configuration is not detected."),
            )
            .field("proxy", FieldSchema::string())
            .field("local_address", FieldSchema::string())
            .field("client_tls_certificate", FieldSchema::string().computed())
            .field("remote_repo_layout_ref", FieldSchema::string())
            .field("hard_fail", FieldSchema::bool().default_value(false))
            .field("offline", FieldSchema::bool().default_value(false))
            .field("blacked_out", FieldSchema::bool().default_value(false))
            .field("xray_index", FieldSchema::bool().default_value(false))
            .field("store_artifacts_locally", FieldSchema::bool().default_value(true))
            .field(
                "socket_timeout_millis",
                FieldSchema::int()
                    .default_value(15000)
                    .validate(Validation::IntAtLeast(0)),
            )
            .field(
                "retrieval_cache_period_seconds",
                FieldSchema::int()
                    .default_value(7200)
                    .validate(Validation::IntAtLeast(0)),
            )
            .field(
                "missed_cache_period_seconds",
                FieldSchema::int()
                    .default_value(1800)
                    .validate(Validation::IntAtLeast(0)),
            )
            .field(
                "unused_artifacts_cleanup_period_hours",
                FieldSchema::int()
                    .computed()
                    .validate(Validation::IntAtLeast(0)),
            )
            .field(
                "assumed_offline_period_secs",
                FieldSchema::int()
                    .default_value(300)
                    .validate(Validation::IntAtLeast(0)),
            )
            .field("share_configuration", FieldSchema::bool().default_value(false))
            .field("synchronize_properties", FieldSchema::bool().default_value(false))
            .field(
                "block_mismatching_mime_types",
                FieldSchema::bool().default_value(true),
            )
            .field("property_sets", FieldSchema::string_set())
            .field("allow_any_host_auth", FieldSchema::bool().default_value(false))
            .field("enable_cookie_management", FieldSchema::bool().default_value(false))
            .field("bypass_head_requests", FieldSchema::bool().default_value(false))
            .field("list_remote_folder_items", FieldSchema::bool().default_value(true)),
    )
}

impl RemoteRepositoryBaseParams {
    pub fn unpack_base(data: &ResourceData, package_type: &str) -> Self {
        Self {
            key: data.get_string("key"),
            rclass: Rclass::Remote.as_str().to_string(),
            package_type: package_type.to_string(),
            description: data.get_string("description"),
            notes: data.get_string("notes"),
            includes_pattern: data.get_string("includes_pattern"),
            excludes_pattern: data.get_string("excludes_pattern"),
            url: data.get_string("url"),
            username: data.get_string("username"),
            password: data.get_string("password"),
            proxy: data.get_string("proxy"),
            local_address: data.get_string("local_address"),
            client_tls_certificate: data.get_string("client_tls_certificate"),
            repo_layout_ref: data
                .get_opt_string("repo_layout_ref")
                .unwrap_or_else(|| default_repo_layout(package_type).to_string()),
            remote_repo_layout_ref: data.get_string("remote_repo_layout_ref"),
            hard_fail: data.get_bool("hard_fail"),
            offline: data.get_bool("offline"),
            blacked_out: data.get_bool("blacked_out"),
            xray_index: data.get_bool("xray_index"),
            store_artifacts_locally: data.get_bool("store_artifacts_locally"),
            socket_timeout_millis: data.get_int("socket_timeout_millis"),
            retrieval_cache_period_secs: data.get_int("retrieval_cache_period_seconds"),
            missed_retrieval_cache_period_secs: data.get_int("missed_cache_period_seconds"),
            unused_artifacts_cleanup_period_hours: data
                .get_int("unused_artifacts_cleanup_period_hours"),
            assumed_offline_period_secs: data.get_int("assumed_offline_period_secs"),
            share_configuration: data.get_bool("share_configuration"),
            synchronize_properties: data.get_bool("synchronize_properties"),
            block_mismatching_mime_types: data.get_bool("block_mismatching_mime_types"),
            property_sets: data.get_string_set("property_sets"),
            allow_any_host_auth: data.get_bool("allow_any_host_auth"),
            enable_cookie_management: data.get_bool("enable_cookie_management"),
            bypass_head_requests: data.get_bool("bypass_head_requests"),
            list_remote_folder_items: data.get_bool("list_remote_folder_items"),
        }
    }

    pub fn pack_base(&self, data: &mut ResourceData) {
        data.set("key", self.key.as_str());
        data.set("package_type", self.package_type.as_str());
        data.set("description", self.description.as_str());
        data.set("notes", self.notes.as_str());
        data.set("includes_pattern", self.includes_pattern.as_str());
        data.set("excludes_pattern", self.excludes_pattern.as_str());
        data.set("url", self.url.as_str());
        data.set("username", self.username.as_str());
        data.set("proxy", self.proxy.as_str());
        data.set("local_address", self.local_address.as_str());
        data.set("client_tls_certificate", self.client_tls_certificate.as_str());
        data.set("repo_layout_ref", self.repo_layout_ref.as_str());
        data.set("remote_repo_layout_ref", self.remote_repo_layout_ref.as_str());
        data.set("hard_fail", self.hard_fail);
        data.set("offline", self.offline);
        data.set("blacked_out", self.blacked_out);
        data.set("xray_index", self.xray_index);
        data.set("store_artifacts_locally", self.store_artifacts_locally);
        data.set("socket_timeout_millis", self.socket_timeout_millis);
        data.set("retrieval_cache_period_seconds", self.retrieval_cache_period_secs);
        data.set("missed_cache_period_seconds", self.missed_retrieval_cache_period_secs);
        data.set(
            "unused_artifacts_cleanup_period_hours",
            self.unused_artifacts_cleanup_period_hours,
        );
        data.set("assumed_offline_period_secs", self.assumed_offline_period_secs);
        data.set("share_configuration", self.share_configuration);
        data.set("synchronize_properties", self.synchronize_properties);
        data.set("block_mismatching_mime_types", self.block_mismatching_mime_types);
        data.set("property_sets", string_set(&self.property_sets));
        data.set("allow_any_host_auth", self.allow_any_host_auth);
        data.set("enable_cookie_management", self.enable_cookie_management);
        data.set("bypass_head_requests", self.bypass_head_requests);
        data.set("list_remote_folder_items", self.list_remote_folder_items);
    }
}

impl RepositoryParams for RemoteRepositoryBaseParams {
    fn key(&self) -> &str {
        &self.key
    }

    fn unpack(data: &ResourceData, package_type: &str) -> Self {
        Self::unpack_base(data, package_type)
    }

    fn pack(&self, data: &mut ResourceData) {
        self.pack_base(data);
    }
}

// =============================================================================
// npm
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NpmRemoteRepository {
    #[serde(flatten)]
    pub base: RemoteRepositoryBaseParams,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mismatching_mime_types_override_list: String,
}

/// Canonical form of a MIME type list: split on commas or whitespace, sorted,
/// comma-joined. The server reorders the list, so state keeps this form.
pub fn normalize_mime_types(raw: &str) -> String {
    let mut types: Vec<&str> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();
    types.sort_unstable();
    types.dedup();
    types.join(",")
}

pub fn npm_schema() -> Schema {
    base_remote_schema("npm").merge(Schema::new().field(
        "mismatching_mime_types_override_list",
        FieldSchema::string()
            .validate(Validation::CommaSeparatedList)
            .description("The set of mime types that should override the block_mismatching_mime_types setting."),
    ))
}

impl RepositoryParams for NpmRemoteRepository {
    fn key(&self) -> &str {
        &self.base.key
    }

    fn unpack(data: &ResourceData, package_type: &str) -> Self {
        Self {
            base: RemoteRepositoryBaseParams::unpack_base(data, package_type),
            mismatching_mime_types_override_list: normalize_mime_types(
                &data.get_string("mismatching_mime_types_override_list"),
            ),
        }
    }

    fn pack(&self, data: &mut ResourceData) {
        self.base.pack_base(data);
        data.set(
            "mismatching_mime_types_override_list",
            normalize_mime_types(&self.mismatching_mime_types_override_list),
        );
    }

    fn normalize(data: &mut ResourceData) {
        if let Some(raw) = data.get_opt_string("mismatching_mime_types_override_list") {
            data.set("mismatching_mime_types_override_list", normalize_mime_types(&raw));
        }
    }
}

// =============================================================================
// Docker
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DockerRemoteRepository {
    #[serde(flatten)]
    pub base: RemoteRepositoryBaseParams,
    pub external_dependencies_enabled: bool,
    pub external_dependencies_patterns: Vec<String>,
    pub enable_token_authentication: bool,
    pub block_pushing_schema1: bool,
}

pub fn docker_schema() -> Schema {
    base_remote_schema("docker").merge(
        Schema::new()
            .field(
                "external_dependencies_enabled",
                FieldSchema::bool().default_value(false),
            )
            .field("external_dependencies_patterns", FieldSchema::string_list())
            .field(
                "enable_token_authentication",
                FieldSchema::bool().default_value(true),
            )
            .field("block_pushing_schema1", FieldSchema::bool().default_value(false)),
    )
}

impl RepositoryParams for DockerRemoteRepository {
    fn key(&self) -> &str {
        &self.base.key
    }

    fn unpack(data: &ResourceData, package_type: &str) -> Self {
        Self {
            base: RemoteRepositoryBaseParams::unpack_base(data, package_type),
            external_dependencies_enabled: data.get_bool("external_dependencies_enabled"),
            external_dependencies_patterns: data.get_string_list("external_dependencies_patterns"),
            enable_token_authentication: data.get_bool("enable_token_authentication"),
            block_pushing_schema1: data.get_bool("block_pushing_schema1"),
        }
    }

    fn pack(&self, data: &mut ResourceData) {
        self.base.pack_base(data);
        data.set("external_dependencies_enabled", self.external_dependencies_enabled);
        data.set(
            "external_dependencies_patterns",
            self.external_dependencies_patterns.clone(),
        );
        data.set("enable_token_authentication", self.enable_token_authentication);
        data.set("block_pushing_schema1", self.block_pushing_schema1);
    }
}

pub(crate) fn register(registry: &mut ResourceRegistry) {
    for &package_type in BASIC_PACKAGE_TYPES {
        registry.register(RepositoryResource::<RemoteRepositoryBaseParams>::new(
            Rclass::Remote,
            package_type,
            package_type,
            base_remote_schema(package_type),
        ));
    }

    registry.register(RepositoryResource::<NpmRemoteRepository>::new(
        Rclass::Remote,
        "npm",
        "npm",
        npm_schema(),
    ));
    registry.register(RepositoryResource::<DockerRemoteRepository>::new(
        Rclass::Remote,
        "docker",
        "docker",
        docker_schema(),
    ));
}
