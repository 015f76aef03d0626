//! Virtual repositories

use super::{base_repository_schema, default_repo_layout, Rclass, RepositoryParams, RepositoryResource};
use crate::resource::ResourceRegistry;
use crate::schema::{FieldSchema, Schema, Validation};
use crate::state::ResourceData;
use serde::{Deserialize, Serialize};

pub const BASIC_PACKAGE_TYPES: &[&str] = &["docker", "gems", "generic", "go", "helm", "npm", "pypi"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualRepositoryBaseParams {
    pub key: String,
    pub rclass: String,
    pub package_type: String,
    pub repositories: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub includes_pattern: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub excludes_pattern: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub repo_layout_ref: String,
    pub artifactory_requests_can_retrieve_remote_artifacts: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_deployment_repo: String,
}

pub fn base_virtual_schema(package_type: &str) -> Schema {
    base_repository_schema(package_type).merge(
        Schema::new()
            .field(
                "repositories",
                FieldSchema::string_list()
                    .description("The effective list of actual repositories included in this virtual repository."),
            )
            .field(
                "artifactory_requests_can_retrieve_remote_artifacts",
                FieldSchema::bool().default_value(false),
            )
            .field(
                "default_deployment_repo",
                FieldSchema::string()
                    .description("Default repository to deploy artifacts to. Must be one of the member repositories."),
            ),
    )
}

impl VirtualRepositoryBaseParams {
    pub fn unpack_base(data: &ResourceData, package_type: &str) -> Self {
        Self {
            key: data.get_string("key"),
            rclass: Rclass::Virtual.as_str().to_string(),
            package_type: package_type.to_string(),
            repositories: data.get_string_list("repositories"),
            description: data.get_string("description"),
            notes: data.get_string("notes"),
            includes_pattern: data.get_string("includes_pattern"),
            excludes_pattern: data.get_string("excludes_pattern"),
            repo_layout_ref: data
                .get_opt_string("repo_layout_ref")
                .unwrap_or_else(|| default_repo_layout(package_type).to_string()),
            artifactory_requests_can_retrieve_remote_artifacts: data
                .get_bool("artifactory_requests_can_retrieve_remote_artifacts"),
            default_deployment_repo: data.get_string("default_deployment_repo"),
        }
    }

    pub fn pack_base(&self, data: &mut ResourceData) {
        data.set("key", self.key.as_str());
        data.set("package_type", self.package_type.as_str());
        data.set("repositories", self.repositories.clone());
        data.set("description", self.description.as_str());
        data.set("notes", self.notes.as_str());
        data.set("includes_pattern", self.includes_pattern.as_str());
        data.set("excludes_pattern", self.excludes_pattern.as_str());
        data.set("repo_layout_ref", self.repo_layout_ref.as_str());
        data.set(
            "artifactory_requests_can_retrieve_remote_artifacts",
            self.artifactory_requests_can_retrieve_remote_artifacts,
        );
        data.set("default_deployment_repo", self.default_deployment_repo.as_str());
    }
}

impl RepositoryParams for VirtualRepositoryBaseParams {
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
// Maven
// =============================================================================

pub const POM_CLEANUP_POLICIES: &[&str] =
    &["discard_active_reference", "discard_any_reference", "nothing"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MavenVirtualRepository {
    #[serde(flatten)]
    pub base: VirtualRepositoryBaseParams,
    pub force_maven_authentication: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pom_repository_references_cleanup_policy: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key_pair: String,
}

pub fn maven_schema() -> Schema {
    base_virtual_schema("maven").merge(
        Schema::new()
            .field(
                "force_maven_authentication",
                FieldSchema::bool()
                    .computed()
                    .description("User authentication is required when accessing the repository."),
            )
            .field(
                "pom_repository_references_cleanup_policy",
                FieldSchema::string()
                    .computed()
                    .validate(Validation::OneOf(POM_CLEANUP_POLICIES)),
            )
            .field("key_pair", FieldSchema::string()),
    )
}

impl RepositoryParams for MavenVirtualRepository {
    fn key(&self) -> &str {
        &self.base.key
    }

    fn unpack(data: &ResourceData, package_type: &str) -> Self {
        Self {
            base: VirtualRepositoryBaseParams::unpack_base(data, package_type),
            force_maven_authentication: data.get_bool("force_maven_authentication"),
            pom_repository_references_cleanup_policy: data
                .get_string("pom_repository_references_cleanup_policy"),
            key_pair: data.get_string("key_pair"),
        }
    }

    fn pack(&self, data: &mut ResourceData) {
        self.base.pack_base(data);
        data.set("force_maven_authentication", self.force_maven_authentication);
        data.set(
            "pom_repository_references_cleanup_policy",
            self.pom_repository_references_cleanup_policy.as_str(),
        );
        data.set("key_pair", self.key_pair.as_str());
    }
}

pub(crate) fn register(registry: &mut ResourceRegistry) {
    for &package_type in BASIC_PACKAGE_TYPES {
        registry.register(RepositoryResource::<VirtualRepositoryBaseParams>::new(
            Rclass::Virtual,
            package_type,
            package_type,
            base_virtual_schema(package_type),
        ));
    }

    registry.register(RepositoryResource::<MavenVirtualRepository>::new(
        Rclass::Virtual,
        "maven",
        "maven",
        maven_schema(),
    ));
}
