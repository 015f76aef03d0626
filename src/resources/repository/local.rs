//! Local repositories

use super::{base_repository_schema, default_repo_layout, Rclass, RepositoryParams, RepositoryResource};
use crate::resource::ResourceRegistry;
use crate::schema::{FieldSchema, Schema, Validation};
use crate::state::{string_set, ResourceData};
use serde::{Deserialize, Serialize};

/// Package types whose local repositories take only the base arguments
pub const BASIC_PACKAGE_TYPES: &[&str] = &[
    "bower", "chef", "cocoapods", "composer", "conan", "cran", "gems", "generic", "gitlfs", "go",
    "helm", "npm", "opkg", "pub", "puppet", "pypi", "swift", "vagrant",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalRepositoryBaseParams {
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
    #[serde(skip_serializing_if = "String::is_empty")]
    pub repo_layout_ref: String,
    pub blacked_out: bool,
    pub xray_index: bool,
    pub property_sets: Vec<String>,
    pub archive_browsing_enabled: bool,
    pub download_redirect: bool,
    pub priority_resolution: bool,
}

pub fn base_local_schema(package_type: &str) -> Schema {
    base_repository_schema(package_type).merge(
        Schema::new()
            .field(
                "blacked_out",
                FieldSchema::bool()
                    .default_value(false)
                    .description("When set, the repository does not participate in artifact resolution and new artifacts cannot be deployed."),
            )
            .field("xray_index", FieldSchema::bool().default_value(false))
            .field("property_sets", FieldSchema::string_set())
            .field(
                "archive_browsing_enabled",
                FieldSchema::bool().default_value(false),
            )
            .field("download_redirect", FieldSchema::bool().default_value(false))
            .field("priority_resolution", FieldSchema::bool().default_value(false)),
    )
}

impl LocalRepositoryBaseParams {
    pub fn unpack_base(data: &ResourceData, package_type: &str) -> Self {
        Self {
            key: data.get_string("key"),
            rclass: Rclass::Local.as_str().to_string(),
            package_type: package_type.to_string(),
            description: data.get_string("description"),
            notes: data.get_string("notes"),
            includes_pattern: data.get_string("includes_pattern"),
            excludes_pattern: data.get_string("excludes_pattern"),
            repo_layout_ref: data
                .get_opt_string("repo_layout_ref")
                .unwrap_or_else(|| default_repo_layout(package_type).to_string()),
            blacked_out: data.get_bool("blacked_out"),
            xray_index: data.get_bool("xray_index"),
            property_sets: data.get_string_set("property_sets"),
            archive_browsing_enabled: data.get_bool("archive_browsing_enabled"),
            download_redirect: data.get_bool("download_redirect"),
            priority_resolution: data.get_bool("priority_resolution"),
        }
    }

    pub fn pack_base(&self, data: &mut ResourceData) {
        data.set("key", self.key.as_str());
        data.set("package_type", self.package_type.as_str());
        data.set("description", self.description.as_str());
        data.set("notes", self.notes.as_str());
        data.set("includes_pattern", self.includes_pattern.as_str());
        data.set("excludes_pattern", self.excludes_pattern.as_str());
        data.set("repo_layout_ref", self.repo_layout_ref.as_str());
        data.set("blacked_out", self.blacked_out);
        data.set("xray_index", self.xray_index);
        data.set("property_sets", string_set(&self.property_sets));
        data.set("archive_browsing_enabled", self.archive_browsing_enabled);
        data.set("download_redirect", self.download_redirect);
        data.set("priority_resolution", self.priority_resolution);
    }
}

impl RepositoryParams for LocalRepositoryBaseParams {
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
// RPM
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RpmLocalRepository {
    #[serde(flatten)]
    pub base: LocalRepositoryBaseParams,
    #[serde(rename = "yumRootDepth")]
    pub root_depth: i64,
    pub calculate_yum_metadata: bool,
    pub enable_file_lists_indexing: bool,
    #[serde(rename = "yumGroupFileNames")]
    pub group_file_names: String,
}

pub fn rpm_schema() -> Schema {
    base_local_schema("rpm").merge(
        Schema::new()
            .field(
                "yum_root_depth",
                FieldSchema::int()
                    .default_value(0)
                    .validate(Validation::IntAtLeast(0))
                    .description("The depth, relative to the repository's root folder, where RPM metadata is created."),
            )
            .field("calculate_yum_metadata", FieldSchema::bool().default_value(false))
            .field("enable_file_lists_indexing", FieldSchema::bool().default_value(false))
            .field(
                "yum_group_file_names",
                FieldSchema::string()
                    .default_value("")
                    .validate(Validation::CommaSeparatedList)
                    .description("A list of XML file names containing RPM group component definitions."),
            ),
    )
}

impl RepositoryParams for RpmLocalRepository {
    fn key(&self) -> &str {
        &self.base.key
    }

    fn unpack(data: &ResourceData, package_type: &str) -> Self {
        Self {
            base: LocalRepositoryBaseParams::unpack_base(data, package_type),
            root_depth: data.get_int("yum_root_depth"),
            calculate_yum_metadata: data.get_bool("calculate_yum_metadata"),
            enable_file_lists_indexing: data.get_bool("enable_file_lists_indexing"),
            group_file_names: data.get_string("yum_group_file_names"),
        }
    }

    fn pack(&self, data: &mut ResourceData) {
        self.base.pack_base(data);
        data.set("yum_root_depth", self.root_depth);
        data.set("calculate_yum_metadata", self.calculate_yum_metadata);
        data.set("enable_file_lists_indexing", self.enable_file_lists_indexing);
        data.set("yum_group_file_names", self.group_file_names.as_str());
    }
}

// =============================================================================
// Docker
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DockerLocalRepository {
    #[serde(flatten)]
    pub base: LocalRepositoryBaseParams,
    pub max_unique_tags: i64,
    #[serde(rename = "dockerApiVersion")]
    pub api_version: String,
    pub block_pushing_schema1: bool,
    #[serde(rename = "dockerTagRetention")]
    pub tag_retention: i64,
}

pub fn docker_v2_schema() -> Schema {
    base_local_schema("docker").merge(
        Schema::new()
            .field(
                "max_unique_tags",
                FieldSchema::int()
                    .default_value(0)
                    .validate(Validation::IntAtLeast(0))
                    .description("The maximum number of unique tags of a single Docker image to store. 0 means no limit."),
            )
            .field("block_pushing_schema1", FieldSchema::bool().computed().default_value(true))
            .field(
                "tag_retention",
                FieldSchema::int()
                    .default_value(1)
                    .validate(Validation::IntAtLeast(1)),
            )
            .field(
                "api_version",
                FieldSchema::string()
                    .computed()
                    .default_value("V2")
                    .validate(Validation::OneOf(&["V1", "V2"])),
            ),
    )
}

impl RepositoryParams for DockerLocalRepository {
    fn key(&self) -> &str {
        &self.base.key
    }

    fn unpack(data: &ResourceData, package_type: &str) -> Self {
        Self {
            base: LocalRepositoryBaseParams::unpack_base(data, package_type),
            max_unique_tags: data.get_int("max_unique_tags"),
            api_version: data
                .get_opt_string("api_version")
                .unwrap_or_else(|| "V2".to_string()),
            block_pushing_schema1: data.get_bool("block_pushing_schema1"),
            tag_retention: data.get_int("tag_retention"),
        }
    }

    fn pack(&self, data: &mut ResourceData) {
        self.base.pack_base(data);
        data.set("max_unique_tags", self.max_unique_tags);
        data.set("api_version", self.api_version.as_str());
        data.set("block_pushing_schema1", self.block_pushing_schema1);
        data.set("tag_retention", self.tag_retention);
    }
}

// =============================================================================
// Maven
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MavenLocalRepository {
    #[serde(flatten)]
    pub base: LocalRepositoryBaseParams,
    pub checksum_policy_type: String,
    pub snapshot_version_behavior: String,
    pub max_unique_snapshots: i64,
    pub handle_releases: bool,
    pub handle_snapshots: bool,
    pub suppress_pom_consistency_checks: bool,
}

pub fn maven_schema() -> Schema {
    base_local_schema("maven").merge(
        Schema::new()
            .field(
                "checksum_policy_type",
                FieldSchema::string()
                    .default_value("client-checksums")
                    .validate(Validation::OneOf(&[
                        "client-checksums",
                        "server-generated-checksums",
                    ])),
            )
            .field(
                "snapshot_version_behavior",
                FieldSchema::string()
                    .default_value("unique")
                    .validate(Validation::OneOf(&["unique", "non-unique", "deployer"])),
            )
            .field(
                "max_unique_snapshots",
                FieldSchema::int()
                    .default_value(0)
                    .validate(Validation::IntAtLeast(0)),
            )
            .field("handle_releases", FieldSchema::bool().default_value(true))
            .field("handle_snapshots", FieldSchema::bool().default_value(true))
            .field(
                "suppress_pom_consistency_checks",
                FieldSchema::bool().default_value(false),
            ),
    )
}

impl RepositoryParams for MavenLocalRepository {
    fn key(&self) -> &str {
        &self.base.key
    }

    fn unpack(data: &ResourceData, package_type: &str) -> Self {
        Self {
            base: LocalRepositoryBaseParams::unpack_base(data, package_type),
            checksum_policy_type: data.get_string("checksum_policy_type"),
            snapshot_version_behavior: data.get_string("snapshot_version_behavior"),
            max_unique_snapshots: data.get_int("max_unique_snapshots"),
            handle_releases: data.get_bool("handle_releases"),
            handle_snapshots: data.get_bool("handle_snapshots"),
            suppress_pom_consistency_checks: data.get_bool("suppress_pom_consistency_checks"),
        }
    }

    fn pack(&self, data: &mut ResourceData) {
        self.base.pack_base(data);
        data.set("checksum_policy_type", self.checksum_policy_type.as_str());
        data.set("snapshot_version_behavior", self.snapshot_version_behavior.as_str());
        data.set("max_unique_snapshots", self.max_unique_snapshots);
        data.set("handle_releases", self.handle_releases);
        data.set("handle_snapshots", self.handle_snapshots);
        data.set(
            "suppress_pom_consistency_checks",
            self.suppress_pom_consistency_checks,
        );
    }
}

pub(crate) fn register(registry: &mut ResourceRegistry) {
    for &package_type in BASIC_PACKAGE_TYPES {
        registry.register(RepositoryResource::<LocalRepositoryBaseParams>::new(
            Rclass::Local,
            package_type,
            package_type,
            base_local_schema(package_type),
        ));
    }

    registry.register(RepositoryResource::<RpmLocalRepository>::new(
        Rclass::Local,
        "rpm",
        "rpm",
        rpm_schema(),
    ));
    registry.register(RepositoryResource::<DockerLocalRepository>::new(
        Rclass::Local,
        "docker_v2",
        "docker",
        docker_v2_schema(),
    ));
    registry.register(RepositoryResource::<MavenLocalRepository>::new(
        Rclass::Local,
        "maven",
        "maven",
        maven_schema(),
    ));
}
