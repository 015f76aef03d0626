//! Repository resources
//!
//! All repository types share one endpoint (`artifactory/api/repositories/{key}`)
//! and one lifecycle: PUT to create, POST to update. Package types differ only
//! in their parameter struct, so each resource is a [`RepositoryResource`]
//! over a type implementing [`RepositoryParams`].

pub mod local;
pub mod remote;
pub mod virtual_repo;

use crate::artifactory::client::repository_path;
use crate::artifactory::ArtifactoryClient;
use crate::error::Result;
use crate::resource::{Resource, ResourceRegistry};
use crate::schema::{FieldSchema, Schema, Validation};
use crate::state::ResourceData;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rclass {
    Local,
    Remote,
    Virtual,
}

impl Rclass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rclass::Local => "local",
            Rclass::Remote => "remote",
            Rclass::Virtual => "virtual",
        }
    }
}

/// Default layout for a package type
pub fn default_repo_layout(package_type: &str) -> &'static str {
    match package_type {
        "maven" | "gradle" | "ivy" | "sbt" => "maven-2-default",
        "npm" => "npm-default",
        "bower" => "bower-default",
        "cargo" => "cargo-default",
        "composer" => "composer-default",
        "conan" => "conan-default",
        "go" => "go-default",
        "nuget" => "nuget-default",
        "puppet" => "puppet-default",
        "swift" => "swift-default",
        "vcs" => "vcs-default",
        _ => "simple-default",
    }
}

/// API body of one repository type, with its unpack/pack converters
pub trait RepositoryParams: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn key(&self) -> &str;

    fn unpack(data: &ResourceData, package_type: &str) -> Self;

    /// Write every echoed field into `data`
    fn pack(&self, data: &mut ResourceData);

    /// Bring configured values into their packed form
    fn normalize(_data: &mut ResourceData) {}
}

/// Arguments every repository class has
pub(crate) fn base_repository_schema(package_type: &str) -> Schema {
    Schema::new()
        .field(
            "key",
            FieldSchema::string()
                .required()
                .force_new()
                .validate(Validation::NotEmpty)
                .description("A mandatory identifier for the repository that must be unique."),
        )
        .field("package_type", FieldSchema::string().computed())
        .field("description", FieldSchema::string())
        .field("notes", FieldSchema::string())
        .field(
            "includes_pattern",
            FieldSchema::string().computed().description(
                "List of comma-separated artifact patterns to include when evaluating artifact requests.",
            ),
        )
        .field(
            "excludes_pattern",
            FieldSchema::string().computed().description(
                "List of comma-separated artifact patterns to exclude when evaluating artifact requests.",
            ),
        )
        .field(
            "repo_layout_ref",
            FieldSchema::string().default_value(default_repo_layout(package_type)),
        )
}

/// Generic lifecycle for any repository parameter type
pub struct RepositoryResource<P> {
    type_name: String,
    package_type: &'static str,
    schema: Schema,
    _params: PhantomData<fn() -> P>,
}

impl<P: RepositoryParams> RepositoryResource<P> {
    /// `name` is the type-name suffix, which can differ from the package type
    /// (`docker_v2` manages `docker` repositories).
    pub fn new(rclass: Rclass, name: &str, package_type: &'static str, schema: Schema) -> Self {
        Self {
            type_name: format!("artifactory_{}_{}_repository", rclass.as_str(), name),
            package_type,
            schema,
            _params: PhantomData,
        }
    }

    pub fn package_type(&self) -> &str {
        self.package_type
    }
}

#[async_trait]
impl<P: RepositoryParams> Resource for RepositoryResource<P> {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn normalize(&self, data: &mut ResourceData) {
        P::normalize(data);
    }

    fn existence_path(&self, id: &str) -> Option<String> {
        Some(repository_path(id))
    }

    async fn create(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        let repo = P::unpack(data, self.package_type);
        client.put_json(&repository_path(repo.key()), &repo).await?;

        data.set_id(repo.key());
        self.read(client, data).await
    }

    async fn read(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        match client.get_json::<P>(&repository_path(data.id())).await {
            Ok(repo) => {
                repo.pack(data);
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                tracing::warn!("Repository {} not found, removing from state", data.id());
                data.clear_id();
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn update(&self, client: &ArtifactoryClient, data: &mut ResourceData) -> Result<()> {
        let repo = P::unpack(data, self.package_type);
        client.post_json(&repository_path(repo.key()), &repo).await?;

        data.set_id(repo.key());
        self.read(client, data).await
    }

    async fn delete(&self, client: &ArtifactoryClient, data: &ResourceData) -> Result<()> {
        match client.delete(&repository_path(data.id())).await {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        }
    }
}

pub(crate) fn register(registry: &mut ResourceRegistry) {
    local::register(registry);
    remote::register(registry);
    virtual_repo::register(registry);
}

pub(crate) fn is_zero(v: &i64) -> bool {
    *v == 0
}
