//! Artifactory Client
//!
//! Main client for the Artifactory REST API, combining the base URL,
//! credentials and HTTP functionality. Paths are relative to the base URL,
//! e.g. `artifactory/api/repositories/libs-local`.

use super::auth::Credentials;
use super::http::{ArtifactoryHttpClient, Payload};
use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const SYSTEM_CONFIGURATION_PATH: &str = "artifactory/api/system/configuration";
pub const PING_PATH: &str = "artifactory/api/system/ping";
pub const WEBHOOKS_PATH: &str = "event/api/v1/subscriptions";

const JSON: &str = "application/json";
const XML: &str = "application/xml";

/// Main Artifactory client
#[derive(Clone)]
pub struct ArtifactoryClient {
    base_url: String,
    credentials: Credentials,
    http: ArtifactoryHttpClient,
}

impl ArtifactoryClient {
    /// Create a client from provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let base_url = config.effective_url()?;
        Self::with_credentials(&base_url, config.credentials(), config.timeout())
    }

    pub fn with_credentials(
        base_url: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self> {
        let http = ArtifactoryHttpClient::new(timeout)?;
        tracing::debug!(
            "Artifactory client for {} using {} credentials",
            base_url,
            credentials.kind()
        );

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        accept: &str,
        payload: Payload<'_>,
    ) -> Result<String> {
        self.http
            .send(method, &self.url(path), &self.credentials, accept, payload)
            .await
    }

    fn encode_json<B: Serialize + ?Sized>(path: &str, body: &B) -> Result<Vec<u8>> {
        serde_json::to_vec(body).map_err(|e| ProviderError::encode(format!("body for {}", path), e))
    }

    /// GET a path and return the raw body
    pub async fn get_text(&self, path: &str) -> Result<String> {
        self.send(Method::GET, path, JSON, Payload::Empty).await
    }

    /// GET a path as XML
    pub async fn get_xml(&self, path: &str) -> Result<String> {
        self.send(Method::GET, path, XML, Payload::Empty).await
    }

    /// GET a path as an untyped JSON value
    pub async fn get_value(&self, path: &str) -> Result<Value> {
        let body = self.get_text(path).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ProviderError::decode(path, e))
    }

    /// GET a path and decode it into `T`
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.get_text(path).await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::decode(path, e))
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let bytes = Self::encode_json(path, body)?;
        self.send(Method::PUT, path, JSON, Payload::Json(bytes))
            .await
            .map(|_| ())
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let bytes = Self::encode_json(path, body)?;
        self.send(Method::POST, path, JSON, Payload::Json(bytes))
            .await
            .map(|_| ())
    }

    /// PATCH a YAML document (used for the system configuration)
    pub async fn patch_yaml(&self, path: &str, yaml: &str) -> Result<()> {
        self.send(Method::PATCH, path, JSON, Payload::Yaml(yaml))
            .await
            .map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, JSON, Payload::Empty)
            .await
            .map(|_| ())
    }

    /// Existence check that never retries.
    ///
    /// 404 and 400 mean "absent"; any other failure is an error, so a transient
    /// problem is never mistaken for a deleted object.
    pub async fn probe(&self, path: &str) -> Result<bool> {
        match self.get_text(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_missing_replication() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Check connectivity and credentials
    pub async fn ping(&self) -> Result<()> {
        let body = self.get_text(PING_PATH).await?;
        tracing::info!("Ping {}: {}", self.base_url, body.trim());
        Ok(())
    }
}

fn encode_key(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

pub fn repository_path(key: &str) -> String {
    format!("artifactory/api/repositories/{}", encode_key(key))
}

pub fn replication_path(repo_key: &str) -> String {
    format!("artifactory/api/replications/{}", encode_key(repo_key))
}

pub fn multi_replication_path(repo_key: &str) -> String {
    format!("artifactory/api/replications/multiple/{}", encode_key(repo_key))
}

pub fn webhook_path(key: &str) -> String {
    format!("{}/{}", WEBHOOKS_PATH, encode_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ArtifactoryClient {
        ArtifactoryClient::with_credentials(base, Credentials::Anonymous, Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_url_joins_without_double_slashes() {
        let c = client("https://example.jfrog.io/");
        assert_eq!(c.base_url(), "https://example.jfrog.io");
        assert_eq!(
            c.url("/artifactory/api/system/ping"),
            "https://example.jfrog.io/artifactory/api/system/ping"
        );
    }

    #[test]
    fn test_paths_encode_keys() {
        assert_eq!(repository_path("libs-local"), "artifactory/api/repositories/libs-local");
        assert_eq!(
            replication_path("a b"),
            "artifactory/api/replications/a%20b"
        );
        assert_eq!(
            multi_replication_path("libs"),
            "artifactory/api/replications/multiple/libs"
        );
        assert_eq!(webhook_path("hook-1"), "event/api/v1/subscriptions/hook-1");
    }

    #[test]
    fn test_new_requires_url() {
        assert!(ArtifactoryClient::new(&ProviderConfig::default()).is_err());
    }
}
