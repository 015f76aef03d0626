//! Artifactory API interaction module
//!
//! # Module Structure
//!
//! - [`auth`] - access token, API key and basic credentials
//! - [`client`] - main client with one method per HTTP verb, plus path helpers
//! - [`http`] - low-level request execution and log sanitizing
//!
//! # Example
//!
//! ```ignore
//! use artifactory_provider::artifactory::client::{repository_path, ArtifactoryClient};
//!
//! async fn example(config: &ProviderConfig) -> artifactory_provider::Result<()> {
//!     let client = ArtifactoryClient::new(config)?;
//!     let repo: serde_json::Value = client.get_json(&repository_path("libs-local")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;

pub use auth::Credentials;
pub use client::ArtifactoryClient;
