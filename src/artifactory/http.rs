//! HTTP utilities for Artifactory REST API calls

use super::auth::Credentials;
use crate::error::{ProviderError, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

pub const USER_AGENT: &str = concat!("artifactory-provider/", env!("CARGO_PKG_VERSION"));

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
pub fn sanitize_for_log(body: &str) -> String {
    let char_count = body.chars().count();
    let truncated = if char_count > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Request body, already encoded
pub enum Payload<'a> {
    Empty,
    Json(Vec<u8>),
    Yaml(&'a str),
}

/// HTTP client wrapper for Artifactory API calls
#[derive(Clone)]
pub struct ArtifactoryHttpClient {
    client: Client,
}

impl ArtifactoryHttpClient {
    /// Create a new HTTP client; the timeout applies to every request
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Send one request and return the response body.
    ///
    /// Non-2xx responses become [`ProviderError::Api`]. Nothing is retried.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        credentials: &Credentials,
        accept: &str,
        payload: Payload<'_>,
    ) -> Result<String> {
        tracing::debug!("{} {}", method, url);

        let mut request = credentials
            .apply(self.client.request(method.clone(), url))
            .header(ACCEPT, accept);

        request = match payload {
            Payload::Empty => request,
            Payload::Json(bytes) => request.header(CONTENT_TYPE, "application/json").body(bytes),
            Payload::Yaml(text) => request
                .header(CONTENT_TYPE, "application/yaml")
                .body(text.to_string()),
        };

        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ProviderError::Api {
                method: method.to_string(),
                path: url.to_string(),
                status: status.as_u16(),
                body: sanitize_for_log(&body),
            });
        }

        Ok(body)
    }
}

/// Short advice for common API failures, shown alongside the raw error
pub fn status_hint(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("Invalid request. Check the resource arguments."),
        401 => Some("Authentication failed. Check ARTIFACTORY_ACCESS_TOKEN, ARTIFACTORY_API_KEY or username/password."),
        403 => Some("Permission denied. The configured user needs admin rights for configuration endpoints."),
        404 => Some("Resource not found."),
        409 => Some("Resource conflict. The object may already exist."),
        429 => Some("Rate limit exceeded. Please try again later."),
        500 | 502 | 503 => Some("Artifactory is temporarily unavailable. Please try again."),
        _ => None,
    }
}
